// src/produtos/produtos_router.rs

use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

use super::produtos_structs::{AtualizacaoProduto, FiltroProdutos, NovoProduto};
use crate::erros::AppError;
use crate::uploads::upload_router::receber_imagens;
use crate::usuarios::auth_middleware::{ContaAdmin, ContaEquipe};
use crate::AppState;

fn produto_nao_encontrado() -> AppError {
    AppError::NaoEncontrado("Produto não encontrado".into())
}

/// Catálogo público: só produtos ativos, com filtros opcionais de busca, categoria e destaque.
#[get("/api/products")]
pub async fn buscar_produtos(
    data: web::Data<AppState>,
    filtro: web::Query<FiltroProdutos>,
) -> Result<HttpResponse, AppError> {
    let produtos = data.repo.listar_produtos().await?;
    Ok(HttpResponse::Ok().json(filtro.aplicar(produtos)))
}

/// Rota para buscar um produto por ID.
#[get("/api/products/{id}")]
pub async fn buscar_produto_por_id(
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let produto = data
        .repo
        .buscar_produto(path.into_inner())
        .await?
        .ok_or_else(produto_nao_encontrado)?;
    Ok(HttpResponse::Ok().json(produto))
}

/// Todos os produtos, inclusive os inativos.
#[get("/api/admin/products")]
pub async fn listar_produtos_admin(
    _equipe: ContaEquipe,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(data.repo.listar_produtos().await?))
}

/// Rota para cadastrar um novo produto.
#[post("/api/admin/products")]
pub async fn cadastrar_produto(
    ContaAdmin(admin): ContaAdmin,
    data: web::Data<AppState>,
    item: web::Json<NovoProduto>,
) -> Result<HttpResponse, AppError> {
    // 1. Valida nome, categoria, preço e estoque
    let novo = item.into_inner();
    novo.validar().map_err(AppError::Validacao)?;

    // 2. Grava e devolve o produto com o ID atribuído
    let produto = data.repo.inserir_produto(novo).await?;
    tracing::info!(produto_id = produto.id, admin = %admin.user_email, "Produto cadastrado");

    Ok(HttpResponse::Created().json(json!({ "success": true, "product": produto })))
}

/// Atualiza só os campos permitidos que vierem no corpo.
#[put("/api/admin/products/{id}")]
pub async fn atualizar_produto(
    ContaAdmin(admin): ContaAdmin,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    item: web::Json<AtualizacaoProduto>,
) -> Result<HttpResponse, AppError> {
    let alteracoes = item.into_inner();
    alteracoes.validar().map_err(AppError::Validacao)?;

    let produto = data
        .repo
        .atualizar_produto(path.into_inner(), alteracoes)
        .await?
        .ok_or_else(produto_nao_encontrado)?;
    tracing::info!(produto_id = produto.id, admin = %admin.user_email, "Produto atualizado");

    Ok(HttpResponse::Ok().json(json!({ "success": true, "product": produto })))
}

/// Exclusão lógica: o produto vira `inativo` e sai do catálogo público.
#[delete("/api/admin/products/{id}")]
pub async fn deletar_produto(
    ContaAdmin(admin): ContaAdmin,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let produto = data
        .repo
        .desativar_produto(path.into_inner())
        .await?
        .ok_or_else(produto_nao_encontrado)?;
    tracing::info!(produto_id = produto.id, admin = %admin.user_email, "Produto desativado");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Produto desativado com sucesso",
        "product": produto
    })))
}

/// Envia imagens e já as anexa ao produto.
#[post("/api/admin/products/{id}/images")]
pub async fn enviar_imagens_produto(
    _admin: ContaAdmin,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if data.repo.buscar_produto(id).await?.is_none() {
        return Err(produto_nao_encontrado());
    }

    let files = receber_imagens(&data, payload).await?;
    let caminhos = files.iter().map(|f| f.path.clone()).collect();
    let produto = data
        .repo
        .anexar_imagens(id, caminhos)
        .await?
        .ok_or_else(produto_nao_encontrado)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "product": produto, "files": files })))
}
