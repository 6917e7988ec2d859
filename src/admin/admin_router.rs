// src/admin/admin_router.rs

use actix_web::{get, http::header, post, put, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use super::admin_structs::{AtualizacaoConfiguracoes, Backup, Estatisticas};
use crate::erros::AppError;
use crate::usuarios::auth_middleware::{ContaAdmin, ContaEquipe};
use crate::usuarios::usuario_router::criar_conta;
use crate::usuarios::usuario_structs::{CadastroRequest, ContaPublica, Papel};
use crate::AppState;

async fn contas_publicas(data: &AppState, papel: Papel) -> Result<Vec<ContaPublica>, AppError> {
    Ok(data
        .repo
        .listar_contas(Some(papel))
        .await?
        .into_iter()
        .map(ContaPublica::from)
        .collect())
}

/// Rota para listar os clientes, sem hash de senha.
#[get("/api/admin/clients")]
pub async fn listar_clientes(
    _equipe: ContaEquipe,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(contas_publicas(&data, Papel::Cliente).await?))
}

/// Rota para listar os vendedores. Só o admin vê.
#[get("/api/admin/vendors")]
pub async fn listar_vendedores(
    _admin: ContaAdmin,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(contas_publicas(&data, Papel::Vendedor).await?))
}

/// Rota para cadastrar um vendedor.
#[post("/api/admin/vendors")]
pub async fn cadastrar_vendedor(
    _admin: ContaAdmin,
    data: web::Data<AppState>,
    cadastro: web::Json<CadastroRequest>,
) -> Result<HttpResponse, AppError> {
    // 1. Valida o corpo
    let cadastro = cadastro.into_inner().validar().map_err(AppError::Validacao)?;

    // 2. Cria a conta com papel de vendedor
    let vendedor = ContaPublica::from(criar_conta(&data, cadastro, Papel::Vendedor).await?);
    Ok(HttpResponse::Created().json(json!({ "success": true, "vendor": vendedor })))
}

/// Números do painel. Varre as coleções a cada chamada.
#[get("/api/admin/stats")]
pub async fn estatisticas(
    _equipe: ContaEquipe,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let produtos = data.repo.listar_produtos().await?;
    let clientes = data.repo.listar_contas(Some(Papel::Cliente)).await?;
    let pedidos = data.repo.listar_pedidos().await?;

    Ok(HttpResponse::Ok().json(Estatisticas::calcular(&produtos, clientes.len(), &pedidos)))
}

/// Rota para buscar as configurações da loja.
#[get("/api/admin/settings")]
pub async fn buscar_configuracoes(
    _equipe: ContaEquipe,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(data.repo.configuracoes().await?))
}

/// Atualiza apenas as chaves conhecidas das configurações.
#[put("/api/admin/settings")]
pub async fn atualizar_configuracoes(
    ContaAdmin(admin): ContaAdmin,
    data: web::Data<AppState>,
    alteracoes: web::Json<AtualizacaoConfiguracoes>,
) -> Result<HttpResponse, AppError> {
    let alteracoes = alteracoes.into_inner();
    alteracoes.validar().map_err(AppError::Validacao)?;

    let settings = data.repo.atualizar_configuracoes(alteracoes).await?;
    tracing::info!(admin = %admin.user_email, "Configurações atualizadas");

    Ok(HttpResponse::Ok().json(json!({ "success": true, "settings": settings })))
}

/// Exporta todas as coleções em um único JSON, sem hashes de senha.
#[get("/api/admin/backup")]
pub async fn exportar_backup(
    ContaAdmin(admin): ContaAdmin,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let agora = Utc::now();
    let backup = Backup {
        exported_at: agora,
        users: data
            .repo
            .listar_contas(None)
            .await?
            .into_iter()
            .map(ContaPublica::from)
            .collect(),
        products: data.repo.listar_produtos().await?,
        categories: data.repo.listar_categorias().await?,
        orders: data.repo.listar_pedidos().await?,
        settings: data.repo.configuracoes().await?,
    };
    tracing::info!(admin = %admin.user_email, "Backup exportado");

    let arquivo = format!("backup-{}.json", agora.format("%Y%m%d-%H%M%S"));
    Ok(HttpResponse::Ok()
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", arquivo),
        ))
        .json(backup))
}
