// src/categorias/categoria_router.rs

use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use super::categoria_structs::NovaCategoria;
use crate::erros::AppError;
use crate::usuarios::auth_middleware::ContaAdmin;
use crate::AppState;

/// Rota para buscar todas as categorias, na ordem de cadastro.
#[get("/api/categories")]
pub async fn buscar_categorias(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(data.repo.listar_categorias().await?))
}

/// Rota para cadastrar uma nova categoria.
#[post("/api/admin/categories")]
pub async fn cadastrar_categoria(
    _admin: ContaAdmin,
    data: web::Data<AppState>,
    item: web::Json<NovaCategoria>,
) -> Result<HttpResponse, AppError> {
    let nome = item.into_inner().validar().map_err(AppError::Validacao)?;
    let categorias = data.repo.inserir_categoria(nome).await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "categories": categorias })))
}
