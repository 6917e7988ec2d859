// src/saude.rs

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::erros::AppError;
use crate::AppState;

fn status_ok() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "service": "EletroMáquinas",
        "timestamp": Utc::now(),
    }))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    status_ok()
}

#[get("/api/health")]
pub async fn api_health() -> HttpResponse {
    status_ok()
}

/// Rota de diagnóstico.
#[get("/api/test")]
pub async fn api_test(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "API funcionando!",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": data.ambiente,
    }))
}

/// Resposta para qualquer rota não registrada.
pub async fn rota_nao_encontrada() -> Result<HttpResponse, AppError> {
    Err(AppError::NaoEncontrado("Endpoint não encontrado".into()))
}
