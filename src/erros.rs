// src/erros.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::repositorio::RepoError;
use crate::shared::shared_structs::RespostaErro;
use crate::uploads::armazenamento::ErroArmazenamento;

/// Erro único devolvido pelos handlers.
/// Cada variante sabe o status HTTP que produz; o corpo é sempre `{ "error": "..." }`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Campos ausentes ou malformados (400).
    #[error("{0}")]
    Validacao(String),

    /// Token ausente, inválido ou sem permissão (401).
    #[error("{0}")]
    NaoAutorizado(String),

    /// Recurso ou rota inexistente (404).
    #[error("{0}")]
    NaoEncontrado(String),

    #[error(transparent)]
    Repositorio(#[from] RepoError),

    #[error(transparent)]
    Armazenamento(#[from] ErroArmazenamento),

    /// Falha inesperada (500); a mensagem fica só no log.
    #[error("{0}")]
    Interno(String),
}

impl AppError {
    /// Mensagem exposta ao cliente. Erros internos nunca vazam detalhes.
    fn mensagem_publica(&self) -> String {
        match self {
            AppError::Repositorio(e) if e.eh_erro_de_cliente() => e.to_string(),
            AppError::Repositorio(_) | AppError::Armazenamento(_) | AppError::Interno(_) => {
                "Erro interno do servidor".to_string()
            }
            outro => outro.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validacao(_) => StatusCode::BAD_REQUEST,
            AppError::NaoAutorizado(_) => StatusCode::UNAUTHORIZED,
            AppError::NaoEncontrado(_) => StatusCode::NOT_FOUND,
            AppError::Repositorio(e) if e.eh_erro_de_cliente() => StatusCode::BAD_REQUEST,
            AppError::Repositorio(_) | AppError::Armazenamento(_) | AppError::Interno(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Erro ao processar requisição");
        }
        HttpResponse::build(status).json(RespostaErro {
            error: self.mensagem_publica(),
        })
    }
}
