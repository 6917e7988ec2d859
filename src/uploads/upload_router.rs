// src/uploads/upload_router.rs

use actix_multipart::Multipart;
use actix_web::{get, http::header, post, web, HttpResponse};
use futures::TryStreamExt;
use serde::Serialize;

use super::armazenamento::{nome_seguro, validar_imagem, ArquivoRecebido};
use crate::erros::AppError;
use crate::usuarios::auth_middleware::ContaAdmin;
use crate::AppState;

/// Metadados devolvidos para cada imagem gravada.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArquivoEnviado {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub size: usize,
    pub mimetype: String,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    files: Vec<ArquivoEnviado>,
}

/// Imagem lida do multipart e já validada, ainda não gravada.
struct ImagemLida {
    nome_original: String,
    mimetype: String,
    arquivo: ArquivoRecebido,
}

/// Lê todos os campos de arquivo do multipart, valida cada um e só então grava no armazenamento.
/// Campos sem nome de arquivo (texto comum) são ignorados.
pub async fn receber_imagens(
    state: &AppState,
    mut payload: Multipart,
) -> Result<Vec<ArquivoEnviado>, AppError> {
    // 1. Lê e valida o lote inteiro; um arquivo ruim recusa todos
    let mut lidas = Vec::new();
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::Validacao(format!("Upload inválido: {}", e)))?
    {
        let Some(nome_original) = field.content_disposition().get_filename().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(|m| m.essence_str().to_owned());

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Validacao(format!("Upload inválido: {}", e)))?
        {
            // Para de ler assim que passar do limite, sem acumular o resto.
            if bytes.len() + chunk.len() > state.limite_upload {
                return Err(AppError::Validacao(format!(
                    "Arquivo {} excede o tamanho máximo de {} bytes",
                    nome_original, state.limite_upload
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let extensao = validar_imagem(
            &nome_original,
            content_type.as_deref(),
            bytes.len(),
            state.limite_upload,
        )
        .map_err(AppError::Validacao)?;

        let mimetype = content_type.unwrap_or_else(|| format!("image/{}", extensao));
        lidas.push(ImagemLida {
            nome_original,
            arquivo: ArquivoRecebido {
                extensao,
                content_type: mimetype.clone(),
                bytes,
            },
            mimetype,
        });
    }

    if lidas.is_empty() {
        return Err(AppError::Validacao("Nenhum arquivo enviado".into()));
    }

    // 2. Grava tudo
    let mut enviados = Vec::with_capacity(lidas.len());
    for lida in lidas {
        let size = lida.arquivo.bytes.len();
        let filename = state.armazenamento.salvar(lida.arquivo).await?;
        enviados.push(ArquivoEnviado {
            path: format!("/uploads/{}", filename),
            filename,
            original_name: lida.nome_original,
            size,
            mimetype: lida.mimetype,
        });
    }
    Ok(enviados)
}

/// Rota para enviar imagens avulsas. Não associa a nenhum produto.
#[post("/api/upload")]
pub async fn enviar_imagens(
    _admin: ContaAdmin,
    data: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let files = receber_imagens(&data, payload).await?;
    Ok(HttpResponse::Ok().json(UploadResponse {
        success: true,
        files,
    }))
}

/// Serve uma imagem enviada.
#[get("/uploads/{nome}")]
pub async fn servir_imagem(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let nome = path.into_inner();
    if !nome_seguro(&nome) {
        return Err(AppError::NaoEncontrado("Arquivo não encontrado".into()));
    }

    let arquivo = data
        .armazenamento
        .ler(&nome)
        .await?
        .ok_or_else(|| AppError::NaoEncontrado("Arquivo não encontrado".into()))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, arquivo.content_type))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(arquivo.bytes))
}
