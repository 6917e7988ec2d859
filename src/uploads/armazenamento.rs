// src/uploads/armazenamento.rs

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use actix_web::error::BlockingError;
use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

/// Extensões de imagem aceitas no upload.
pub const EXTENSOES_PERMITIDAS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum ErroArmazenamento {
    #[error("Erro de E/S ao gravar arquivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tarefa de E/S interrompida: {0}")]
    Tarefa(#[from] BlockingError),
}

/// Imagem recebida e já validada, pronta para ser guardada.
#[derive(Debug, Clone)]
pub struct ArquivoRecebido {
    pub extensao: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ArquivoArmazenado {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Onde as imagens enviadas ficam guardadas.
#[async_trait]
pub trait Armazenamento: Send + Sync {
    /// Guarda o arquivo e devolve o nome gerado.
    async fn salvar(&self, arquivo: ArquivoRecebido) -> Result<String, ErroArmazenamento>;
    async fn ler(&self, nome: &str) -> Result<Option<ArquivoArmazenado>, ErroArmazenamento>;
}

/// Valida nome, tipo e tamanho de um arquivo enviado. Devolve a extensão normalizada.
pub fn validar_imagem(
    nome_original: &str,
    content_type: Option<&str>,
    tamanho: usize,
    limite: usize,
) -> Result<String, String> {
    if tamanho == 0 {
        return Err(format!("Arquivo {} está vazio", nome_original));
    }
    if tamanho > limite {
        return Err(format!(
            "Arquivo {} excede o tamanho máximo de {} bytes",
            nome_original, limite
        ));
    }

    let extensao = nome_original
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| EXTENSOES_PERMITIDAS.contains(&ext.as_str()))
        .ok_or_else(|| {
            format!(
                "Tipo de arquivo não permitido: {}. Use {}",
                nome_original,
                EXTENSOES_PERMITIDAS.join(", ")
            )
        })?;

    if let Some(tipo) = content_type {
        if !tipo.starts_with("image/") {
            return Err(format!("Tipo de conteúdo não permitido: {}", tipo));
        }
    }

    Ok(extensao)
}

/// Nome gerado para o arquivo: `<timestamp>-<uuid>.<ext>`.
fn gerar_nome(extensao: &str) -> String {
    format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), extensao)
}

/// Impede que um nome pedido em `/uploads/{nome}` escape do diretório.
pub fn nome_seguro(nome: &str) -> bool {
    !nome.is_empty() && !nome.contains('/') && !nome.contains('\\') && !nome.contains("..")
}

fn content_type_por_extensao(nome: &str) -> &'static str {
    match nome.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Grava as imagens em um diretório local.
pub struct ArmazenamentoDisco {
    diretorio: PathBuf,
}

impl ArmazenamentoDisco {
    pub fn novo(diretorio: impl Into<PathBuf>) -> Result<Self, ErroArmazenamento> {
        let diretorio = diretorio.into();
        fs::create_dir_all(&diretorio)?;
        Ok(ArmazenamentoDisco { diretorio })
    }
}

/// A E/S de arquivo roda no pool de threads bloqueantes do actix.
#[async_trait]
impl Armazenamento for ArmazenamentoDisco {
    async fn salvar(&self, arquivo: ArquivoRecebido) -> Result<String, ErroArmazenamento> {
        let nome = gerar_nome(&arquivo.extensao);
        let destino = self.diretorio.join(&nome);
        let tamanho = arquivo.bytes.len();

        web::block(move || fs::write(destino, arquivo.bytes)).await??;
        tracing::info!(arquivo = %nome, tamanho, "Imagem gravada em disco");
        Ok(nome)
    }

    async fn ler(&self, nome: &str) -> Result<Option<ArquivoArmazenado>, ErroArmazenamento> {
        let origem = self.diretorio.join(nome);
        match web::block(move || fs::read(origem)).await? {
            Ok(bytes) => Ok(Some(ArquivoArmazenado {
                content_type: content_type_por_extensao(nome).to_string(),
                bytes,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Mantém as imagens em memória; somem quando o processo termina.
#[derive(Default)]
pub struct ArmazenamentoMemoria {
    arquivos: RwLock<HashMap<String, ArquivoArmazenado>>,
}

#[async_trait]
impl Armazenamento for ArmazenamentoMemoria {
    async fn salvar(&self, arquivo: ArquivoRecebido) -> Result<String, ErroArmazenamento> {
        let nome = gerar_nome(&arquivo.extensao);
        let mut arquivos = self.arquivos.write().unwrap_or_else(PoisonError::into_inner);
        arquivos.insert(
            nome.clone(),
            ArquivoArmazenado {
                content_type: arquivo.content_type,
                bytes: arquivo.bytes,
            },
        );
        Ok(nome)
    }

    async fn ler(&self, nome: &str) -> Result<Option<ArquivoArmazenado>, ErroArmazenamento> {
        let arquivos = self.arquivos.read().unwrap_or_else(PoisonError::into_inner);
        Ok(arquivos.get(nome).cloned())
    }
}
