// src/config.rs

//! Configuração lida de variáveis de ambiente (um `.env` é carregado antes, se existir).
//!
//! | Variável | Padrão |
//! |---|---|
//! | `HOST` / `PORT` | `0.0.0.0` / `3000` |
//! | `DATABASE_URL` | ausente: repositório em memória |
//! | `DATA_FILE` | ausente: sem espelho em arquivo |
//! | `JWT_SECRET` | obrigatório fora de `development` |
//! | `JWT_EXPIRATION_HOURS` | `24` |
//! | `BCRYPT_COST` | `12` |
//! | `UPLOAD_DIR` | ausente: imagens em memória |
//! | `UPLOAD_MAX_BYTES` | `5242880` |
//! | `ADMIN_EMAIL` / `ADMIN_PASSWORD` | `admin@eletromaquinas.com` / `admin123` |
//! | `APP_ENV` | `development` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const SEGREDO_DESENVOLVIMENTO: &str = "segredo-local-apenas-para-desenvolvimento";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Variável de ambiente obrigatória ausente: {0}")]
    Ausente(String),
    #[error("Valor inválido para {0}: {1}")]
    Invalida(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub data_file: Option<PathBuf>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: Option<PathBuf>,
    pub upload_max_bytes: usize,
    pub admin_email: String,
    pub admin_password: String,
    pub app_env: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|chave| env::var(chave).ok())
    }

    /// Monta a configuração a partir de uma função de consulta; facilita testar sem mexer no ambiente.
    pub fn from_lookup(buscar: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let texto = |chave: &str| buscar(chave).filter(|v| !v.trim().is_empty());

        let app_env = texto("APP_ENV").unwrap_or_else(|| "development".to_string());

        let jwt_secret = match texto("JWT_SECRET") {
            Some(segredo) => segredo,
            None if app_env == "development" || app_env == "test" => {
                tracing::warn!("JWT_SECRET não definido; usando segredo de desenvolvimento");
                SEGREDO_DESENVOLVIMENTO.to_string()
            }
            None => return Err(ConfigError::Ausente("JWT_SECRET".into())),
        };

        let bcrypt_cost: u32 = numero(&texto, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalida(
                "BCRYPT_COST".into(),
                format!("{} (esperado entre 4 e 31)", bcrypt_cost),
            ));
        }

        Ok(Config {
            host: texto("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: numero(&texto, "PORT", 3000)?,
            database_url: texto("DATABASE_URL"),
            data_file: texto("DATA_FILE").map(PathBuf::from),
            jwt_secret,
            jwt_expiration_hours: numero(&texto, "JWT_EXPIRATION_HOURS", 24)?,
            bcrypt_cost,
            upload_dir: texto("UPLOAD_DIR").map(PathBuf::from),
            upload_max_bytes: numero(&texto, "UPLOAD_MAX_BYTES", 5 * 1024 * 1024)?,
            admin_email: texto("ADMIN_EMAIL")
                .unwrap_or_else(|| "admin@eletromaquinas.com".to_string()),
            admin_password: texto("ADMIN_PASSWORD").unwrap_or_else(|| "admin123".to_string()),
            app_env,
        })
    }
}

fn numero<T: FromStr>(
    texto: &impl Fn(&str) -> Option<String>,
    chave: &str,
    padrao: T,
) -> Result<T, ConfigError> {
    match texto(chave) {
        Some(valor) => valor
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalida(chave.to_string(), valor)),
        None => Ok(padrao),
    }
}
