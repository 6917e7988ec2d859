// src/usuarios/token.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::usuario_structs::{Claims, Conta};

/// Parâmetros de assinatura dos tokens.
#[derive(Debug, Clone)]
pub struct ConfigToken {
    pub segredo: String,
    pub validade_horas: i64,
}

/// Gera um JWT HS256 para a conta, válido por `validade_horas`.
pub fn gerar_token(conta: &Conta, config: &ConfigToken) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::hours(config.validade_horas)).timestamp();
    let claims = Claims {
        sub: conta.id,
        name: conta.name.clone(),
        email: conta.email.clone(),
        role: conta.role,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.segredo.as_bytes()),
    )
}

/// Decodifica e valida assinatura e expiração.
pub fn validar_token(token: &str, segredo: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(segredo.as_bytes()), &validation)
        .map(|dados| dados.claims)
}
