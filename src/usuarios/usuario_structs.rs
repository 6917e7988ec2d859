// src/usuarios/usuario_structs.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::shared_structs::Situacao;

/// Papel de uma conta. Clientes, vendedores e administradores vivem na mesma coleção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Papel {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "vendedor")]
    Vendedor,
    #[serde(rename = "client")]
    Cliente,
}

impl Papel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Papel::Admin => "admin",
            Papel::Vendedor => "vendedor",
            Papel::Cliente => "client",
        }
    }

    /// Admin e vendedor acessam o painel.
    pub fn eh_equipe(&self) -> bool {
        matches!(self, Papel::Admin | Papel::Vendedor)
    }
}

impl std::str::FromStr for Papel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Papel::Admin),
            "vendedor" => Ok(Papel::Vendedor),
            "client" => Ok(Papel::Cliente),
            _ => Err(format!("Papel desconhecido: {}", s)),
        }
    }
}

/// Conta armazenada. O hash da senha nunca sai pela API, só por `ContaPublica`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conta {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Papel,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Situacao,
    pub created_at: DateTime<Utc>,
}

/// Conta sem o campo de senha, para respostas e backup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContaPublica {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Papel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: Situacao,
    pub created_at: DateTime<Utc>,
}

impl From<Conta> for ContaPublica {
    fn from(c: Conta) -> Self {
        ContaPublica {
            id: c.id,
            name: c.name,
            email: c.email,
            role: c.role,
            phone: c.phone,
            company: c.company,
            address: c.address,
            status: c.status,
            created_at: c.created_at,
        }
    }
}

/// Dados já validados para inserir uma conta.
#[derive(Debug, Clone)]
pub struct NovaConta {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Papel,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

/// Corpo de `POST /api/clients/register` e `POST /api/admin/vendors`.
/// Os campos são opcionais aqui para que a ausência vire 400 com mensagem própria.
#[derive(Debug, Deserialize)]
pub struct CadastroRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

/// Cadastro validado: nome, email normalizado e senha em texto claro (ainda sem hash).
#[derive(Debug)]
pub struct CadastroValido {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

impl CadastroRequest {
    pub fn validar(self) -> Result<CadastroValido, String> {
        let name = texto_preenchido(self.name);
        let email = texto_preenchido(self.email);
        let password = self.password.filter(|s| !s.is_empty());

        let (name, email, password) = match (name, email, password) {
            (Some(n), Some(e), Some(p)) => (n, e, p),
            _ => return Err("Dados incompletos".to_string()),
        };

        let email = normalizar_email(&email);
        if !email_valido(&email) {
            return Err("Email inválido".to_string());
        }

        Ok(CadastroValido {
            name,
            email,
            password,
            phone: texto_preenchido(self.phone),
            company: texto_preenchido(self.company),
            address: texto_preenchido(self.address),
        })
    }
}

/// Estrutura para receber dados de login do usuário.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>, // Senha em texto claro
}

/// Payload do JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,      // ID da conta
    pub name: String,
    pub email: String,
    pub role: Papel,
    pub exp: i64,      // Expiração (timestamp Unix)
}

/// Resposta de login: `{ success, token, user }`.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: ContaPublica,
}

/// Resposta do cadastro de cliente: `{ success, client, token }`.
#[derive(Debug, Serialize)]
pub struct CadastroResponse {
    pub success: bool,
    pub client: ContaPublica,
    pub token: String,
}

/// Emails são comparados e armazenados sem espaços e em minúsculas.
pub fn normalizar_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_valido(email: &str) -> bool {
    match email.split_once('@') {
        Some((usuario, dominio)) => !usuario.is_empty() && !dominio.is_empty() && !email.contains(' '),
        None => false,
    }
}

fn texto_preenchido(valor: Option<String>) -> Option<String> {
    valor
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
