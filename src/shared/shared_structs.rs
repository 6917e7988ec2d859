// src/shared/shared_structs.rs

use serde::{Deserialize, Serialize};

/// Corpo padrão de erro da API: `{ "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct RespostaErro {
    pub error: String,
}

/// Situação de um registro. Nada é apagado de verdade: desativar é trocar para `Inativo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Situacao {
    #[default]
    Ativo,
    Inativo,
}

impl Situacao {
    pub fn as_str(&self) -> &'static str {
        match self {
            Situacao::Ativo => "ativo",
            Situacao::Inativo => "inativo",
        }
    }
}

impl std::str::FromStr for Situacao {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ativo" => Ok(Situacao::Ativo),
            "inativo" => Ok(Situacao::Inativo),
            _ => Err(format!("Situação desconhecida: {}", s)),
        }
    }
}
