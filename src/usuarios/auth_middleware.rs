// src/usuarios/auth_middleware.rs

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::errors::ErrorKind;

use super::token::validar_token;
use super::usuario_structs::{Claims, Papel};
use crate::erros::AppError;
use crate::AppState;

/// Usuário autenticado, extraído das claims do JWT.
#[derive(Debug, Clone)]
pub struct UsuarioAutenticado {
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub role: Papel,
}

impl From<Claims> for UsuarioAutenticado {
    fn from(claims: Claims) -> Self {
        UsuarioAutenticado {
            user_id: claims.sub,
            user_name: claims.name,
            user_email: claims.email,
            role: claims.role,
        }
    }
}

/// Admin ou vendedor: leitura do painel e atualização de pedidos.
#[derive(Debug, Clone)]
pub struct ContaEquipe(pub UsuarioAutenticado);

/// Somente administradores: escrita em produtos, configurações, vendedores e backup.
#[derive(Debug, Clone)]
pub struct ContaAdmin(pub UsuarioAutenticado);

/// Lê `Authorization: Bearer <token>` e valida o JWT.
fn autenticar(req: &HttpRequest) -> Result<UsuarioAutenticado, AppError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState não registrado na aplicação");
        AppError::NaoAutorizado("Erro de configuração do servidor".into())
    })?;

    let header_str = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::NaoAutorizado("Não autorizado".into()))?
        .to_str()
        .map_err(|_| AppError::NaoAutorizado("Token de autenticação inválido".into()))?;

    let token = header_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::NaoAutorizado("Formato de token inválido. Esperado 'Bearer <token>'".into())
        })?;

    let claims = validar_token(token, &state.token.segredo).map_err(|e| {
        tracing::debug!(error = ?e, "JWT rejeitado");
        let mensagem = match e.kind() {
            ErrorKind::ExpiredSignature => "Token expirado",
            ErrorKind::InvalidSignature => "Assinatura do token inválida",
            ErrorKind::InvalidToken => "Token malformado",
            _ => "Token inválido",
        };
        AppError::NaoAutorizado(mensagem.into())
    })?;

    Ok(claims.into())
}

impl FromRequest for UsuarioAutenticado {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(autenticar(req))
    }
}

impl FromRequest for ContaEquipe {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(autenticar(req).and_then(|usuario| {
            if usuario.role.eh_equipe() {
                Ok(ContaEquipe(usuario))
            } else {
                Err(AppError::NaoAutorizado("Acesso restrito à equipe".into()))
            }
        }))
    }
}

impl FromRequest for ContaAdmin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(autenticar(req).and_then(|usuario| {
            if usuario.role == Papel::Admin {
                Ok(ContaAdmin(usuario))
            } else {
                Err(AppError::NaoAutorizado("Acesso restrito a administradores".into()))
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::test::TestRequest;
    use chrono::Utc;

    use super::*;
    use crate::repositorio::banco::Banco;
    use crate::repositorio::memoria::RepositorioMemoria;
    use crate::shared::shared_structs::Situacao;
    use crate::uploads::armazenamento::ArmazenamentoMemoria;
    use crate::usuarios::token::{gerar_token, ConfigToken};
    use crate::usuarios::usuario_structs::Conta;

    fn estado() -> web::Data<AppState> {
        web::Data::new(AppState {
            repo: Arc::new(RepositorioMemoria::novo(Banco::default())),
            armazenamento: Arc::new(ArmazenamentoMemoria::default()),
            token: ConfigToken {
                segredo: "segredo".into(),
                validade_horas: 1,
            },
            bcrypt_custo: 4,
            limite_upload: 1024,
            ambiente: "test".into(),
        })
    }

    fn token(estado: &AppState, role: Papel) -> String {
        let conta = Conta {
            id: 7,
            name: "Teste".into(),
            email: "teste@eletromaquinas.com".into(),
            password_hash: String::new(),
            role,
            phone: None,
            company: None,
            address: None,
            status: Situacao::Ativo,
            created_at: Utc::now(),
        };
        gerar_token(&conta, &estado.token).unwrap()
    }

    fn requisicao(estado: &web::Data<AppState>, autorizacao: Option<String>) -> HttpRequest {
        let mut req = TestRequest::default().app_data(estado.clone());
        if let Some(valor) = autorizacao {
            req = req.insert_header(("Authorization", valor));
        }
        req.to_http_request()
    }

    #[actix_web::test]
    async fn token_valido_vira_usuario_autenticado() {
        let estado = estado();
        let req = requisicao(&estado, Some(format!("Bearer {}", token(&estado, Papel::Cliente))));

        let usuario = UsuarioAutenticado::extract(&req).await.unwrap();
        assert_eq!(usuario.user_id, 7);
        assert_eq!(usuario.role, Papel::Cliente);
    }

    #[actix_web::test]
    async fn cabecalho_ausente_ou_sem_bearer_e_rejeitado() {
        let estado = estado();
        let token = token(&estado, Papel::Admin);

        assert!(UsuarioAutenticado::extract(&requisicao(&estado, None)).await.is_err());
        assert!(UsuarioAutenticado::extract(&requisicao(&estado, Some(token)))
            .await
            .is_err());
    }

    #[actix_web::test]
    async fn papeis_sao_conferidos_por_extrator() {
        let estado = estado();
        let vendedor = requisicao(&estado, Some(format!("Bearer {}", token(&estado, Papel::Vendedor))));
        let cliente = requisicao(&estado, Some(format!("Bearer {}", token(&estado, Papel::Cliente))));

        assert!(ContaEquipe::extract(&vendedor).await.is_ok());
        assert!(ContaAdmin::extract(&vendedor).await.is_err());
        assert!(ContaEquipe::extract(&cliente).await.is_err());
    }
}
