// src/usuarios/usuario_router.rs

use actix_web::{post, web, HttpResponse};
use bcrypt::{hash, verify};

use super::token::gerar_token;
use super::usuario_structs::{
    normalizar_email, AuthResponse, CadastroRequest, CadastroResponse, CadastroValido, Conta,
    LoginRequest, NovaConta, Papel,
};
use crate::erros::AppError;
use crate::shared::shared_structs::Situacao;
use crate::AppState;

fn credenciais_invalidas() -> AppError {
    AppError::NaoAutorizado("Credenciais inválidas".into())
}

/// Cria uma conta com a senha já transformada em hash bcrypt.
pub async fn criar_conta(
    data: &AppState,
    cadastro: CadastroValido,
    role: Papel,
) -> Result<Conta, AppError> {
    let password_hash = hash(&cadastro.password, data.bcrypt_custo).map_err(|e| {
        AppError::Interno(format!("Erro ao fazer hash da senha: {}", e))
    })?;

    let conta = data
        .repo
        .inserir_conta(NovaConta {
            name: cadastro.name,
            email: cadastro.email,
            password_hash,
            role,
            phone: cadastro.phone,
            company: cadastro.company,
            address: cadastro.address,
        })
        .await?;

    tracing::info!(conta_id = conta.id, role = conta.role.as_str(), "Conta criada");
    Ok(conta)
}

/// Confere email (sem diferenciar maiúsculas) e senha. Qualquer falha vira 401 genérico.
async fn conferir_credenciais(data: &AppState, login: LoginRequest) -> Result<Conta, AppError> {
    let (email, password) = match (login.email, login.password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
        _ => return Err(AppError::Validacao("Email e senha são obrigatórios".into())),
    };

    let conta = data
        .repo
        .buscar_conta_por_email(&normalizar_email(&email))
        .await?
        .filter(|c| c.status == Situacao::Ativo)
        .ok_or_else(credenciais_invalidas)?;

    let password_matches = verify(&password, &conta.password_hash)
        .map_err(|e| AppError::Interno(format!("Erro ao verificar senha: {}", e)))?;
    if !password_matches {
        tracing::warn!(conta_id = conta.id, "Tentativa de login com senha incorreta");
        return Err(credenciais_invalidas());
    }

    Ok(conta)
}

fn responder_login(data: &AppState, conta: Conta) -> Result<HttpResponse, AppError> {
    let token = gerar_token(&conta, &data.token)
        .map_err(|e| AppError::Interno(format!("Erro ao gerar token: {}", e)))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        token,
        user: conta.into(),
    }))
}

/// Rota para login de qualquer conta.
#[post("/api/login")]
pub async fn login_usuario(
    data: web::Data<AppState>,
    login_request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let conta = conferir_credenciais(&data, login_request.into_inner()).await?;
    responder_login(&data, conta)
}

/// Login do painel: só admin e vendedor entram.
#[post("/api/admin/login")]
pub async fn login_admin(
    data: web::Data<AppState>,
    login_request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let conta = conferir_credenciais(&data, login_request.into_inner()).await?;
    if !conta.role.eh_equipe() {
        tracing::warn!(conta_id = conta.id, "Cliente tentou entrar no painel");
        return Err(credenciais_invalidas());
    }
    responder_login(&data, conta)
}

/// Autocadastro de cliente. Cria uma única conta com papel `client`.
#[post("/api/clients/register")]
pub async fn cadastrar_cliente(
    data: web::Data<AppState>,
    cadastro: web::Json<CadastroRequest>,
) -> Result<HttpResponse, AppError> {
    let cadastro = cadastro.into_inner().validar().map_err(AppError::Validacao)?;
    let conta = criar_conta(&data, cadastro, Papel::Cliente).await?;

    let token = gerar_token(&conta, &data.token)
        .map_err(|e| AppError::Interno(format!("Erro ao gerar token: {}", e)))?;

    Ok(HttpResponse::Created().json(CadastroResponse {
        success: true,
        client: conta.into(),
        token,
    }))
}
