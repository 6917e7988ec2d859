// src/lib.rs

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::web;

pub mod admin;
pub mod categorias;
pub mod config;
pub mod erros;
pub mod produtos;
pub mod repositorio;
pub mod saude;
pub mod shared;
pub mod uploads;
pub mod usuarios;
pub mod vendas;

use erros::AppError;
use repositorio::Repositorio;
use uploads::armazenamento::Armazenamento;
use usuarios::token::ConfigToken;

/// Estado compartilhado entre os workers: repositório, armazenamento de imagens e parâmetros de segurança.
pub struct AppState {
    pub repo: Arc<dyn Repositorio>,
    pub armazenamento: Arc<dyn Armazenamento>,
    pub token: ConfigToken,
    pub bcrypt_custo: u32,
    pub limite_upload: usize,
    pub ambiente: String,
}

/// CORS aberto: qualquer origem, método e cabeçalho, respondendo `*`.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
}

/// Registra extratores e todas as rotas da API.
pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Corpo JSON rejeitado");
        AppError::Validacao("Dados inválidos".into()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validacao(format!("Parâmetros inválidos: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|_err, _req| {
        AppError::NaoEncontrado("Recurso não encontrado".into()).into()
    }))
    // Saúde
    .service(saude::health)
    .service(saude::api_health)
    .service(saude::api_test)
    // Catálogo público
    .service(produtos::produtos_router::buscar_produtos)
    .service(produtos::produtos_router::buscar_produto_por_id)
    .service(categorias::categoria_router::buscar_categorias)
    // Contas
    .service(usuarios::usuario_router::login_usuario)
    .service(usuarios::usuario_router::login_admin)
    .service(usuarios::usuario_router::cadastrar_cliente)
    // Pedidos
    .service(vendas::vendas_router::realizar_venda)
    .service(vendas::vendas_router::listar_pedidos)
    .service(vendas::vendas_router::atualizar_pedido)
    // Painel: produtos
    .service(produtos::produtos_router::listar_produtos_admin)
    .service(produtos::produtos_router::cadastrar_produto)
    .service(produtos::produtos_router::atualizar_produto)
    .service(produtos::produtos_router::deletar_produto)
    .service(produtos::produtos_router::enviar_imagens_produto)
    // Painel: contas, categorias e configurações
    .service(admin::admin_router::listar_clientes)
    .service(admin::admin_router::listar_vendedores)
    .service(admin::admin_router::cadastrar_vendedor)
    .service(admin::admin_router::estatisticas)
    .service(admin::admin_router::buscar_configuracoes)
    .service(admin::admin_router::atualizar_configuracoes)
    .service(admin::admin_router::exportar_backup)
    .service(categorias::categoria_router::cadastrar_categoria)
    // Uploads
    .service(uploads::upload_router::enviar_imagens)
    .service(uploads::upload_router::servir_imagem);
}
