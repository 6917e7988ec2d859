// src/main.rs

use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use eletromaquinas::config::Config;
use eletromaquinas::repositorio::banco::dados_iniciais;
use eletromaquinas::repositorio::memoria::RepositorioMemoria;
use eletromaquinas::repositorio::postgres::RepositorioPostgres;
use eletromaquinas::repositorio::Repositorio;
use eletromaquinas::saude::rota_nao_encontrada;
use eletromaquinas::uploads::armazenamento::{
    Armazenamento, ArmazenamentoDisco, ArmazenamentoMemoria,
};
use eletromaquinas::usuarios::token::ConfigToken;
use eletromaquinas::{configurar, cors, AppState};

fn erro_io(contexto: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", contexto, e))
}

/// Escolhe o backend: Postgres se houver `DATABASE_URL`, senão memória (com espelho opcional em arquivo).
async fn montar_repositorio(config: &Config) -> io::Result<Arc<dyn Repositorio>> {
    let admin_hash = bcrypt::hash(&config.admin_password, config.bcrypt_cost)
        .map_err(|e| erro_io("Falha ao gerar hash do admin", e))?;
    let iniciais = dados_iniciais(&config.admin_email, admin_hash);

    if let Some(url) = &config.database_url {
        let repo = RepositorioPostgres::conectar(url)
            .await
            .map_err(|e| erro_io("Falha ao conectar ao banco PostgreSQL", e))?;
        repo.preparar(iniciais)
            .await
            .map_err(|e| erro_io("Falha ao preparar o esquema", e))?;
        tracing::info!("Usando PostgreSQL");
        return Ok(Arc::new(repo));
    }

    match &config.data_file {
        Some(arquivo) => {
            let repo = RepositorioMemoria::com_arquivo(arquivo, iniciais)
                .map_err(|e| erro_io("Falha ao abrir o arquivo de dados", e))?;
            tracing::info!(arquivo = %arquivo.display(), "Usando memória com espelho em arquivo");
            Ok(Arc::new(repo))
        }
        None => {
            tracing::warn!("Sem DATABASE_URL nem DATA_FILE; os dados se perdem ao reiniciar");
            Ok(Arc::new(RepositorioMemoria::novo(iniciais)))
        }
    }
}

fn montar_armazenamento(config: &Config) -> io::Result<Arc<dyn Armazenamento>> {
    match &config.upload_dir {
        Some(diretorio) => {
            let disco = ArmazenamentoDisco::novo(diretorio)
                .map_err(|e| erro_io("Falha ao preparar diretório de uploads", e))?;
            tracing::info!(diretorio = %diretorio.display(), "Uploads gravados em disco");
            Ok(Arc::new(disco))
        }
        None => Ok(Arc::new(ArmazenamentoMemoria::default())),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("eletromaquinas=info,actix_web=info")),
        )
        .init();

    let config = Config::from_env().map_err(|e| erro_io("Configuração inválida", e))?;

    let app_state = web::Data::new(AppState {
        repo: montar_repositorio(&config).await?,
        armazenamento: montar_armazenamento(&config)?,
        token: ConfigToken {
            segredo: config.jwt_secret.clone(),
            validade_horas: config.jwt_expiration_hours,
        },
        bcrypt_custo: config.bcrypt_cost,
        limite_upload: config.upload_max_bytes,
        ambiente: config.app_env.clone(),
    });

    tracing::info!(
        host = %config.host,
        port = config.port,
        ambiente = %config.app_env,
        "Iniciando API EletroMáquinas"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors())
            .app_data(app_state.clone())
            .configure(configurar)
            .default_service(web::to(rota_nao_encontrada))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
