//! argviewer - REST server for the proposal graph.
//!
//! Reads configuration from `ARGVIEWER__*` environment variables (see
//! `argviewer::config`), connects the PostgreSQL pool, and serves the API.

use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use argviewer::adapters::http::api_router;
use argviewer::adapters::postgres::{
    PostgresProposalRepository, PostgresUnitOfWork, PostgresUserDirectory,
    PostgresVoteLedgerRepository,
};
use argviewer::application::ProposalService;
use argviewer::config::{AppConfig, ConfigError, ServerConfig, ValidationError};

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server, config.use_json_logs())?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!(url = %config.database.masked_url(), "Connected to database");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let service = Arc::new(ProposalService::new(
        Arc::new(PostgresProposalRepository::new(pool.clone())),
        Arc::new(PostgresVoteLedgerRepository::new(pool.clone())),
        Arc::new(PostgresUnitOfWork::new(pool.clone())),
        Arc::new(PostgresUserDirectory::new(pool)),
        config.proposals.root_filter,
    ));

    let app = with_layers(api_router(service), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        root_filter = ?config.proposals.root_filter,
        "argviewer listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(server: &ServerConfig, json: bool) -> Result<(), ValidationError> {
    let filter = server.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn with_layers(router: Router, server: &ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(TimeoutLayer::new(server.request_timeout())),
    )
}
