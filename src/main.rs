use catalog_api::config::Config;
use catalog_api::database::{SqliteRepository, establish_pool};
use catalog_api::http::{AppState, HttpServer, HttpServerConfig};
use catalog_api::logger::TracingLogger;
use catalog_api::models::{Author, Book};
use catalog_api::telemetry;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::install()?;

    let pool = establish_pool(config.database_url(), config.max_connections()).await?;
    let state = AppState::new(
        Arc::new(SqliteRepository::<Author>::new(pool.clone())),
        Arc::new(SqliteRepository::<Book>::new(pool)),
        Arc::new(TracingLogger),
    );

    let server_config = HttpServerConfig::new(config.server_port(), config.cors_origins().to_vec());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
