use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chat_server::config::AppConfig;
use chat_server::state::AppState;
use chat_server::{build_router, database, seed};
use common::storage::filesystem::FilesystemFileStore;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("failed to initialise database")?;

    if let Some(admin) = &config.admin {
        seed::seed_admin(&db, admin).await?;
    }

    let file_store = FilesystemFileStore::new(
        PathBuf::from(&config.storage.root),
        config.storage.max_file_size,
    )
    .await
    .context("failed to initialise file storage")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState {
        db,
        file_store: Arc::new(file_store),
        config: Arc::new(config),
    };
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
