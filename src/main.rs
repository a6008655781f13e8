use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use careletter::api::{build_router, ApiContext};
use careletter::config::{self, Config};
use careletter::db::sqlite::open_database;
use careletter::providers::Providers;
use careletter::retention::RetentionSweeper;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cfg = Config::from_env()?;

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!(path = %cfg.database_path.display(), "Opening database");
    let conn = open_database(&cfg.database_path)?;
    let db = Arc::new(Mutex::new(conn));

    let providers = Providers::from_config(&cfg);
    let ctx = ApiContext::new(Arc::new(cfg.clone()), db.clone(), providers);

    let sweeper = RetentionSweeper::start(db);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "{} v{} listening", config::APP_NAME, config::APP_VERSION);

    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown signal handler");
    }
}
