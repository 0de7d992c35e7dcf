use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use learnonline_api::cli::Cli;
use learnonline_api::config::AppConfig;
use learnonline_api::database::{seed, MemoryStore, MongoStore, Store};
use learnonline_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up MONGODB_URI, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.no_seed {
        config.server.seed_sample_data = false;
    }
    tracing::info!("Starting LearnOnline API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = if cli.memory {
        tracing::warn!("using the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            MongoStore::connect(&config.database)
                .await
                .context("failed to connect to MongoDB")?,
        )
    };

    if config.server.seed_sample_data {
        seed::seed_sample_data(store.as_ref(), config.security.bcrypt_cost)
            .await
            .context("failed to seed sample data")?;
    }

    let port = config.server.port;
    let state = AppState::new(config, store)?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("LearnOnline API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
