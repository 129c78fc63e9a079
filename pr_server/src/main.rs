//! Poker room server: REST endpoints plus a WebSocket change feed per room.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use log::info;
use pico_args::Arguments;
use poker_room::{
    Database, InMemoryRoomRepository, PgRoomRepository, RoomController, RoomRepository,
};
use pr_server::{
    api,
    config::{ServerConfig, StorageBackend},
    logging, metrics,
};

const HELP: &str = "\
Run a poker room server

USAGE:
  pr_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --storage    BACKEND     postgres or memory          [default: env STORAGE_BACKEND or postgres]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  DB_RUN_MIGRATIONS        Apply bundled migrations on startup [default: true]
  ROOM_MIN_BUY_IN          Smallest accepted buy-in
  ROOM_MAX_BUY_IN          Largest accepted buy-in
  METRICS_BIND             Prometheus listener (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let storage: Option<StorageBackend> = pargs.opt_value_from_str("--storage")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url, storage)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics on http://{}/metrics", addr);
    }

    let (repo, database): (Arc<dyn RoomRepository>, Option<Database>) = match &config.database {
        Some(db_config) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            if db_config.run_migrations {
                db.migrate().await.context("Failed to apply migrations")?;
                info!("Migrations applied");
            }
            (Arc::new(PgRoomRepository::new(db.pool().clone())), Some(db))
        }
        None => {
            info!("Using in-memory room storage; rooms are lost on restart");
            (Arc::new(InMemoryRoomRepository::new()), None)
        }
    };

    let controller = Arc::new(RoomController::new(repo, config.room.clone()));
    let app = api::create_router(api::AppState {
        controller,
        database: database.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{} ({} storage). Press Ctrl+C to stop.",
        config.bind, config.storage
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
    }
}
