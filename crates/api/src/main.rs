use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardsync_api::config::ServerConfig;
use boardsync_api::router::build_app_router;
use boardsync_api::state::AppState;
use boardsync_api::{background, ws};
use boardsync_events::BoardBus;
use boardsync_sync::{BoardSync, PgBoardStore, PgMembershipGuard};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "boardsync_api=debug,boardsync_sync=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = boardsync_db::create_pool(&database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections = config.db_max_connections, "Database connection pool created");

    boardsync_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    boardsync_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Board sync ---
    let bus = Arc::new(BoardBus::new(config.broadcast_capacity));
    let sync = Arc::new(BoardSync::new(
        Arc::new(PgBoardStore::new(pool.clone(), config.board_lock_timeout())),
        Arc::new(PgMembershipGuard::new(pool.clone())),
        bus.clone(),
        config.board_lock_timeout(),
    ));
    tracing::info!(
        lock_timeout_ms = config.board_lock_timeout_ms,
        broadcast_capacity = config.broadcast_capacity,
        "Board sync services created"
    );

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), cancel.clone());

    let maintenance_handle = tokio::spawn(background::maintenance::run(
        Arc::clone(sync.locks()),
        Arc::clone(&bus),
        cancel.clone(),
    ));

    // --- App state + router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        sync,
        bus,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let drain = futures::future::join(maintenance_handle, heartbeat_handle);
    if tokio::time::timeout(config.shutdown_timeout(), drain).await.is_err() {
        tracing::warn!("Background tasks did not stop within the shutdown timeout");
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
