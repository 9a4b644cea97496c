use mimalloc::MiMalloc;
use taskboard::{config::AppConfig, db, routes, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env();
    let state = build_state(config.clone()).await;

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        storage = state.storage_backend(),
        environment = %config.environment,
        "Starting Taskboard server"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Connect to PostgreSQL when configured, otherwise (or on failure) run on the in-memory store.
async fn build_state(config: AppConfig) -> AppState {
    let Some(url) = config.database.url.clone() else {
        tracing::warn!("DATABASE_URL not set, running in degraded mode with the in-memory store");
        return AppState::in_memory(config);
    };

    match db::connect(&url, &config.database).await {
        Ok(pool) => {
            tracing::info!(
                max_connections = config.database.max_connections,
                "Connected to PostgreSQL"
            );
            AppState::with_pool(pool, config)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Database unavailable, running in degraded mode with the in-memory store"
            );
            AppState::in_memory(config)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
