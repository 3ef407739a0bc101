// Main entry point for API server

use agree_core::domains::auth::{JwtService, SessionStore};
use agree_core::kernel::{start_scheduler, ServerDeps};
use agree_core::{server::build_app, Config};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::signal::ctrl_c;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agree_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Disagree to Agree API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded");

    // Connect to database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations complete");

    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())
        .with_ttl(config.session_ttl());
    let deps = ServerDeps::postgres(
        pool.clone(),
        jwt_service,
        SessionStore::new(config.session_ttl()),
        config.matchmaking(),
    );

    let mut scheduler = start_scheduler(deps.clone())
        .await
        .context("Failed to start scheduled tasks")?;

    // Build application
    let app = build_app(deps, Some(pool), &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting server on {}", addr);
    info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Err(e) = scheduler.shutdown().await {
        warn!(error = %e, "scheduler did not shut down cleanly");
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install signal handler");
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
}
