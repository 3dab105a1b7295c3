//! Modlog server binary.
//!
//! Starts the event pipeline and an axum HTTP server with structured
//! logging, database initialization, and graceful shutdown on SIGTERM/SIGINT.

use modlog_pipeline::{AuditCorrelator, ChannelEventSource, DiscordRest, Dispatcher, Pipeline};
use modlog_server::{app, config, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("MODLOG_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration, the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = modlog_db::create_pool(
        &config.database.path,
        modlog_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool, check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = modlog_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    if config.discord.bot_token.is_empty() {
        tracing::warn!("discord.bot_token is empty; audit reads and sends will be rejected");
    }
    if config.admin.token.is_empty() {
        tracing::warn!("admin.token is empty; administrative routes are disabled");
    }

    // Build pipeline
    let rest = Arc::new(
        DiscordRest::new(
            config.discord.api_base.clone(),
            config.discord.bot_token.clone(),
            Duration::from_millis(config.discord.request_timeout_ms),
        )
        .expect("failed to build platform REST client"),
    );
    let correlator = AuditCorrelator::new(rest.clone())
        .with_timeout(Duration::from_millis(config.correlation.audit_timeout_ms));
    let dispatcher = Dispatcher::new(pool.clone(), rest)
        .with_timeout(Duration::from_millis(config.discord.request_timeout_ms));
    let pipeline = Pipeline::new(correlator, dispatcher)
        .with_drain_timeout(Duration::from_millis(config.ingest.drain_timeout_ms));

    let (events, source) = ChannelEventSource::bounded(config.ingest.queue_capacity.max(1));
    let pipeline_task = tokio::spawn(async move { pipeline.run(source).await });

    // Build application
    let state = AppState {
        pool,
        admin_token: config.admin.token.clone(),
        events,
    };
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting modlog server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address, is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // The router (and with it the last sender) is gone; the source closes
    // and the pipeline waits for in-flight records up to the drain timeout.
    if let Err(e) = pipeline_task.await {
        tracing::error!(error = %e, "pipeline task failed");
    }

    tracing::info!("modlog server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
