use axum::Router;
use insight_etl::config::AppConfig;
use insight_etl::handlers;
use insight_etl::services::metrics::Metrics;
use insight_etl::services::pipeline::Pipeline;
use insight_etl::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, draining in-flight runs"),
        () = terminate => info!("Received SIGTERM, draining in-flight runs"),
    }
}

fn setup_logging(config: &AppConfig) {
    let filter = EnvFilter::try_new(format!(
        "{level},tower_http=debug",
        level = config.log.level
    ))
    .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    match config.log.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_current_span(true)
                        .with_span_list(true),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
    }
}

fn create_app_router(config: &AppConfig, state: AppState) -> Router {
    handlers::routes()
        .layer(tower_http::limit::RequestBodyLimitLayer::new(
            config.server.max_request_size,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn run_server(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address {host}:{port}: {e}"))?;

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        error!("Server error: {e}");
        return Err(anyhow::anyhow!("Server failed: {e}"));
    }

    info!("Server shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::new().map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {e}. Please check your environment variables and configuration."
        )
    })?;

    setup_logging(&config);

    info!("Starting InSight ETL v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Config loaded: Host={}, Port={}, Storage={:?}, Warehouse={}",
        config.server.host, config.server.port, config.storage.backend, config.warehouse.enabled
    );

    let pipeline = Pipeline::from_config(&config).map_err(|e| {
        error!("Failed to initialize pipeline: {e}");
        anyhow::anyhow!("Pipeline initialization failed: {e}")
    })?;

    let state = AppState {
        config: Arc::new(config.clone()),
        pipeline: Arc::new(pipeline),
        metrics: Arc::new(Metrics::new()),
    };

    let app = create_app_router(&config, state);
    run_server(app, &config.server.host, config.server.port).await
}
