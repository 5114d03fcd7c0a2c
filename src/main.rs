use std::time::Duration;
use tokio::signal;

use novacore_backend::{config::Settings, create_router, middleware, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Settings::new()?;

    middleware::init_logging(&config.log_level, &config.log_format)?;

    tracing::info!(
        max_concurrent_scans = config.max_concurrent_scans,
        job_retention_limit = config.job_retention_limit,
        "Starting NovaCore scan backend"
    );

    let cors_layer = middleware::create_cors_layer(&config.cors_allow_origins);
    let addr = config.bind_address();
    let grace = Duration::from_secs_f64(config.shutdown_grace_seconds);

    let app_state = AppState::new(config);
    let task_manager = app_state.task_manager.clone();

    let app = create_router(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
        .layer(middleware::create_logging_layer())
        .layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let aborted = task_manager.shutdown(grace).await;
    tracing::info!(aborted_scans = aborted, "Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
