//! Dreamstart HTTP server.

use dreamstart::{Config, bootstrap};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dreamstart=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        environment = %config.server.environment,
        app_url = %config.app.url,
        database = config.database.is_some(),
        redis = config.redis.is_some(),
        smtp = config.mail.smtp.is_some(),
        "Configuration loaded"
    );

    let app = bootstrap::build(&config).await?;

    if config.server.release_command {
        info!("Release command finished");
        return Ok(());
    }

    let router = dreamstart_web::router(app.state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(worker) = app.mail_worker {
        drain_mail(worker, config.server.shutdown_timeout).await;
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for queued mail once the router (and its queue handles) are gone.
async fn drain_mail(worker: tokio::task::JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(())) => info!("Mail queue drained"),
        Ok(Err(e)) => error!(error = %e, "Mail worker failed"),
        Err(_) => warn!(timeout_secs = timeout.as_secs(), "Mail queue not drained before timeout"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
