//! Startup and shutdown

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use erpgw_core_types::Sensitive;
use erpgw_engine::resolver_for;
use erpgw_store::SqlExecutor;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::{router, AppState, HttpSettings};

/// Open the database, bind the listener and serve until a shutdown signal,
/// then close the pool.
///
/// # Errors
///
/// Fails when the database is unreachable at startup or the listen address
/// cannot be bound.
pub async fn run(config: GatewayConfig, db_password: Sensitive<String>) -> anyhow::Result<()> {
    let executor: Arc<dyn SqlExecutor> =
        Arc::new(erpgw_store::open(&config.connection_params(), &db_password).await?);
    let resolver = resolver_for(config.erp, executor.clone(), config.pricing_settings());

    let listener = TcpListener::bind(&config.api_listen)
        .await
        .with_context(|| format!("failed to bind {}", config.api_listen))?;

    tracing::info!(
        listen = %config.api_listen,
        backend = config.erp.as_str(),
        access_log = config.debug,
        "erpgw listening"
    );

    let state = AppState::new(executor.clone(), resolver, HttpSettings::from_config(&config));
    let served = serve(listener, state, shutdown_signal()).await;

    executor.close().await;
    tracing::info!("erpgw stopped");
    served
}

/// Serve the router on `listener` until `shutdown` resolves
///
/// # Errors
///
/// I/O failure of the accept loop.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("ctrl-c received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
