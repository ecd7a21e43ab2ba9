//! point-ledger worker
//!
//! Wires the point ledger, the synchronous dispatcher and the payment
//! producer, then runs the history reconciliation job until shutdown.

use point_ledger::jobs::{ReconcileJob, ReconcileJobConfig};
use point_ledger::{app, db, telemetry, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format);

    tracing::info!(environment = %config.environment, "Starting point-ledger");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config).await?;
    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    // The worker only reconciles. Building the service checks listener
    // wiring so a misregistration stops startup; the value is not kept.
    let transport = app::build_transport(&config)?;
    app::build_point_service(pool.clone(), transport)?;
    tracing::info!("Point service wiring verified");

    let job = ReconcileJob::with_config(
        pool.clone(),
        ReconcileJobConfig {
            interval: config.reconcile_interval,
        },
    );
    job.run_until(shutdown_signal()).await;

    // Cleanup
    tracing::info!("Shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
