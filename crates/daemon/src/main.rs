//! LSA Payment Status Daemon - Main Entry Point
//!
//! Composition root: wires the SQLite store, the payment sweep scheduler and
//! the admin JSON-RPC server, then waits for Ctrl+C.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{DaemonConfig, LogFormat};
use lsa_api_rpc::{RpcServer, RpcServerConfig};
use lsa_core::application::{PaymentStatusChecker, SweepScheduler};
use lsa_core::port::{
    NotificationRepository, SpaRepository, SystemTimeProvider, TimeProvider, UuidProvider,
};
use lsa_infra_sqlite::{
    create_pool, run_migrations, SqliteNotificationRepository, SqliteSpaRepository,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

fn init_logging(format: LogFormat, otel: Option<telemetry::BoxedLayer>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("lsa=info"))
        .context("Failed to create env filter")?;

    let registry = tracing_subscriber::registry().with(otel).with(env_filter);

    match format {
        // Production: JSON structured logging
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .context("Failed to install tracing subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging (+ optional OpenTelemetry layer)
    let telemetry::Telemetry {
        layer: otel_layer,
        status: telemetry_status,
    } = telemetry::init_telemetry().context("OpenTelemetry setup failed")?;
    init_logging(LogFormat::from_env(), otel_layer)?;

    info!("LSA payment status daemon v{} starting...", VERSION);
    telemetry_status.log();

    // 2. Configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;
    info!(
        db_path = %config.db_path,
        rpc_port = config.rpc_port,
        sweep_interval_hours = config.sweep_interval.as_secs() / 3600,
        "Configuration loaded"
    );

    // 3. Database
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = create_pool(&config.db_path, config.db_max_connections)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Dependency wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let spa_repo: Arc<dyn SpaRepository> = Arc::new(SqliteSpaRepository::new(pool.clone()));
    let notification_repo: Arc<dyn NotificationRepository> =
        Arc::new(SqliteNotificationRepository::new(pool.clone()));

    let checker = Arc::new(PaymentStatusChecker::new(
        spa_repo.clone(),
        notification_repo.clone(),
        time_provider.clone(),
        Arc::new(UuidProvider),
    ));
    let scheduler = Arc::new(SweepScheduler::new(checker, config.sweep_interval)?);

    // 5. Payment sweep (first run happens immediately)
    info!("Starting payment sweep scheduler...");
    let scheduler_handle = scheduler.start();

    // 6. Admin JSON-RPC server
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            port: config.rpc_port,
            ..Default::default()
        },
        scheduler.clone(),
        spa_repo,
        notification_repo,
        time_provider,
    );
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown (an in-flight sweep is allowed to finish)
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler_handle.stop())
        .await
        .is_err()
    {
        tracing::warn!("Payment sweep did not finish within shutdown timeout");
    }
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
