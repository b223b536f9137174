//! Billingly service entrypoint.
//!
//! Loads configuration, initializes tracing, connects the PostgreSQL pool,
//! and runs the billing scheduler until Ctrl-C.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use billingly::adapters::postgres::PostgresCustomerRepository;
use billingly::application::scheduler::{BillingScheduler, SchedulerConfig};
use billingly::application::CustomerLocks;
use billingly::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let customers = Arc::new(PostgresCustomerRepository::new(pool));
    let locks = CustomerLocks::new();
    let scheduler = BillingScheduler::with_config(
        customers,
        locks,
        SchedulerConfig::default()
            .with_tick_interval(config.scheduler.tick_interval())
            .with_page_size(config.scheduler.page_size),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    tracing::info!(
        tick_interval_secs = config.scheduler.tick_interval_secs,
        "billingly scheduler started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown_tx.send(true)?;
    scheduler_task.await??;

    Ok(())
}
