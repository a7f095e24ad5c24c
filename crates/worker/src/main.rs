use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payrun_worker::clearing;

/// How often the clearing sweep runs when not overridden.
const DEFAULT_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payrun_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = payrun_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    payrun_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let interval_secs: u64 = std::env::var("CLEARING_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            signal_cancel.cancel();
        }
    });

    tracing::info!(interval_secs, "Clearing worker started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Clearing worker stopping");
                break;
            }
            _ = interval.tick() => {
                let summary = clearing::run_clearing_sweep(&pool).await;
                if !summary.errors.is_empty() {
                    tracing::warn!(
                        errors = summary.errors.len(),
                        "Clearing sweep finished with row-level errors"
                    );
                }
            }
        }
    }
}
