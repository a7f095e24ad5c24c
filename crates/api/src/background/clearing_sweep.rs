//! Periodic in-process clearing sweep.
//!
//! Runs the same sweep as the standalone worker binary on a fixed interval,
//! so single-process deployments age conversions without a separate cron
//! task. Runs until `cancel` is triggered.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use payrun_worker::clearing::run_clearing_sweep;

/// Default sweep interval: 6 hours.
const DEFAULT_INTERVAL_SECS: u64 = 21_600;

/// Run the clearing sweep loop.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("CLEARING_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    tracing::info!(interval_secs, "Clearing sweep job started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Clearing sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                let summary = run_clearing_sweep(&pool).await;
                if summary.total_processed > 0 || !summary.errors.is_empty() {
                    tracing::info!(
                        total_processed = summary.total_processed,
                        cleared = summary.cleared_count,
                        flagged = summary.flagged_count,
                        errors = summary.errors.len(),
                        "Scheduled clearing sweep finished"
                    );
                }
            }
        }
    }
}
