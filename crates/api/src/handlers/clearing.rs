//! Admin endpoints for the clearing sweep.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use payrun_db::repositories::VerificationRepo;
use payrun_worker::clearing::{run_clearing_sweep, ClearingRunSummary};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/clearing/run
///
/// Trigger one clearing sweep and return its structured summary. Row-level
/// errors are reported inside the summary; the request itself succeeds so
/// the caller can render partial success.
pub async fn run_clearing(
    State(state): State<AppState>,
) -> Json<DataResponse<ClearingRunSummary>> {
    let summary = run_clearing_sweep(&state.pool).await;
    Json(DataResponse { data: summary })
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Trailing window in days. Defaults to 30, capped at 365.
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ClearingStatsResponse {
    pub total_auto_cleared: i64,
    pub total_auto_flagged: i64,
    /// Share of automated decisions that cleared, as a percentage.
    pub success_rate: f64,
    pub window_days: i64,
}

/// GET /api/v1/admin/clearing/stats?days=N
pub async fn clearing_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<DataResponse<ClearingStatsResponse>>> {
    let days = query.days.unwrap_or(30).clamp(1, 365);
    let since = Utc::now() - Duration::days(days);

    let stats = VerificationRepo::clearing_stats(&state.pool, since).await?;
    let total = stats.total_auto_cleared + stats.total_auto_flagged;
    let success_rate = if total > 0 {
        stats.total_auto_cleared as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    Ok(Json(DataResponse {
        data: ClearingStatsResponse {
            total_auto_cleared: stats.total_auto_cleared,
            total_auto_flagged: stats.total_auto_flagged,
            success_rate,
            window_days: days,
        },
    }))
}
