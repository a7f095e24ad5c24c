use std::sync::Arc;

use crate::config::ServerConfig;
use crate::gateway::DisbursementClient;
use crate::notifications::EmailClient;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: payrun_db::DbPool,
    /// Server configuration (webhook token, gateway and email settings).
    pub config: Arc<ServerConfig>,
    /// Disbursement gateway HTTP client.
    pub gateway: Arc<DisbursementClient>,
    /// Best-effort transactional email sender.
    pub mailer: Arc<EmailClient>,
}
