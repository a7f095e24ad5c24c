//! Disbursement gateway status vocabulary.
//!
//! The gateway reports statuses in its own vocabulary; reconciliation maps
//! them onto [`PayoutStatus`] before touching any internal state. Unknown
//! statuses map to `None` and are acknowledged-and-logged by the webhook
//! handler rather than best-effort scraped.

use crate::status::PayoutStatus;

/// Known gateway disbursement statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Accepted,
    Pending,
    Locked,
    Processing,
    Succeeded,
    Completed,
    Failed,
    Cancelled,
}

impl GatewayStatus {
    /// Parse a gateway status string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ACCEPTED" => Some(Self::Accepted),
            "PENDING" => Some(Self::Pending),
            "LOCKED" => Some(Self::Locked),
            "PROCESSING" => Some(Self::Processing),
            "SUCCEEDED" => Some(Self::Succeeded),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Map to the internal payout status.
    pub fn to_internal(self) -> PayoutStatus {
        match self {
            Self::Accepted | Self::Pending | Self::Locked | Self::Processing => {
                PayoutStatus::Processing
            }
            Self::Succeeded | Self::Completed => PayoutStatus::Sent,
            Self::Failed | Self::Cancelled => PayoutStatus::Failed,
        }
    }

    /// Whether the gateway will send no further updates for this status.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Completed | Self::Failed | Self::Cancelled
        )
    }
}

/// Convenience: parse and map in one step.
pub fn map_status(s: &str) -> Option<PayoutStatus> {
    GatewayStatus::parse(s).map(GatewayStatus::to_internal)
}
