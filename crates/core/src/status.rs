//! Status vocabularies and transition rules for conversions and payouts.
//!
//! Both state machines are forward-only. A conversion that has left
//! `pending` is never re-selected by the clearing sweep; a payout that has
//! reached `sent` is immutable except via out-of-band correction.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Conversion status
// ---------------------------------------------------------------------------

/// Commission awaiting the refund window.
pub const CONVERSION_PENDING: &str = "pending";
/// Refund window elapsed, commission confirmed payable.
pub const CONVERSION_CLEARED: &str = "cleared";
/// Included in a payout that the gateway reported as sent.
pub const CONVERSION_PAID: &str = "paid";
/// Held for manual fraud review.
pub const CONVERSION_FLAGGED: &str = "flagged";

/// All valid conversion statuses.
pub const VALID_CONVERSION_STATUSES: &[&str] = &[
    CONVERSION_PENDING,
    CONVERSION_CLEARED,
    CONVERSION_PAID,
    CONVERSION_FLAGGED,
];

/// Lifecycle state of a commission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Pending,
    Cleared,
    Paid,
    Flagged,
}

impl ConversionStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => CONVERSION_PENDING,
            Self::Cleared => CONVERSION_CLEARED,
            Self::Paid => CONVERSION_PAID,
            Self::Flagged => CONVERSION_FLAGGED,
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            CONVERSION_PENDING => Ok(Self::Pending),
            CONVERSION_CLEARED => Ok(Self::Cleared),
            CONVERSION_PAID => Ok(Self::Paid),
            CONVERSION_FLAGGED => Ok(Self::Flagged),
            other => Err(CoreError::Validation(format!(
                "Unknown conversion status: '{other}'. Valid statuses: {}",
                VALID_CONVERSION_STATUSES.join(", ")
            ))),
        }
    }

    /// Whether the transition `self -> next` is allowed.
    ///
    /// `pending -> cleared|flagged`, `cleared -> paid`; everything else
    /// (including self-transitions) is rejected.
    pub fn can_transition_to(&self, next: ConversionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Cleared)
                | (Self::Pending, Self::Flagged)
                | (Self::Cleared, Self::Paid)
        )
    }
}

// ---------------------------------------------------------------------------
// Payout status
// ---------------------------------------------------------------------------

/// Created, not yet handed to the gateway.
pub const PAYOUT_PENDING: &str = "pending";
/// Accepted by the gateway, funds in flight.
pub const PAYOUT_PROCESSING: &str = "processing";
/// Gateway confirmed delivery to the recipient.
pub const PAYOUT_SENT: &str = "sent";
/// Gateway reported a terminal failure; recovery is a new payout.
pub const PAYOUT_FAILED: &str = "failed";

/// All valid payout statuses.
pub const VALID_PAYOUT_STATUSES: &[&str] = &[
    PAYOUT_PENDING,
    PAYOUT_PROCESSING,
    PAYOUT_SENT,
    PAYOUT_FAILED,
];

/// Lifecycle state of a disbursement batch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl PayoutStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => PAYOUT_PENDING,
            Self::Processing => PAYOUT_PROCESSING,
            Self::Sent => PAYOUT_SENT,
            Self::Failed => PAYOUT_FAILED,
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            PAYOUT_PENDING => Ok(Self::Pending),
            PAYOUT_PROCESSING => Ok(Self::Processing),
            PAYOUT_SENT => Ok(Self::Sent),
            PAYOUT_FAILED => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown payout status: '{other}'. Valid statuses: {}",
                VALID_PAYOUT_STATUSES.join(", ")
            ))),
        }
    }

    /// Whether the transition `self -> next` is allowed.
    ///
    /// Pending and processing may move forward; `sent` and `failed` are
    /// terminal. A failed payout is retried by creating a new pending
    /// payout, never by mutating the failed row.
    pub fn can_transition_to(&self, next: PayoutStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Sent)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Sent)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Whether no further gateway updates are expected.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
