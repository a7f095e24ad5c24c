//! Clearing window arithmetic and fraud heuristics.
//!
//! The clearing sweep itself (row selection, updates, auditing) lives in
//! `payrun-worker`; this module holds the pure parts: computing the date
//! thresholds from configuration and deciding clear-vs-flag for one
//! conversion from a pre-fetched [`FraudContext`].
//!
//! Fraud rules are an ordered list of independent predicate+reason pairs,
//! evaluated in order and short-circuiting on the first hit.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::program::AutoClearingConfig;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Date thresholds
// ---------------------------------------------------------------------------

/// The three cutoff dates governing one clearing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearingWindows {
    /// Conversions created at or before this are past the refund period.
    pub refund_cutoff: Timestamp,
    /// Earliest creation date the sweep will touch; anything older needs
    /// manual handling.
    pub max_clear: Timestamp,
    /// Conversions newer than this have not aged the minimum number of days.
    pub min_clear: Timestamp,
}

impl ClearingWindows {
    /// Compute the sweep windows for `now` under the given configuration.
    pub fn compute(config: &AutoClearingConfig, now: Timestamp) -> Self {
        Self {
            refund_cutoff: now - Duration::days(config.refund_period_days),
            max_clear: now - Duration::days(config.max_days_before_clear),
            min_clear: now - Duration::days(config.min_days_before_clear),
        }
    }
}

/// Whole days a conversion has been pending.
pub fn days_pending(created_at: Timestamp, now: Timestamp) -> i64 {
    (now - created_at).num_days()
}

// ---------------------------------------------------------------------------
// Fraud rules
// ---------------------------------------------------------------------------

/// Commission amount above which a conversion is held for review.
pub const HIGH_COMMISSION_THRESHOLD: Decimal = dec!(1000);

/// Trailing window for the conversion-frequency rule.
pub const FREQUENCY_WINDOW_DAYS: i64 = 7;

/// Conversions by one affiliate inside the window before frequency is
/// considered unusual.
pub const FREQUENCY_LIMIT: i64 = 10;

/// Everything the fraud rules need to know about one candidate conversion,
/// pre-fetched by the caller so each rule stays pure.
#[derive(Debug, Clone)]
pub struct FraudContext {
    pub commission_amount: Decimal,
    /// Other conversions sharing this conversion's customer or order.
    pub duplicate_matches: i64,
    /// Conversions by the same affiliate in the trailing window, excluding
    /// this one.
    pub recent_conversion_count: i64,
}

/// One fraud heuristic: a predicate over the context and the reason reported
/// when it fires.
pub struct FraudRule {
    pub name: &'static str,
    check: fn(&FraudContext) -> Option<String>,
}

/// The ordered rule set. Each rule is independently sufficient to flag.
pub const FRAUD_RULES: &[FraudRule] = &[
    FraudRule {
        name: "duplicate_customer_or_order",
        check: |ctx| {
            (ctx.duplicate_matches > 0).then(|| "Duplicate customer/order detected".to_owned())
        },
    },
    FraudRule {
        name: "high_commission_amount",
        check: |ctx| {
            (ctx.commission_amount > HIGH_COMMISSION_THRESHOLD)
                .then(|| format!("High commission amount: {}", ctx.commission_amount))
        },
    },
    FraudRule {
        name: "unusual_conversion_frequency",
        check: |ctx| {
            (ctx.recent_conversion_count > FREQUENCY_LIMIT)
                .then(|| "Unusual conversion frequency detected".to_owned())
        },
    },
];

/// Run the rules in order; the first hit's reason wins.
pub fn evaluate_fraud(ctx: &FraudContext) -> Option<String> {
    FRAUD_RULES.iter().find_map(|rule| (rule.check)(ctx))
}

// ---------------------------------------------------------------------------
// Clearing decision
// ---------------------------------------------------------------------------

/// Outcome of evaluating one pending conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearingDecision {
    Clear { reason: String },
    Flag { reason: String },
}

impl ClearingDecision {
    pub fn reason(&self) -> &str {
        match self {
            Self::Clear { reason } | Self::Flag { reason } => reason,
        }
    }
}

/// Decide clear-vs-flag given the days pending and an optional fraud hit.
///
/// `fraud_hit` of `None` means either the checks passed or fraud checking is
/// disabled; the caller substitutes a "system error" hit when the checks
/// themselves fail, so infrastructure failure flags rather than clears.
pub fn decide(days_pending: i64, fraud_hit: Option<String>) -> ClearingDecision {
    match fraud_hit {
        Some(reason) => ClearingDecision::Flag {
            reason: format!("Auto-flagged: {reason}"),
        },
        None => ClearingDecision::Clear {
            reason: format!("Auto-cleared after {days_pending} days (refund period expired)"),
        },
    }
}

/// The fraud hit substituted when the fraud-context queries error out.
pub fn fraud_system_error_reason() -> String {
    "Fraud check system error".to_owned()
}
