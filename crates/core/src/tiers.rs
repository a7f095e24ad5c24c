//! Commission tier registry.
//!
//! Static reference data mapping a tier name to its commission rate, fee
//! discount, and minimum payout. Tier lifecycle is admin-managed elsewhere;
//! this table mirrors the configured program tiers.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// One commission tier's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionTier {
    pub name: &'static str,
    /// Fraction of GMV paid as commission (0.15 = 15%).
    pub commission_rate: Decimal,
    /// Fraction knocked off disbursement fees for this tier (0..=1).
    pub fee_discount: Decimal,
    /// Minimum accumulated amount before a payout is created.
    pub minimum_payout: Decimal,
}

/// Tiers ordered lowest to highest. The first entry is the fallback for
/// unknown tier names.
pub const COMMISSION_TIERS: &[CommissionTier] = &[
    CommissionTier {
        name: "Bronze",
        commission_rate: dec!(0.15),
        fee_discount: dec!(0),
        minimum_payout: dec!(50000),
    },
    CommissionTier {
        name: "Silver",
        commission_rate: dec!(0.20),
        fee_discount: dec!(0.10),
        minimum_payout: dec!(40000),
    },
    CommissionTier {
        name: "Gold",
        commission_rate: dec!(0.25),
        fee_discount: dec!(0.15),
        minimum_payout: dec!(30000),
    },
    CommissionTier {
        name: "Platinum",
        commission_rate: dec!(0.30),
        fee_discount: dec!(0.20),
        minimum_payout: dec!(25000),
    },
];

/// Look up a tier by name (case-insensitive).
///
/// Unknown names fall back to the lowest tier rather than erroring, so a
/// stale tier reference on an affiliate row degrades to Bronze terms.
pub fn tier_by_name(name: &str) -> &'static CommissionTier {
    COMMISSION_TIERS
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or(&COMMISSION_TIERS[0])
}

/// Commission rate for a tier name.
pub fn commission_rate(name: &str) -> Decimal {
    tier_by_name(name).commission_rate
}

/// Minimum payout amount for a tier name.
pub fn minimum_payout(name: &str) -> Decimal {
    tier_by_name(name).minimum_payout
}

/// Result of a commission calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionResult {
    pub commission_amount: Decimal,
    pub commission_rate: Decimal,
    pub tier_name: Option<String>,
}

/// Compute the commission on a purchase.
///
/// A `custom_rate` overrides the tier rate when present; with neither, the
/// lowest tier's rate applies. The amount is rounded to the nearest whole
/// currency unit.
pub fn calculate_commission(
    purchase_amount: Decimal,
    tier_name: Option<&str>,
    custom_rate: Option<Decimal>,
) -> CommissionResult {
    let rate = custom_rate.unwrap_or_else(|| {
        tier_name
            .map(commission_rate)
            .unwrap_or(COMMISSION_TIERS[0].commission_rate)
    });
    let amount = (purchase_amount * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    CommissionResult {
        commission_amount: amount,
        commission_rate: rate,
        tier_name: tier_name.map(str::to_owned),
    }
}
