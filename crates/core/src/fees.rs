//! Disbursement fee calculation.
//!
//! Pure functions computing per-transaction fees and net payout amounts from
//! the amount, payment channel, and commission tier. Fee structures are
//! gateway list prices: a fixed base fee and a percentage fee, the larger of
//! the two winning, optionally clamped to a floor and ceiling.
//!
//! Tier fee discounts are applied to the pre-clamp total and the clamps are
//! re-enforced afterwards, so a discount can be fully absorbed by the
//! minimum fee. This matches the shipped billing behavior; product has not
//! signed off on the alternative order (clamp first, then discount).

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::tiers;

// ---------------------------------------------------------------------------
// Fee structures
// ---------------------------------------------------------------------------

/// Gateway fee terms for one payment channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeStructure {
    pub payment_method: &'static str,
    /// Fixed fee per disbursement.
    pub base_fee: Decimal,
    /// Fraction of the amount (0.001 = 0.1%).
    pub percentage_fee: Decimal,
    pub minimum_fee: Option<Decimal>,
    pub maximum_fee: Option<Decimal>,
    pub currency: &'static str,
}

/// Known payment channels. Unknown channel names fall back to the first
/// entry (bank transfer).
pub const FEE_STRUCTURES: &[FeeStructure] = &[
    FeeStructure {
        payment_method: "bank_transfer",
        base_fee: dec!(4000),
        percentage_fee: dec!(0.001),
        minimum_fee: Some(dec!(4000)),
        maximum_fee: Some(dec!(25000)),
        currency: "PHP",
    },
    FeeStructure {
        payment_method: "gcash",
        base_fee: dec!(2500),
        percentage_fee: dec!(0.007),
        minimum_fee: Some(dec!(2500)),
        maximum_fee: None,
        currency: "PHP",
    },
];

/// Look up the fee structure for a payment method, falling back to bank
/// transfer terms for unknown channels.
pub fn fee_structure(payment_method: &str) -> &'static FeeStructure {
    FEE_STRUCTURES
        .iter()
        .find(|f| f.payment_method == payment_method)
        .unwrap_or(&FEE_STRUCTURES[0])
}

// ---------------------------------------------------------------------------
// Single payout
// ---------------------------------------------------------------------------

/// Full fee breakdown for one disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeBreakdown {
    pub gross_amount: Decimal,
    pub base_fee: Decimal,
    pub percentage_fee: Decimal,
    pub total_fees: Decimal,
    pub net_amount: Decimal,
    /// Effective fee rate as a percentage of the gross amount (0 when the
    /// amount is 0).
    pub fee_percentage: Decimal,
    pub payment_method: String,
    /// `1 - fee_discount` for the tier, 1 when no discount applies.
    pub tier_multiplier: Decimal,
}

fn round_unit(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the fee breakdown for a single payout.
///
/// `total_fees = max(base_fee, round(amount * percentage_fee))`, discounted
/// by the tier multiplier, then clamped to the channel's minimum/maximum.
/// `net_amount + total_fees == gross_amount` exactly.
pub fn calculate_payout_fees(
    amount: Decimal,
    payment_method: &str,
    tier_name: Option<&str>,
) -> FeeBreakdown {
    let structure = fee_structure(payment_method);

    let base_fee = structure.base_fee;
    let percentage_fee = round_unit(amount * structure.percentage_fee);

    let mut total_fees = base_fee.max(percentage_fee);

    let mut tier_multiplier = Decimal::ONE;
    if let Some(name) = tier_name {
        let discount = tiers::tier_by_name(name).fee_discount;
        if !discount.is_zero() {
            tier_multiplier = Decimal::ONE - discount;
            total_fees = round_unit(total_fees * tier_multiplier);
        }
    }

    if let Some(min) = structure.minimum_fee {
        total_fees = total_fees.max(min);
    }
    if let Some(max) = structure.maximum_fee {
        total_fees = total_fees.min(max);
    }

    let net_amount = amount - total_fees;
    let fee_percentage = if amount.is_zero() {
        Decimal::ZERO
    } else {
        total_fees / amount * dec!(100)
    };

    FeeBreakdown {
        gross_amount: amount,
        base_fee,
        percentage_fee,
        total_fees,
        net_amount,
        fee_percentage,
        payment_method: structure.payment_method.to_owned(),
        tier_multiplier,
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// One payout in a batch fee calculation.
#[derive(Debug, Clone)]
pub struct BatchPayoutInput {
    pub amount: Decimal,
    pub affiliate_tier: Option<String>,
}

/// Aggregated totals over a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchTotals {
    pub total_gross_amount: Decimal,
    pub total_fees: Decimal,
    pub total_net_amount: Decimal,
    /// Weighted average fee percentage over the batch's gross amount.
    pub average_fee_percentage: Decimal,
    pub payout_count: usize,
}

/// Per-payout breakdowns plus batch totals.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFees {
    pub individual_fees: Vec<FeeBreakdown>,
    pub totals: BatchTotals,
}

/// Compute fees for a batch of payouts on one payment channel.
pub fn calculate_batch_fees(payouts: &[BatchPayoutInput], payment_method: &str) -> BatchFees {
    let individual_fees: Vec<FeeBreakdown> = payouts
        .iter()
        .map(|p| calculate_payout_fees(p.amount, payment_method, p.affiliate_tier.as_deref()))
        .collect();

    let total_gross_amount: Decimal = individual_fees.iter().map(|f| f.gross_amount).sum();
    let total_fees: Decimal = individual_fees.iter().map(|f| f.total_fees).sum();
    let total_net_amount: Decimal = individual_fees.iter().map(|f| f.net_amount).sum();

    let average_fee_percentage = if total_gross_amount.is_zero() {
        Decimal::ZERO
    } else {
        total_fees / total_gross_amount * dec!(100)
    };

    BatchFees {
        totals: BatchTotals {
            total_gross_amount,
            total_fees,
            total_net_amount,
            average_fee_percentage,
            payout_count: payouts.len(),
        },
        individual_fees,
    }
}

// ---------------------------------------------------------------------------
// Amount validation
// ---------------------------------------------------------------------------

/// Result of validating a proposed payout amount.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutValidation {
    pub is_valid: bool,
    pub minimum_required: Decimal,
    pub shortfall: Option<Decimal>,
    pub errors: Vec<String>,
}

/// Fee rate above which a payout is considered uneconomical.
const UNREASONABLE_FEE_PERCENTAGE: Decimal = dec!(50);

/// Check a payout amount against tier minimums and fee economics.
pub fn validate_payout_amount(
    amount: Decimal,
    tier_name: Option<&str>,
    payment_method: &str,
) -> PayoutValidation {
    let mut errors = Vec::new();
    let minimum_required = tier_name
        .map(tiers::minimum_payout)
        .unwrap_or(crate::tiers::COMMISSION_TIERS[0].minimum_payout);

    if amount < minimum_required {
        errors.push(format!(
            "Amount {amount} is below minimum payout of {minimum_required}"
        ));
    }

    if amount <= Decimal::ZERO {
        errors.push("Payout amount must be positive".to_owned());
    }

    let breakdown = calculate_payout_fees(amount, payment_method, tier_name);
    if breakdown.net_amount <= Decimal::ZERO {
        errors.push("Payout amount is too low - fees exceed the payout amount".to_owned());
    }
    if breakdown.fee_percentage > UNREASONABLE_FEE_PERCENTAGE {
        errors.push(format!(
            "Fees ({:.2}%) are unusually high for this payout amount",
            breakdown.fee_percentage
        ));
    }

    let shortfall = if amount < minimum_required {
        Some(minimum_required - amount)
    } else {
        None
    };

    PayoutValidation {
        is_valid: errors.is_empty(),
        minimum_required,
        shortfall,
        errors,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_plus_fees_equals_gross_exactly() {
        for amount in [dec!(0), dec!(1), dec!(999.50), dec!(4000), dec!(2500000)] {
            for method in ["bank_transfer", "gcash"] {
                for tier in [None, Some("silver"), Some("platinum")] {
                    let b = calculate_payout_fees(amount, method, tier);
                    assert_eq!(
                        b.net_amount + b.total_fees,
                        b.gross_amount,
                        "identity broken for amount={amount} method={method} tier={tier:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn fees_are_monotonic_in_amount() {
        let amounts = [
            dec!(0),
            dec!(1000),
            dec!(100000),
            dec!(4000000),
            dec!(10000000),
            dec!(40000000),
        ];
        let mut prev = Decimal::MIN;
        for amount in amounts {
            let b = calculate_payout_fees(amount, "bank_transfer", None);
            assert!(
                b.total_fees >= prev,
                "fees decreased at amount={amount}: {} < {prev}",
                b.total_fees
            );
            prev = b.total_fees;
        }
    }

    #[test]
    fn fees_plateau_at_maximum_clamp() {
        // 0.1% of 25M hits the 25,000 bank-transfer ceiling.
        let at_cap = calculate_payout_fees(dec!(25000000), "bank_transfer", None);
        let past_cap = calculate_payout_fees(dec!(90000000), "bank_transfer", None);
        assert_eq!(at_cap.total_fees, dec!(25000));
        assert_eq!(past_cap.total_fees, dec!(25000));
    }

    #[test]
    fn base_fee_wins_for_small_amounts() {
        // 0.1% of 100,000 = 100 < base 4,000.
        let b = calculate_payout_fees(dec!(100000), "bank_transfer", None);
        assert_eq!(b.total_fees, dec!(4000));
        assert_eq!(b.percentage_fee, dec!(100));
    }

    #[test]
    fn percentage_fee_wins_for_large_amounts() {
        // 0.1% of 10M = 10,000 > base 4,000.
        let b = calculate_payout_fees(dec!(10000000), "bank_transfer", None);
        assert_eq!(b.total_fees, dec!(10000));
    }

    #[test]
    fn tier_discount_reduces_fees_above_the_floor() {
        // Gold: 15% off 10,000 = 8,500, within [4,000, 25,000].
        let b = calculate_payout_fees(dec!(10000000), "bank_transfer", Some("gold"));
        assert_eq!(b.total_fees, dec!(8500));
        assert_eq!(b.tier_multiplier, dec!(0.85));
    }

    #[test]
    fn minimum_fee_absorbs_tier_discount() {
        // Discount applies before the clamp: 15% off the 4,000 base gives
        // 3,400, but the 4,000 floor is re-enforced afterwards.
        let b = calculate_payout_fees(dec!(100000), "bank_transfer", Some("gold"));
        assert_eq!(b.total_fees, dec!(4000));
    }

    #[test]
    fn zero_amount_has_zero_fee_percentage() {
        let b = calculate_payout_fees(dec!(0), "gcash", None);
        assert_eq!(b.fee_percentage, Decimal::ZERO);
        assert_eq!(b.total_fees, dec!(2500));
    }

    #[test]
    fn unknown_method_falls_back_to_bank_transfer() {
        let b = calculate_payout_fees(dec!(100000), "carrier_pigeon", None);
        assert_eq!(b.payment_method, "bank_transfer");
        assert_eq!(b.total_fees, dec!(4000));
    }

    #[test]
    fn batch_totals_sum_individuals() {
        let payouts = vec![
            BatchPayoutInput { amount: dec!(100000), affiliate_tier: None },
            BatchPayoutInput { amount: dec!(10000000), affiliate_tier: Some("gold".into()) },
        ];
        let batch = calculate_batch_fees(&payouts, "bank_transfer");

        assert_eq!(batch.totals.payout_count, 2);
        assert_eq!(batch.totals.total_gross_amount, dec!(10100000));
        assert_eq!(batch.totals.total_fees, dec!(4000) + dec!(8500));
        assert_eq!(
            batch.totals.total_net_amount + batch.totals.total_fees,
            batch.totals.total_gross_amount
        );
    }

    #[test]
    fn batch_average_is_weighted_by_gross() {
        let payouts = vec![
            BatchPayoutInput { amount: dec!(100000), affiliate_tier: None },
            BatchPayoutInput { amount: dec!(10000000), affiliate_tier: None },
        ];
        let batch = calculate_batch_fees(&payouts, "bank_transfer");
        let expected = batch.totals.total_fees / batch.totals.total_gross_amount * dec!(100);
        assert_eq!(batch.totals.average_fee_percentage, expected);
    }

    #[test]
    fn empty_batch_has_zero_average() {
        let batch = calculate_batch_fees(&[], "gcash");
        assert_eq!(batch.totals.average_fee_percentage, Decimal::ZERO);
        assert_eq!(batch.totals.payout_count, 0);
    }

    #[test]
    fn validation_flags_below_minimum() {
        let v = validate_payout_amount(dec!(10000), Some("bronze"), "bank_transfer");
        assert!(!v.is_valid);
        assert_eq!(v.minimum_required, dec!(50000));
        assert_eq!(v.shortfall, Some(dec!(40000)));
        assert!(v.errors.iter().any(|e| e.contains("below minimum")));
    }

    #[test]
    fn validation_flags_non_positive_amount() {
        let v = validate_payout_amount(dec!(0), Some("bronze"), "bank_transfer");
        assert!(v.errors.iter().any(|e| e.contains("must be positive")));
        assert!(v.errors.iter().any(|e| e.contains("fees exceed")));
    }

    #[test]
    fn validation_passes_reasonable_amount() {
        let v = validate_payout_amount(dec!(100000), Some("bronze"), "bank_transfer");
        assert!(v.is_valid, "unexpected errors: {:?}", v.errors);
        assert!(v.shortfall.is_none());
    }
}
