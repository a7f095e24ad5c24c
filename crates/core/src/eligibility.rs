//! Monthly payout eligibility rules.
//!
//! Pure partition logic: given per-affiliate totals and payout credentials,
//! split affiliates into those paid this run and those whose balance rolls
//! over, accumulating every failing rule (not just the first) for the
//! ineligible side.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::program::ProgramSettings;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Payout methods and credentials
// ---------------------------------------------------------------------------

/// A disbursement channel the program can pay through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    BankTransfer,
    Gcash,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::Gcash => "gcash",
        }
    }

    /// Human-readable name used in rejection reasons and notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BankTransfer => "Bank account",
            Self::Gcash => "GCash",
        }
    }
}

/// An affiliate's stored payout credentials across both channels.
#[derive(Debug, Clone, Default)]
pub struct PayoutCredentials {
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_verified: bool,
    pub gcash_number: Option<String>,
    pub gcash_name: Option<String>,
    pub gcash_verified: bool,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl PayoutCredentials {
    /// Bank details are complete: holder name, account number, and bank.
    pub fn has_bank(&self) -> bool {
        present(&self.account_holder_name)
            && present(&self.account_number)
            && present(&self.bank_name)
    }

    /// E-wallet details are complete: number and registered name.
    pub fn has_gcash(&self) -> bool {
        present(&self.gcash_number) && present(&self.gcash_name)
    }
}

/// The usable payout method chosen for an affiliate, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSelection {
    pub method: Option<PayoutMethod>,
    pub has_payment_details: bool,
    /// True when the chosen method is verified or verification is not
    /// required for it. Meaningless when `method` is `None`.
    pub is_verified: bool,
}

/// Pick the payout method for an affiliate: bank transfer when complete and
/// enabled, else GCash when complete and enabled.
pub fn select_payout_method(
    credentials: &PayoutCredentials,
    settings: &ProgramSettings,
) -> MethodSelection {
    if credentials.has_bank() && settings.method_enabled(PayoutMethod::BankTransfer.as_str()) {
        return MethodSelection {
            method: Some(PayoutMethod::BankTransfer),
            has_payment_details: true,
            is_verified: if settings.require_verification_for_bank_transfer {
                credentials.bank_account_verified
            } else {
                true
            },
        };
    }
    if credentials.has_gcash() && settings.method_enabled(PayoutMethod::Gcash.as_str()) {
        return MethodSelection {
            method: Some(PayoutMethod::Gcash),
            has_payment_details: true,
            is_verified: if settings.require_verification_for_gcash {
                credentials.gcash_verified
            } else {
                true
            },
        };
    }
    MethodSelection {
        method: None,
        has_payment_details: false,
        is_verified: false,
    }
}

// ---------------------------------------------------------------------------
// Eligibility evaluation
// ---------------------------------------------------------------------------

/// Collect every independently-failing eligibility rule for an affiliate.
///
/// An empty result means the affiliate is eligible.
pub fn rejection_reasons(
    total_amount: Decimal,
    selection: &MethodSelection,
    settings: &ProgramSettings,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if total_amount < settings.min_payout_threshold {
        reasons.push(format!(
            "Amount \u{20b1}{total_amount:.2} below minimum threshold of \u{20b1}{}",
            settings.min_payout_threshold
        ));
    }

    if !selection.has_payment_details {
        reasons.push("Missing payment details (bank account or GCash)".to_owned());
    }

    if let Some(method) = selection.method {
        if !selection.is_verified {
            reasons.push(format!("{} not verified", method.display_name()));
        }
    } else {
        reasons.push("No enabled payment method available".to_owned());
    }

    reasons
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// One affiliate's aggregated cleared-and-unbatched conversions for the
/// period, assembled by the caller from the database rows.
#[derive(Debug, Clone)]
pub struct AffiliateGroup {
    pub affiliate_id: DbId,
    pub affiliate_name: String,
    pub affiliate_email: String,
    pub total_amount: Decimal,
    pub conversion_count: i64,
    pub credentials: PayoutCredentials,
}

/// An affiliate included in this run.
#[derive(Debug, Clone, Serialize)]
pub struct EligibleAffiliate {
    pub affiliate_id: DbId,
    pub affiliate_name: String,
    pub affiliate_email: String,
    pub total_cleared: Decimal,
    pub conversion_count: i64,
    pub has_payment_details: bool,
    pub is_verified: bool,
    pub payout_method: PayoutMethod,
    pub estimated_payout: Decimal,
    pub fee_amount: Decimal,
    pub net_amount: Decimal,
}

/// An affiliate whose balance rolls over to the next period.
#[derive(Debug, Clone, Serialize)]
pub struct IneligibleAffiliate {
    pub affiliate_id: DbId,
    pub affiliate_name: String,
    pub affiliate_email: String,
    pub total_cleared: Decimal,
    pub conversion_count: i64,
    pub rejection_reasons: Vec<String>,
    pub rollover_amount: Decimal,
    pub estimated_next_payout_date: String,
}

/// Result of partitioning one period's affiliate groups.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewPartition {
    pub eligible: Vec<EligibleAffiliate>,
    pub ineligible: Vec<IneligibleAffiliate>,
    pub total_payout_amount: Decimal,
    pub total_fee_amount: Decimal,
    pub total_rollover_amount: Decimal,
}

/// Partition affiliate groups into eligible and ineligible sides.
///
/// Every group lands in exactly one side. The preview fee breakdown uses the
/// flat configured rate; per-channel fees apply only when a batch is
/// actually created.
pub fn partition(
    groups: Vec<AffiliateGroup>,
    settings: &ProgramSettings,
    next_payout_date: &str,
) -> PreviewPartition {
    let mut eligible = Vec::new();
    let mut ineligible = Vec::new();
    let mut total_payout_amount = Decimal::ZERO;
    let mut total_fee_amount = Decimal::ZERO;
    let mut total_rollover_amount = Decimal::ZERO;

    for group in groups {
        let selection = select_payout_method(&group.credentials, settings);
        let reasons = rejection_reasons(group.total_amount, &selection, settings);

        if reasons.is_empty() {
            let fee_amount = (group.total_amount * settings.preview_fee_rate).round_dp(2);
            let net_amount = group.total_amount - fee_amount;
            total_payout_amount += group.total_amount;
            total_fee_amount += fee_amount;

            eligible.push(EligibleAffiliate {
                affiliate_id: group.affiliate_id,
                affiliate_name: group.affiliate_name,
                affiliate_email: group.affiliate_email,
                total_cleared: group.total_amount,
                conversion_count: group.conversion_count,
                has_payment_details: selection.has_payment_details,
                is_verified: selection.is_verified,
                payout_method: selection.method.expect("eligible implies a usable method"),
                estimated_payout: group.total_amount,
                fee_amount,
                net_amount,
            });
        } else {
            total_rollover_amount += group.total_amount;

            ineligible.push(IneligibleAffiliate {
                affiliate_id: group.affiliate_id,
                affiliate_name: group.affiliate_name,
                affiliate_email: group.affiliate_email,
                total_cleared: group.total_amount,
                conversion_count: group.conversion_count,
                rejection_reasons: reasons,
                rollover_amount: group.total_amount,
                estimated_next_payout_date: next_payout_date.to_owned(),
            });
        }
    }

    PreviewPartition {
        eligible,
        ineligible,
        total_payout_amount,
        total_fee_amount,
        total_rollover_amount,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> ProgramSettings {
        ProgramSettings {
            enabled_payout_methods: vec!["bank_transfer".to_owned(), "gcash".to_owned()],
            ..ProgramSettings::default()
        }
    }

    fn bank_credentials(verified: bool) -> PayoutCredentials {
        PayoutCredentials {
            account_holder_name: Some("Maria Santos".to_owned()),
            account_number: Some("0012345678".to_owned()),
            bank_name: Some("BDO".to_owned()),
            bank_account_verified: verified,
            ..PayoutCredentials::default()
        }
    }

    fn gcash_credentials(verified: bool) -> PayoutCredentials {
        PayoutCredentials {
            gcash_number: Some("09171234567".to_owned()),
            gcash_name: Some("Maria Santos".to_owned()),
            gcash_verified: verified,
            ..PayoutCredentials::default()
        }
    }

    fn group(total: Decimal, credentials: PayoutCredentials) -> AffiliateGroup {
        AffiliateGroup {
            affiliate_id: 1,
            affiliate_name: "Maria Santos".to_owned(),
            affiliate_email: "maria@example.com".to_owned(),
            total_amount: total,
            conversion_count: 3,
            credentials,
        }
    }

    #[test]
    fn bank_is_preferred_over_gcash() {
        let creds = PayoutCredentials {
            gcash_number: Some("09171234567".to_owned()),
            gcash_name: Some("Maria Santos".to_owned()),
            ..bank_credentials(true)
        };
        let sel = select_payout_method(&creds, &settings());
        assert_eq!(sel.method, Some(PayoutMethod::BankTransfer));
    }

    #[test]
    fn disabled_bank_falls_through_to_gcash() {
        let mut s = settings();
        s.enabled_payout_methods = vec!["gcash".to_owned()];
        let creds = PayoutCredentials {
            gcash_number: Some("09171234567".to_owned()),
            gcash_name: Some("Maria Santos".to_owned()),
            gcash_verified: true,
            ..bank_credentials(true)
        };
        let sel = select_payout_method(&creds, &s);
        assert_eq!(sel.method, Some(PayoutMethod::Gcash));
    }

    #[test]
    fn incomplete_bank_details_do_not_count() {
        let creds = PayoutCredentials {
            account_holder_name: Some("Maria Santos".to_owned()),
            account_number: Some("  ".to_owned()),
            bank_name: Some("BDO".to_owned()),
            ..PayoutCredentials::default()
        };
        assert!(!creds.has_bank());
        let sel = select_payout_method(&creds, &settings());
        assert_eq!(sel.method, None);
        assert!(!sel.has_payment_details);
    }

    #[test]
    fn unverified_bank_counts_as_unverified_when_required() {
        let sel = select_payout_method(&bank_credentials(false), &settings());
        assert_eq!(sel.method, Some(PayoutMethod::BankTransfer));
        assert!(!sel.is_verified);
    }

    #[test]
    fn gcash_verification_not_required_by_default() {
        let sel = select_payout_method(&gcash_credentials(false), &settings());
        assert_eq!(sel.method, Some(PayoutMethod::Gcash));
        assert!(sel.is_verified);
    }

    #[test]
    fn eligible_affiliate_gets_fee_breakdown() {
        // Scenario: ₱3,000 cleared, verified bank, ₱2,000 threshold, 2% rate.
        let p = partition(
            vec![group(dec!(3000), bank_credentials(true))],
            &settings(),
            "2024-02-05",
        );
        assert_eq!(p.ineligible.len(), 0);
        let e = &p.eligible[0];
        assert_eq!(e.estimated_payout, dec!(3000));
        assert_eq!(e.fee_amount, dec!(60.00));
        assert_eq!(e.net_amount, dec!(2940.00));
        assert_eq!(e.payout_method, PayoutMethod::BankTransfer);
    }

    #[test]
    fn ineligible_affiliate_accumulates_all_reasons() {
        // Scenario: ₱1,500 (below ₱2,000) and no payment method at all.
        let p = partition(
            vec![group(dec!(1500), PayoutCredentials::default())],
            &settings(),
            "2024-02-05",
        );
        assert_eq!(p.eligible.len(), 0);
        let i = &p.ineligible[0];
        assert_eq!(i.rollover_amount, dec!(1500));
        assert_eq!(i.rejection_reasons.len(), 3);
        assert!(i.rejection_reasons[0].contains("below minimum threshold"));
        assert!(i.rejection_reasons[1].contains("Missing payment details"));
        assert!(i.rejection_reasons[2].contains("No enabled payment method"));
    }

    #[test]
    fn unverified_method_is_its_own_reason() {
        let p = partition(
            vec![group(dec!(3000), bank_credentials(false))],
            &settings(),
            "2024-02-05",
        );
        let i = &p.ineligible[0];
        assert_eq!(i.rejection_reasons, vec!["Bank account not verified".to_owned()]);
    }

    #[test]
    fn every_group_lands_in_exactly_one_side() {
        let groups = vec![
            group(dec!(3000), bank_credentials(true)),
            group(dec!(1500), PayoutCredentials::default()),
            group(dec!(5000), gcash_credentials(true)),
            group(dec!(100), bank_credentials(true)),
        ];
        let n = groups.len();
        let p = partition(groups, &settings(), "2024-02-05");
        assert_eq!(p.eligible.len() + p.ineligible.len(), n);
    }

    #[test]
    fn totals_track_both_sides() {
        let p = partition(
            vec![
                group(dec!(3000), bank_credentials(true)),
                group(dec!(1500), PayoutCredentials::default()),
            ],
            &settings(),
            "2024-02-05",
        );
        assert_eq!(p.total_payout_amount, dec!(3000));
        assert_eq!(p.total_fee_amount, dec!(60.00));
        assert_eq!(p.total_rollover_amount, dec!(1500));
    }
}
