//! Best-effort payout notification emails.
//!
//! Sends a template name and variable map to the transactional email
//! provider. Every failure is logged and swallowed: notifications fire
//! after the core state change has persisted and must never surface as an
//! operation failure.

use rust_decimal::Decimal;
use serde_json::json;

use crate::config::EmailConfig;

const TEMPLATE_PAYOUT_PROCESSING: &str = "payout_processing";
const TEMPLATE_PAYOUT_SUCCESS: &str = "payout_success";
const TEMPLATE_PAYOUT_FAILED: &str = "payout_failed";

/// Transactional email sender. With no `api_url` configured, sends become
/// logged no-ops (local development, tests).
pub struct EmailClient {
    http: reqwest::Client,
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Deliver one templated email; log and swallow any failure.
    async fn send(&self, template: &str, to: &str, variables: serde_json::Value) {
        let Some(api_url) = self.config.api_url.as_deref() else {
            tracing::debug!(template, to, "Email sending disabled, skipping notification");
            return;
        };

        let body = json!({
            "from": self.config.from_address,
            "to": to,
            "template": template,
            "variables": variables,
        });

        let result = self
            .http
            .post(api_url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(template, to, "Notification email sent");
            }
            Ok(response) => {
                tracing::warn!(
                    template,
                    to,
                    status = %response.status(),
                    "Email provider rejected notification"
                );
            }
            Err(e) => {
                tracing::warn!(template, to, error = %e, "Failed to send notification email");
            }
        }
    }

    /// The gateway accepted the disbursement and funds are in flight.
    pub async fn payout_processing(
        &self,
        to: &str,
        affiliate_name: &str,
        amount: Decimal,
        payout_method: &str,
    ) {
        self.send(
            TEMPLATE_PAYOUT_PROCESSING,
            to,
            json!({
                "affiliate_name": affiliate_name,
                "amount": amount,
                "payout_method": payout_method,
            }),
        )
        .await;
    }

    /// The disbursement reached the affiliate.
    pub async fn payout_success(
        &self,
        to: &str,
        affiliate_name: &str,
        amount: Decimal,
        payout_method: &str,
        reference: &str,
    ) {
        self.send(
            TEMPLATE_PAYOUT_SUCCESS,
            to,
            json!({
                "affiliate_name": affiliate_name,
                "amount": amount,
                "payout_method": payout_method,
                "reference": reference,
            }),
        )
        .await;
    }

    /// The disbursement failed; the balance will be retried.
    pub async fn payout_failed(
        &self,
        to: &str,
        affiliate_name: &str,
        amount: Decimal,
        failure_reason: &str,
    ) {
        self.send(
            TEMPLATE_PAYOUT_FAILED,
            to,
            json!({
                "affiliate_name": affiliate_name,
                "amount": amount,
                "failure_reason": failure_reason,
            }),
        )
        .await;
    }
}
