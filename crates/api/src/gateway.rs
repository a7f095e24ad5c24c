//! Disbursement gateway HTTP client.
//!
//! Thin typed wrapper over the gateway's REST API: create a disbursement,
//! fetch one back by our reference. Authentication is HTTP basic with the
//! secret key as username and an empty password.

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;

/// Request body for `POST /disbursements`.
#[derive(Debug, Clone, Serialize)]
pub struct DisbursementRequest {
    /// Our unique payout reference; the gateway echoes it back in webhooks.
    pub reference_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub channel_code: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A disbursement as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct DisbursementResponse {
    pub id: String,
    pub reference_id: String,
    pub amount: Decimal,
    pub status: String,
    #[serde(default)]
    pub channel_code: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub failure_code: Option<String>,
}

/// Structured error body the gateway returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error_code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway error {error_code}: {message}")]
    Api { error_code: String, message: String },

    #[error("Gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client for the disbursement gateway.
pub struct DisbursementClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DisbursementClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    /// Submit one disbursement to the gateway.
    pub async fn create_disbursement(
        &self,
        request: &DisbursementRequest,
    ) -> Result<DisbursementResponse, GatewayError> {
        let url = format!("{}/disbursements", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.api_key, Some(""))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch a disbursement by our reference, if the gateway knows it.
    pub async fn get_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Option<DisbursementResponse>, GatewayError> {
        let url = format!("{}/disbursements", self.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.api_key, Some(""))
            .query(&[("reference_id", reference_id)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse_response(response).await.map(Some)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }

        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => Err(GatewayError::Api {
                error_code: body.error_code,
                message: body.message,
            }),
            Err(_) => Err(GatewayError::Api {
                error_code: format!("HTTP_{}", status.as_u16()),
                message: "Gateway returned an unparseable error response".to_owned(),
            }),
        }
    }
}
