/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development except
/// the webhook callback token, which defaults to empty and therefore
/// rejects every callback until configured.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shared secret the gateway sends in `x-callback-token`.
    pub webhook_callback_token: String,
    /// Disbursement gateway API settings.
    pub gateway: GatewayConfig,
    /// Transactional email provider settings.
    pub email: EmailConfig,
}

/// Disbursement gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Secret API key, used as the basic-auth username.
    pub api_key: String,
    pub base_url: String,
    /// Currency code sent on disbursement requests.
    pub currency: String,
}

/// Transactional email provider settings. An unset URL disables sending;
/// notification calls become logged no-ops.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: Option<String>,
    pub api_token: String,
    pub from_address: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `WEBHOOK_CALLBACK_TOKEN` | empty (reject all)      |
    /// | `GATEWAY_API_KEY`        | empty                   |
    /// | `GATEWAY_BASE_URL`       | `https://api.gateway.test` |
    /// | `GATEWAY_CURRENCY`       | `PHP`                   |
    /// | `EMAIL_API_URL`          | unset (sending disabled)|
    /// | `EMAIL_API_TOKEN`        | empty                   |
    /// | `EMAIL_FROM`             | `payouts@example.com`   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let webhook_callback_token =
            std::env::var("WEBHOOK_CALLBACK_TOKEN").unwrap_or_default();

        let gateway = GatewayConfig {
            api_key: std::env::var("GATEWAY_API_KEY").unwrap_or_default(),
            base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.gateway.test".into()),
            currency: std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "PHP".into()),
        };

        let email = EmailConfig {
            api_url: std::env::var("EMAIL_API_URL").ok(),
            api_token: std::env::var("EMAIL_API_TOKEN").unwrap_or_default(),
            from_address: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "payouts@example.com".into()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            webhook_callback_token,
            gateway,
            email,
        }
    }
}
