//! # Gateway Configuration
//!
//! Configuration for the invoicing gateway. All secrets are loaded from
//! environment variables and the secret key never leaves this crate: it is
//! masked in `Debug` output and only consumed by the signing code.

use shop_core::{ShopError, ShopResult};
use std::env;

/// Default production endpoint of the invoicing API
pub const DEFAULT_API_URL: &str = "https://api.wayforpay.com/api";

/// Invoicing gateway configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// Pre-shared secret key used for HMAC signatures
    pub(crate) secret_key: String,

    /// Merchant account login
    pub merchant_account: String,

    /// Merchant domain name, part of the invoice signature
    pub domain_name: String,

    /// API endpoint (overridable for testing/mocking)
    pub api_url: String,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GATEWAY_SECRET_KEY`
    /// - `GATEWAY_MERCHANT_ACCOUNT`
    /// - `GATEWAY_DOMAIN`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("GATEWAY_SECRET_KEY")
            .map_err(|_| ShopError::Configuration("GATEWAY_SECRET_KEY not set".to_string()))?;

        let merchant_account = env::var("GATEWAY_MERCHANT_ACCOUNT").map_err(|_| {
            ShopError::Configuration("GATEWAY_MERCHANT_ACCOUNT not set".to_string())
        })?;

        let domain_name = env::var("GATEWAY_DOMAIN")
            .map_err(|_| ShopError::Configuration("GATEWAY_DOMAIN not set".to_string()))?;

        if secret_key.trim().is_empty() {
            return Err(ShopError::Configuration(
                "GATEWAY_SECRET_KEY is empty".to_string(),
            ));
        }

        Ok(Self {
            secret_key,
            merchant_account,
            domain_name,
            api_url: env::var("GATEWAY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        secret_key: impl Into<String>,
        merchant_account: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            merchant_account: merchant_account.into(),
            domain_name: domain_name.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Builder: set custom API endpoint (for testing)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("secret_key", &"***")
            .field("merchant_account", &self.merchant_account)
            .field("domain_name", &self.domain_name)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config() {
        let config = GatewayConfig::new("s3cret", "m1", "shop.example");
        assert_eq!(config.merchant_account, "m1");
        assert_eq!(config.domain_name, "shop.example");
        assert_eq!(config.api_url, DEFAULT_API_URL);

        let config = config.with_api_url("http://127.0.0.1:9999/api");
        assert_eq!(config.api_url, "http://127.0.0.1:9999/api");
    }

    #[test]
    fn test_debug_masks_secret() {
        let config = GatewayConfig::new("super-secret-key", "m1", "shop.example");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-key"));
        assert!(rendered.contains("***"));
    }
}
