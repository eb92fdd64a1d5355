//! # Application State
//!
//! Shared state for the Axum application: catalog, coupon book, storage
//! seams, the gateway client, the notifier, and the optional recommender.

use crate::notify::{LoggingNotifier, OrderNotifier};
use crate::recommend::Recommender;
use shop_core::{
    CouponBook, MemoryOrderRepository, MemorySessionStore, ProductCatalog,
    SharedOrderRepository, SharedSessionStore,
};
use shop_gateway::InvoiceClient;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// ISO currency code invoices are issued in
    pub currency: String,
    /// Redis connection string; the recommender is disabled when unset
    pub redis_url: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            currency: std::env::var("SHOP_CURRENCY").unwrap_or_else(|_| "UAH".to_string()),
            redis_url: std::env::var("REDIS_URL").ok(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Product catalog (read-only after startup)
    pub catalog: Arc<ProductCatalog>,
    /// Coupon book (read-only after startup)
    pub coupons: Arc<CouponBook>,
    /// Per-session cart storage
    pub sessions: SharedSessionStore,
    /// Order persistence
    pub orders: SharedOrderRepository,
    /// Invoicing gateway client
    pub gateway: Arc<InvoiceClient>,
    /// Order lifecycle notifications
    pub notifier: Arc<dyn OrderNotifier>,
    /// Purchase-affinity recommender, present when Redis is configured
    pub recommender: Option<Recommender>,
}

impl AppState {
    /// Create the production AppState: config files, env-configured
    /// gateway, in-memory stores, and Redis-backed recommender if
    /// `REDIS_URL` is set.
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let catalog = load_product_catalog()?;
        let coupons = load_coupon_book()?;

        let gateway = InvoiceClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize gateway client: {}", e))?;

        let recommender = match &config.redis_url {
            Some(url) => Some(Recommender::connect(url).await.map_err(|e| {
                anyhow::anyhow!("Failed to connect recommender to Redis: {}", e)
            })?),
            None => {
                tracing::warn!("REDIS_URL not set, recommender disabled");
                None
            }
        };

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            coupons: Arc::new(coupons),
            sessions: Arc::new(MemorySessionStore::new()),
            orders: Arc::new(MemoryOrderRepository::new()),
            gateway: Arc::new(gateway),
            notifier: Arc::new(LoggingNotifier),
            recommender,
        })
    }
}

/// Load the product catalog from a config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}

/// Load the coupon book from a config file
fn load_coupon_book() -> anyhow::Result<CouponBook> {
    let config_paths = [
        "config/coupons.toml",
        "../config/coupons.toml",
        "../../config/coupons.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let book = CouponBook::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} coupons from {}", book.coupons.len(), path);
            return Ok(book);
        }
    }

    tracing::warn!("No coupon config found, using empty coupon book");
    Ok(CouponBook::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("SHOP_CURRENCY");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.currency, "UAH");
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
            currency: "UAH".to_string(),
            redis_url: None,
        };

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
    }
}
