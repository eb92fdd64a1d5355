//! # Purchase-Affinity Recommender
//!
//! Keeps one Redis sorted set per product, `product:{id}:purchased_with`,
//! scoring how often other products were bought in the same order. Scores
//! are bumped with `ZINCRBY` — the store's native atomic increment — so
//! concurrent purchases writing the same pair never lose updates.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use shop_core::{ShopError, ShopResult};
use tracing::{debug, instrument};

/// Redis-backed product recommender
#[derive(Clone)]
pub struct Recommender {
    conn: ConnectionManager,
}

impl Recommender {
    /// Connect to Redis
    pub async fn connect(redis_url: &str) -> ShopResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| ShopError::Configuration(format!("invalid REDIS_URL: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ShopError::Storage(format!("redis connect: {}", e)))?;
        Ok(Self { conn })
    }

    fn product_key(product_id: &str) -> String {
        format!("product:{}:purchased_with", product_id)
    }

    /// Record that these products were bought together: every ordered pair
    /// of distinct ids gets its affinity score incremented by one.
    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    pub async fn products_bought(&self, product_ids: &[String]) -> ShopResult<()> {
        let mut conn = self.conn.clone();
        for product_id in product_ids {
            for with_id in product_ids {
                if product_id != with_id {
                    let _: f64 = conn
                        .zincr(Self::product_key(product_id), with_id, 1)
                        .await
                        .map_err(|e| ShopError::Storage(format!("zincrby: {}", e)))?;
                }
            }
        }
        debug!("Recorded purchase affinity for {} products", product_ids.len());
        Ok(())
    }

    /// Top companion products for one product, best-scoring first
    pub async fn suggest_for(&self, product_id: &str, max: usize) -> ShopResult<Vec<String>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let suggestions: Vec<String> = conn
            .zrevrange(Self::product_key(product_id), 0, max as isize - 1)
            .await
            .map_err(|e| ShopError::Storage(format!("zrevrange: {}", e)))?;
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_key_shape() {
        assert_eq!(
            Recommender::product_key("deye-sun-12k"),
            "product:deye-sun-12k:purchased_with"
        );
    }
}
