//! # Coupon Types
//!
//! Time-bounded percentage-discount codes.
//! The coupon book is loaded from `config/coupons.toml` and consumed
//! read-only: a cart stores only the coupon id and re-resolves it on
//! every read, so a deleted coupon silently stops applying.

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A percentage-discount coupon with a validity window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique coupon identifier
    pub id: String,

    /// Code customers type in (matched case-insensitively)
    pub code: String,

    /// Start of the validity window (inclusive)
    pub valid_from: DateTime<Utc>,

    /// End of the validity window (inclusive)
    pub valid_to: DateTime<Utc>,

    /// Whether the coupon can currently be applied
    #[serde(default = "default_true")]
    pub active: bool,

    /// Discount percentage, 0-100 inclusive
    pub discount_percent: u8,
}

fn default_true() -> bool {
    true
}

impl Coupon {
    /// Check the window and active flag against a point in time
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.valid_from <= now && now <= self.valid_to
    }
}

/// The set of known coupons (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponBook {
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

impl CouponBook {
    /// Create an empty coupon book
    pub fn new() -> Self {
        Self {
            coupons: Vec::new(),
        }
    }

    /// Add a coupon
    pub fn add(&mut self, coupon: Coupon) {
        self.coupons.push(coupon);
    }

    /// Resolve an applied coupon id. Returns `None` when the id no longer
    /// resolves; carts tolerate that silently.
    pub fn get(&self, id: &str) -> Option<&Coupon> {
        self.coupons.iter().find(|c| c.id == id)
    }

    /// Find a coupon matching a submitted code: case-insensitive match,
    /// active, and `now` inside the validity window.
    pub fn find_valid(&self, code: &str, now: DateTime<Utc>) -> Option<&Coupon> {
        self.coupons
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code) && c.is_valid_at(now))
    }

    /// Load the coupon book from TOML, rejecting out-of-range discounts.
    pub fn from_toml(toml_str: &str) -> ShopResult<Self> {
        let book: CouponBook = toml::from_str(toml_str)
            .map_err(|e| ShopError::Configuration(format!("invalid coupon config: {}", e)))?;

        for coupon in &book.coupons {
            if coupon.discount_percent > 100 {
                return Err(ShopError::Configuration(format!(
                    "coupon {} has discount_percent {} (must be 0-100)",
                    coupon.id, coupon.discount_percent
                )));
            }
            if coupon.valid_from > coupon.valid_to {
                return Err(ShopError::Configuration(format!(
                    "coupon {} has an empty validity window",
                    coupon.id
                )));
            }
        }

        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(code: &str, percent: u8) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: format!("c-{}", code.to_lowercase()),
            code: code.to_string(),
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            active: true,
            discount_percent: percent,
        }
    }

    #[test]
    fn test_find_valid_case_insensitive() {
        let mut book = CouponBook::new();
        book.add(coupon("SUMMER25", 25));

        let now = Utc::now();
        assert!(book.find_valid("summer25", now).is_some());
        assert!(book.find_valid("SuMmEr25", now).is_some());
        assert!(book.find_valid("WINTER", now).is_none());
    }

    #[test]
    fn test_window_and_active_flag() {
        let mut expired = coupon("OLD10", 10);
        expired.valid_to = Utc::now() - Duration::hours(1);

        let mut inactive = coupon("OFF15", 15);
        inactive.active = false;

        let mut book = CouponBook::new();
        book.add(expired);
        book.add(inactive);

        let now = Utc::now();
        assert!(book.find_valid("OLD10", now).is_none());
        assert!(book.find_valid("OFF15", now).is_none());
    }

    #[test]
    fn test_from_toml_rejects_out_of_range_discount() {
        let toml_str = r#"
            [[coupons]]
            id = "c-bogus"
            code = "BOGUS"
            valid_from = "2026-01-01T00:00:00Z"
            valid_to = "2026-12-31T23:59:59Z"
            discount_percent = 120
        "#;

        assert!(matches!(
            CouponBook::from_toml(toml_str),
            Err(ShopError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_toml_valid() {
        let toml_str = r#"
            [[coupons]]
            id = "c-summer25"
            code = "SUMMER25"
            valid_from = "2026-06-01T00:00:00Z"
            valid_to = "2026-08-31T23:59:59Z"
            discount_percent = 25
        "#;

        let book = CouponBook::from_toml(toml_str).unwrap();
        assert_eq!(book.get("c-summer25").unwrap().discount_percent, 25);
    }
}
