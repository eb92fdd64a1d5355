//! # Session Cart & Pricing
//!
//! The cart is explicit state: handlers load it from a [`SessionStore`],
//! mutate it, and store it back when it reports itself modified. It is a
//! mapping from product id to a quantity/price line, plus at most one
//! applied coupon id. Unit prices are snapshotted when a line is first
//! added and never re-fetched from the catalog.
//!
//! [`SessionStore`]: crate::store::SessionStore

use crate::coupon::{Coupon, CouponBook};
use crate::error::{ShopError, ShopResult};
use crate::product::{Product, ProductCatalog};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cart line: quantity and the price captured at add time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Quantity, always >= 1 while the line exists
    pub quantity: u32,

    /// Unit price snapshot, exact decimal
    pub price: Decimal,
}

/// A cart line enriched with freshly resolved product details.
///
/// `product` is `None` when the catalog no longer resolves the stored id
/// (deleted product still sitting in a saved cart); the line is still
/// priced from its snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    pub total_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

/// Session-scoped shopping cart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Lines keyed by product id; one line per product
    #[serde(default)]
    lines: HashMap<String, CartLine>,

    /// Applied coupon id, re-resolved on every read
    #[serde(default)]
    coupon_id: Option<String>,

    /// Session-dirty flag; not persisted
    #[serde(skip)]
    modified: bool,
}

impl Cart {
    /// Create an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product to the cart or update its quantity.
    ///
    /// When the product is not present, a line is inserted with quantity 0
    /// and the product's current price snapshotted. Then `quantity` either
    /// replaces the existing quantity (`override_quantity`) or is added to
    /// it. A zero quantity is rejected before any state changes.
    pub fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        override_quantity: bool,
    ) -> ShopResult<()> {
        if quantity == 0 {
            return Err(ShopError::Validation(
                "quantity must be a positive integer".to_string(),
            ));
        }

        let line = self
            .lines
            .entry(product.id.clone())
            .or_insert_with(|| CartLine {
                quantity: 0,
                price: product.price,
            });

        if override_quantity {
            line.quantity = quantity;
        } else {
            line.quantity += quantity;
        }
        self.modified = true;
        Ok(())
    }

    /// Remove a product's line. Removing an absent product is a no-op,
    /// not an error, and leaves the cart unmodified.
    pub fn remove(&mut self, product_id: &str) {
        if self.lines.remove(product_id).is_some() {
            self.modified = true;
        }
    }

    /// Iterate enriched line views. Restartable: each call walks the lines
    /// again and re-resolves product details from the catalog.
    pub fn lines<'a>(
        &'a self,
        catalog: &'a ProductCatalog,
    ) -> impl Iterator<Item = CartLineView> + 'a {
        self.lines.iter().map(|(product_id, line)| CartLineView {
            product_id: product_id.clone(),
            quantity: line.quantity,
            price: line.price,
            total_price: line.price * Decimal::from(line.quantity),
            product: catalog.get(product_id).cloned(),
        })
    }

    /// Raw line access (product id -> line), for order snapshotting
    pub fn raw_lines(&self) -> &HashMap<String, CartLine> {
        &self.lines
    }

    /// Total quantity across all lines (not the line count)
    pub fn len(&self) -> u32 {
        self.lines.values().map(|l| l.quantity).sum()
    }

    /// True when the cart holds no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of price x quantity over all lines, exact decimal
    pub fn total_price_before_discount(&self) -> Decimal {
        self.lines
            .values()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum()
    }

    /// Resolve the applied coupon, if any. A stored id that no longer
    /// resolves is treated as no coupon.
    pub fn applied_coupon<'a>(&self, coupons: &'a CouponBook) -> Option<&'a Coupon> {
        self.coupon_id.as_deref().and_then(|id| coupons.get(id))
    }

    /// Discount amount for the resolved coupon: percent / 100 x subtotal
    pub fn discount_amount(&self, coupon: Option<&Coupon>) -> Decimal {
        match coupon {
            Some(c) => {
                self.total_price_before_discount() * Decimal::from(c.discount_percent)
                    / Decimal::from(100)
            }
            None => Decimal::ZERO,
        }
    }

    /// Subtotal minus discount. Never negative: the coupon invariant bounds
    /// the percentage to 0-100.
    pub fn total_price_after_discount(&self, coupon: Option<&Coupon>) -> Decimal {
        self.total_price_before_discount() - self.discount_amount(coupon)
    }

    /// Apply a submitted coupon code against the book at `now`.
    ///
    /// A matching valid coupon stores its id on the cart. No match clears
    /// any previously stored id so the cart never keeps a stale pointer to
    /// a coupon that stopped validating. Returns the resolved coupon id.
    pub fn apply_coupon(
        &mut self,
        coupons: &CouponBook,
        code: &str,
        now: DateTime<Utc>,
    ) -> ShopResult<Option<String>> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ShopError::Validation("coupon code is empty".to_string()));
        }

        self.coupon_id = coupons.find_valid(code, now).map(|c| c.id.clone());
        self.modified = true;
        Ok(self.coupon_id.clone())
    }

    /// Currently stored coupon id, unresolved
    pub fn coupon_id(&self) -> Option<&str> {
        self.coupon_id.as_deref()
    }

    /// Empty all lines and drop the coupon reference
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon_id = None;
        self.modified = true;
    }

    /// Whether the cart changed since it was loaded
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Reset the dirty flag after the session layer persisted the cart
    pub fn mark_clean(&mut self) {
        self.modified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::Coupon;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn catalog() -> ProductCatalog {
        let mut catalog = ProductCatalog::new();
        catalog.add(Product::new("p1", "Inverter", dec!(100.00)));
        catalog.add(Product::new("p2", "Battery", dec!(50.00)));
        catalog
    }

    fn coupon_pct(percent: u8) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c-test".to_string(),
            code: "TEST".to_string(),
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            active: true,
            discount_percent: percent,
        }
    }

    #[test]
    fn test_add_and_override() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let p1 = catalog.get("p1").unwrap();

        cart.add(p1, 2, false).unwrap();
        cart.add(p1, 3, false).unwrap();
        assert_eq!(cart.len(), 5);

        cart.add(p1, 1, true).unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart.is_modified());
    }

    #[test]
    fn test_zero_quantity_rejected_before_mutation() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let err = cart.add(catalog.get("p1").unwrap(), 0, false).unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
        assert!(cart.is_empty());
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_price_snapshot_survives_catalog_change() {
        let mut catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("p1").unwrap(), 1, false).unwrap();

        // Catalog price changes after the line was added
        catalog.products[0].price = dec!(999.00);

        assert_eq!(cart.total_price_before_discount(), dec!(100.00));
    }

    #[test]
    fn test_length_is_quantity_sum() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("p1").unwrap(), 2, false).unwrap();
        cart.add(catalog.get("p2").unwrap(), 3, false).unwrap();

        assert_eq!(cart.len(), 5);
        assert_eq!(cart.lines(&catalog).count(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.remove("never-added");
        assert!(cart.is_empty());
        assert!(!cart.is_modified());
    }

    #[test]
    fn test_lines_degrade_when_product_deleted() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("p1").unwrap(), 2, false).unwrap();

        // Product disappears from the catalog, line survives on its snapshot
        let empty = ProductCatalog::new();
        let views: Vec<_> = cart.lines(&empty).collect();
        assert_eq!(views.len(), 1);
        assert!(views[0].product.is_none());
        assert_eq!(views[0].total_price, dec!(200.00));

        // Restartable: a second pass yields the same lines
        assert_eq!(cart.lines(&empty).count(), 1);
    }

    #[test]
    fn test_exact_discount_arithmetic() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("p1").unwrap(), 2, false).unwrap(); // 200.00

        let coupon = coupon_pct(25);
        assert_eq!(cart.total_price_before_discount(), dec!(200.00));
        assert_eq!(cart.discount_amount(Some(&coupon)), dec!(50.00));
        assert_eq!(cart.total_price_after_discount(Some(&coupon)), dec!(150.00));
    }

    #[test]
    fn test_discount_bounds() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("p2").unwrap(), 3, false).unwrap();

        for percent in [0u8, 1, 50, 99, 100] {
            let coupon = coupon_pct(percent);
            let after = cart.total_price_after_discount(Some(&coupon));
            assert!(after >= Decimal::ZERO);
            assert!(after <= cart.total_price_before_discount());
        }
        assert_eq!(cart.discount_amount(None), Decimal::ZERO);
    }

    #[test]
    fn test_apply_coupon_and_revocation() {
        let mut book = CouponBook::new();
        book.add(coupon_pct(25));

        let mut cart = Cart::new();
        let now = Utc::now();

        let applied = cart.apply_coupon(&book, "test", now).unwrap();
        assert_eq!(applied.as_deref(), Some("c-test"));
        assert!(cart.applied_coupon(&book).is_some());

        // An invalid code clears the stored id instead of leaving it stale
        let applied = cart.apply_coupon(&book, "NOPE", now).unwrap();
        assert!(applied.is_none());
        assert!(cart.applied_coupon(&book).is_none());
    }

    #[test]
    fn test_apply_empty_code_is_validation_error() {
        let book = CouponBook::new();
        let mut cart = Cart::new();
        assert!(matches!(
            cart.apply_coupon(&book, "   ", Utc::now()),
            Err(ShopError::Validation(_))
        ));
    }

    #[test]
    fn test_deleted_coupon_tolerated_silently() {
        let mut book = CouponBook::new();
        book.add(coupon_pct(25));

        let mut cart = Cart::new();
        cart.apply_coupon(&book, "TEST", Utc::now()).unwrap();

        // Coupon deleted from the book after being applied
        let empty = CouponBook::new();
        assert!(cart.applied_coupon(&empty).is_none());
        assert_eq!(
            cart.discount_amount(cart.applied_coupon(&empty)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_clear_behaves_as_fresh() {
        let catalog = catalog();
        let mut book = CouponBook::new();
        book.add(coupon_pct(10));

        let mut cart = Cart::new();
        cart.add(catalog.get("p1").unwrap(), 2, false).unwrap();
        cart.apply_coupon(&book, "TEST", Utc::now()).unwrap();

        cart.clear();
        assert_eq!(cart.len(), 0);
        assert!(cart.lines(&catalog).next().is_none());
        assert!(cart.coupon_id().is_none());
        assert_eq!(cart.total_price_before_discount(), Decimal::ZERO);
    }

    #[test]
    fn test_session_roundtrip_drops_dirty_flag() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.get("p1").unwrap(), 2, false).unwrap();
        assert!(cart.is_modified());

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert!(!restored.is_modified());
        assert_eq!(restored.len(), 2);
    }
}
