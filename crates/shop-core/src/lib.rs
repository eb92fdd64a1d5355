//! # shop-core
//!
//! Core types and traits for the voltshop storefront.
//!
//! This crate provides:
//! - `Cart` and `CartLine` for the session-backed cart & pricing engine
//! - `Product` and `ProductCatalog` for the catalog read side
//! - `Coupon` and `CouponBook` for time-bounded percentage discounts
//! - `Order`, `OrderItem`, and `PaymentState` for checkout and payment
//! - `SessionStore` / `OrderRepository` storage seams with in-memory impls
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Cart, CouponBook, ProductCatalog};
//!
//! // Load a session cart, mutate it, store it back
//! let mut cart = sessions.load(&session_id).await?;
//! let product = catalog.get("deye-sun-12k").unwrap();
//! cart.add(product, 2, false)?;
//!
//! // Pricing re-resolves the coupon on every read
//! let coupon = cart.applied_coupon(&coupons);
//! let total = cart.total_price_after_discount(coupon);
//!
//! if cart.is_modified() {
//!     sessions.store(&session_id, &cart).await?;
//! }
//! ```

pub mod cart;
pub mod coupon;
pub mod error;
pub mod order;
pub mod product;
pub mod store;

// Re-exports for convenience
pub use cart::{Cart, CartLine, CartLineView};
pub use coupon::{Coupon, CouponBook};
pub use error::{ShopError, ShopResult};
pub use order::{CustomerDetails, Order, OrderDraft, OrderItem, PaymentState};
pub use product::{Product, ProductCatalog};
pub use store::{
    MemoryOrderRepository, MemorySessionStore, OrderRepository, SessionStore,
    SharedOrderRepository, SharedSessionStore,
};
