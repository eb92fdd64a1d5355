//! # shop-api
//!
//! HTTP API layer for the voltshop storefront.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for the catalog, session carts, coupons and orders
//! - Payment endpoints backed by the invoicing gateway client
//! - The gateway's signed transaction callback handler
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/cart` | Cart contents |
//! | POST | `/api/v1/cart/add` | Add to cart |
//! | POST | `/api/v1/coupon/apply` | Apply coupon |
//! | POST | `/api/v1/orders` | Create order |
//! | POST | `/api/v1/payment/process` | Create invoice |
//! | POST | `/webhook/invoice` | Gateway callback |

pub mod handlers;
pub mod notify;
pub mod recommend;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
