//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog:
///   - GET  /api/v1/products - List available products
///   - GET  /api/v1/products/{id} - Get product by ID
///   - GET  /api/v1/products/{id}/suggestions - Often-bought-together
///
/// - Cart (all require the `x-session-id` header):
///   - GET  /api/v1/cart - Cart contents and totals
///   - POST /api/v1/cart/add - Add or update a line
///   - POST /api/v1/cart/remove - Remove a line
///   - POST /api/v1/coupon/apply - Apply a coupon code
///
/// - Orders:
///   - POST /api/v1/orders - Create an order from the cart
///   - GET  /api/v1/orders?email= - Order history
///   - GET  /api/v1/orders/{id} - Get one order
///
/// - Payment:
///   - POST /api/v1/payment/process - Create a gateway invoice
///   - GET  /api/v1/payment/status/{order_id} - Gateway-side status
///   - POST /api/v1/payment/cancel/{order_id} - Cancel the invoice
///
/// - Webhooks:
///   - POST /webhook/invoice - Gateway transaction callback
///
/// - Static pages:
///   - GET /payment/completed - Post-payment page
///   - GET /payment/canceled - Cancellation page
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - allow all origins for now
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Static post-payment pages
    let payment_pages = Router::new()
        .route("/completed", get(handlers::payment_completed))
        .route("/canceled", get(handlers::payment_canceled));

    let catalog_routes = Router::new()
        .route("/products", get(handlers::list_products))
        .route("/products/{product_id}", get(handlers::get_product))
        .route(
            "/products/{product_id}/suggestions",
            get(handlers::product_suggestions),
        );

    let cart_routes = Router::new()
        .route("/cart", get(handlers::cart_detail))
        .route("/cart/add", post(handlers::cart_add))
        .route("/cart/remove", post(handlers::cart_remove))
        .route("/coupon/apply", post(handlers::coupon_apply));

    let order_routes = Router::new()
        .route(
            "/orders",
            post(handlers::order_create).get(handlers::order_history),
        )
        .route("/orders/{order_id}", get(handlers::get_order));

    let payment_routes = Router::new()
        .route("/payment/process", post(handlers::payment_process))
        .route(
            "/payment/status/{order_id}",
            get(handlers::payment_status),
        )
        .route(
            "/payment/cancel/{order_id}",
            post(handlers::payment_cancel),
        );

    let api_routes = Router::new()
        .merge(catalog_routes)
        .merge(cart_routes)
        .merge(order_routes)
        .merge(payment_routes);

    // Webhook routes (no CORS, form-encoded body)
    let webhook_routes = Router::new().route("/invoice", post(handlers::invoice_callback));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/payment", payment_pages)
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
