//! # Request Handlers
//!
//! Axum request handlers for the storefront API. Carts are explicit
//! session state: every cart route reads the opaque session id from the
//! `x-session-id` header, loads the cart from the session store, and
//! persists it back only when the operation marked it modified.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_core::{CartLineView, Coupon, CustomerDetails, Order, OrderDraft, OrderItem, ShopError};
use shop_gateway::{CallbackPayload, InvoiceRequest};
use tracing::{error, info, instrument, warn};

/// Quantity choice set offered by the storefront UI
const QUANTITY_CHOICES: std::ops::RangeInclusive<u32> = 1..=20;

/// Header carrying the opaque session identifier
const SESSION_HEADER: &str = "x-session-id";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn shop_error_to_response(err: ShopError) -> ApiError {
    let code = err.status_code();
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorResponse::new(err.to_string(), code)),
    )
}

fn not_found(message: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(message, 404)),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, 400)),
    )
}

/// Pull the session id out of the request headers
fn session_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| bad_request(format!("Missing {} header", SESSION_HEADER)))
}

/// Add a product to the cart or update its quantity
#[derive(Debug, Deserialize)]
pub struct CartAddRequest {
    pub product_id: String,
    /// Quantity from the UI choice set
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Replace the stored quantity instead of adding to it
    #[serde(default)]
    pub override_quantity: bool,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CartRemoveRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CouponApplyRequest {
    pub code: String,
}

/// Applied coupon summary in cart responses
#[derive(Debug, Serialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_percent: u8,
}

/// Cart detail: enriched lines plus the priced totals
#[derive(Debug, Serialize)]
pub struct CartDetailResponse {
    pub items: Vec<CartLineView>,
    /// Sum of quantities across all lines
    pub total_quantity: u32,
    pub total_price_before_discount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<AppliedCoupon>,
    pub discount_amount: Decimal,
    pub total_price_after_discount: Decimal,
}

/// Customer fields for order creation
#[derive(Debug, Deserialize)]
pub struct OrderCreateRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub total_cost: Decimal,
    pub discount_percent: u8,
    pub paid: bool,
}

#[derive(Debug, Deserialize)]
pub struct PaymentProcessRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentProcessResponse {
    pub invoice_url: String,
    pub order_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderHistoryQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default = "default_max_suggestions")]
    pub max: usize,
}

fn default_max_suggestions() -> usize {
    6
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "voltshop",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List available products
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let products: Vec<_> = state.catalog.available_products().collect();
    Json(serde_json::json!({
        "products": products,
        "count": products.len()
    }))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .catalog
        .get(&product_id)
        .ok_or_else(|| not_found(format!("Product not found: {}", product_id)))?;
    Ok(Json(product.clone()))
}

/// Products often bought together with this one
pub async fn product_suggestions(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if state.catalog.get(&product_id).is_none() {
        return Err(not_found(format!("Product not found: {}", product_id)));
    }

    let ids = match &state.recommender {
        Some(recommender) => recommender
            .suggest_for(&product_id, query.max)
            .await
            .map_err(shop_error_to_response)?,
        None => Vec::new(),
    };

    let products: Vec<_> = ids
        .iter()
        .filter_map(|id| state.catalog.get(id))
        .filter(|p| p.available)
        .collect();

    Ok(Json(serde_json::json!({
        "product_id": product_id,
        "suggestions": products,
    })))
}

fn cart_detail_response(state: &AppState, cart: &shop_core::Cart) -> CartDetailResponse {
    let coupon = cart.applied_coupon(&state.coupons);
    CartDetailResponse {
        items: cart.lines(&state.catalog).collect(),
        total_quantity: cart.len(),
        total_price_before_discount: cart.total_price_before_discount(),
        coupon: coupon.map(|c: &Coupon| AppliedCoupon {
            code: c.code.clone(),
            discount_percent: c.discount_percent,
        }),
        discount_amount: cart.discount_amount(coupon),
        total_price_after_discount: cart.total_price_after_discount(coupon),
    }
}

/// Current cart contents and totals
pub async fn cart_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CartDetailResponse>, ApiError> {
    let session = session_id(&headers)?;
    let cart = state
        .sessions
        .load(&session)
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(cart_detail_response(&state, &cart)))
}

/// Add a product to the cart or update its quantity
#[instrument(skip(state, headers, request), fields(product_id = %request.product_id))]
pub async fn cart_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CartAddRequest>,
) -> Result<Json<CartDetailResponse>, ApiError> {
    let session = session_id(&headers)?;

    if !QUANTITY_CHOICES.contains(&request.quantity) {
        return Err(bad_request(format!(
            "quantity must be between {} and {}",
            QUANTITY_CHOICES.start(),
            QUANTITY_CHOICES.end()
        )));
    }

    let product = state
        .catalog
        .get(&request.product_id)
        .ok_or_else(|| not_found(format!("Product not found: {}", request.product_id)))?;
    if !product.available {
        return Err(bad_request(format!(
            "Product is not available: {}",
            request.product_id
        )));
    }

    let mut cart = state
        .sessions
        .load(&session)
        .await
        .map_err(shop_error_to_response)?;
    cart.add(product, request.quantity, request.override_quantity)
        .map_err(shop_error_to_response)?;
    state
        .sessions
        .store(&session, &cart)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(cart_detail_response(&state, &cart)))
}

/// Remove a product from the cart; absent products are a no-op
pub async fn cart_remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CartRemoveRequest>,
) -> Result<Json<CartDetailResponse>, ApiError> {
    let session = session_id(&headers)?;
    let mut cart = state
        .sessions
        .load(&session)
        .await
        .map_err(shop_error_to_response)?;

    cart.remove(&request.product_id);
    if cart.is_modified() {
        state
            .sessions
            .store(&session, &cart)
            .await
            .map_err(shop_error_to_response)?;
    }

    Ok(Json(cart_detail_response(&state, &cart)))
}

/// Apply a coupon code to the cart. An invalid code clears any previously
/// applied coupon instead of leaving a stale reference.
#[instrument(skip(state, headers, request))]
pub async fn coupon_apply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CouponApplyRequest>,
) -> Result<Json<CartDetailResponse>, ApiError> {
    let session = session_id(&headers)?;
    let mut cart = state
        .sessions
        .load(&session)
        .await
        .map_err(shop_error_to_response)?;

    let applied = cart
        .apply_coupon(&state.coupons, &request.code, chrono::Utc::now())
        .map_err(shop_error_to_response)?;
    if applied.is_none() {
        info!("Coupon code did not validate, cleared: {}", request.code);
    }

    state
        .sessions
        .store(&session, &cart)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(cart_detail_response(&state, &cart)))
}

/// Create an order from the session cart.
///
/// The repository insert is all-or-nothing; the cart is cleared only after
/// it succeeds, so a failed attempt leaves the cart intact for a retry.
#[instrument(skip(state, headers, request), fields(email = %request.email))]
pub async fn order_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<OrderCreateRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let session = session_id(&headers)?;
    let mut cart = state
        .sessions
        .load(&session)
        .await
        .map_err(shop_error_to_response)?;

    if cart.is_empty() {
        return Err(bad_request("Cart is empty"));
    }

    // Snapshot items; a product deleted since it was added keeps its
    // stored price and falls back to the id for a name.
    let items: Vec<OrderItem> = cart
        .lines(&state.catalog)
        .map(|view: CartLineView| OrderItem {
            name: view
                .product
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| view.product_id.clone()),
            product_id: view.product_id,
            price: view.price,
            quantity: view.quantity,
        })
        .collect();

    // Discount is copied by value; the order never re-resolves the coupon
    let coupon = cart.applied_coupon(&state.coupons);
    let draft = OrderDraft {
        customer: CustomerDetails {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            address: request.address,
            postal_code: request.postal_code,
            city: request.city,
        },
        items,
        coupon_id: coupon.map(|c| c.id.clone()),
        discount_percent: coupon.map(|c| c.discount_percent).unwrap_or(0),
    };

    let product_ids: Vec<String> = cart.raw_lines().keys().cloned().collect();

    let order = state
        .orders
        .create(draft)
        .await
        .map_err(shop_error_to_response)?;

    // Only now that the order is durable does the cart get cleared
    cart.clear();
    state
        .sessions
        .store(&session, &cart)
        .await
        .map_err(shop_error_to_response)?;

    if let Err(e) = state.notifier.on_order_created(&order).await {
        warn!("Order-created notification failed: {}", e);
    }

    if let Some(recommender) = &state.recommender {
        if let Err(e) = recommender.products_bought(&product_ids).await {
            warn!("Recommender update failed: {}", e);
        }
    }

    info!("Order created: id={}, total={}", order.id, order.total_cost());

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            total_cost: order.total_cost(),
            order_id: order.id,
            discount_percent: order.discount_percent,
            paid: order.paid,
        }),
    ))
}

/// Fetch one order
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get(&order_id)
        .await
        .map_err(shop_error_to_response)?
        .ok_or_else(|| not_found(format!("Order not found: {}", order_id)))?;
    Ok(Json(order))
}

/// Order history for a customer email, newest first
pub async fn order_history(
    State(state): State<AppState>,
    Query(query): Query<OrderHistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .orders
        .list_for_email(&query.email)
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(serde_json::json!({
        "orders": orders,
        "count": orders.len()
    })))
}

/// Create a gateway invoice for a pending order
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn payment_process(
    State(state): State<AppState>,
    Json(request): Json<PaymentProcessRequest>,
) -> Result<Json<PaymentProcessResponse>, ApiError> {
    let order = state
        .orders
        .get(&request.order_id)
        .await
        .map_err(shop_error_to_response)?
        .ok_or_else(|| not_found(format!("Order not found: {}", request.order_id)))?;

    // Re-processing would mint a second invoice under a fresh reference;
    // the state machine refuses that instead of duplicating invoices.
    if order.order_reference.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                format!("Invoice already created for order {}", order.id),
                409,
            )),
        ));
    }

    let invoice_request = InvoiceRequest::from_order(&order, state.config.currency.clone());
    let invoice = state
        .gateway
        .create_invoice(&invoice_request)
        .await
        .map_err(|e| {
            error!("Invoice creation failed for order {}: {}", order.id, e);
            shop_error_to_response(e)
        })?;

    state
        .orders
        .set_order_reference(&order.id, &invoice.order_reference)
        .await
        .map_err(shop_error_to_response)?;

    info!(
        "Invoice created: order={}, reference={}",
        order.id, invoice.order_reference
    );

    Ok(Json(PaymentProcessResponse {
        invoice_url: invoice.invoice_url,
        order_reference: invoice.order_reference,
        qr_code: invoice.qr_code,
    }))
}

/// Check the gateway-side status of an order's invoice. Read-only and
/// safe to retry.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .orders
        .get(&order_id)
        .await
        .map_err(shop_error_to_response)?
        .ok_or_else(|| not_found(format!("Order not found: {}", order_id)))?;

    let reference = order
        .order_reference
        .as_deref()
        .ok_or_else(|| bad_request(format!("Order {} has no invoice", order_id)))?;

    let status = state
        .gateway
        .check_invoice(reference)
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(status))
}

/// Request cancellation of an order's invoice
pub async fn payment_cancel(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .orders
        .get(&order_id)
        .await
        .map_err(shop_error_to_response)?
        .ok_or_else(|| not_found(format!("Order not found: {}", order_id)))?;

    let reference = order
        .order_reference
        .as_deref()
        .ok_or_else(|| bad_request(format!("Order {} has no invoice", order_id)))?;

    let removed = state
        .gateway
        .delete_invoice(reference)
        .await
        .map_err(shop_error_to_response)?;
    Ok(Json(serde_json::json!({ "canceled": removed })))
}

/// Handle the gateway's transaction-completed callback.
///
/// Signature first: a mismatch rejects the callback outright, with no
/// order lookup and no state change. A verified callback marks the order
/// paid only on `Approved`, dispatches the paid notification only on the
/// actual unpaid -> paid transition, and acknowledges receipt even when
/// the reference matches no order (that inconsistency is reported loudly,
/// not swallowed).
#[instrument(skip(state, payload), fields(reference = %payload.order_reference))]
pub async fn invoice_callback(
    State(state): State<AppState>,
    Form(payload): Form<CallbackPayload>,
) -> Result<impl IntoResponse, ApiError> {
    state.gateway.verify_callback(&payload).map_err(|e| {
        warn!(
            "Rejected callback with bad signature: reference={}",
            payload.order_reference
        );
        shop_error_to_response(e)
    })?;

    let ack = state.gateway.ack(&payload.order_reference);

    let order = state
        .orders
        .find_by_reference(&payload.order_reference)
        .await
        .map_err(shop_error_to_response)?;

    let Some(order) = order else {
        // Verified callback for an unknown reference: operational alert,
        // but the gateway still gets its acknowledgement.
        error!(
            "Integrity error: callback references unknown order: {}",
            payload.order_reference
        );
        return Ok((StatusCode::OK, Json(ack)));
    };

    let approved = payload.is_approved();
    let transitioned = state
        .orders
        .record_verdict(&order.id, approved)
        .await
        .map_err(shop_error_to_response)?;

    info!(
        "Callback processed: order={}, status={}, transitioned={}",
        order.id, payload.transaction_status, transitioned
    );

    if transitioned {
        if let Some(paid_order) = state
            .orders
            .get(&order.id)
            .await
            .map_err(shop_error_to_response)?
        {
            if let Err(e) = state.notifier.on_order_paid(&paid_order).await {
                error!("Paid notification failed for order {}: {}", order.id, e);
            }
        }
    }

    Ok((StatusCode::OK, Json(ack)))
}

/// Human-facing page after a completed payment
pub async fn payment_completed() -> impl IntoResponse {
    axum::response::Html(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Successful</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="padding: 60px; border-radius: 16px; text-align: center;">
        <h1>Payment Successful</h1>
        <p>Thank you for your purchase. A receipt is on its way to your inbox.</p>
    </div>
</body>
</html>
"#,
    )
}

/// Human-facing page after a cancelled payment
pub async fn payment_canceled() -> impl IntoResponse {
    axum::response::Html(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Cancelled</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="padding: 60px; border-radius: 16px; text-align: center;">
        <h1>Payment Cancelled</h1>
        <p>No charges were made. Your order is still awaiting payment.</p>
    </div>
</body>
</html>
"#,
    )
}
