//! # shop-gateway
//!
//! Invoicing-gateway client for the voltshop storefront.
//!
//! The gateway exposes one JSON endpoint; the operation is chosen by the
//! `transactionType` request field. Every request is authenticated with an
//! HMAC-MD5 signature over `;`-joined fields, and every inbound callback is
//! verified the same way before it is trusted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_gateway::{InvoiceClient, InvoiceRequest};
//!
//! // Create client from environment (GATEWAY_SECRET_KEY, ...)
//! let client = InvoiceClient::from_env()?;
//!
//! // Invoice a persisted order
//! let request = InvoiceRequest::from_order(&order, "UAH");
//! let invoice = client.create_invoice(&request).await?;
//!
//! // Persist invoice.order_reference, redirect to invoice.invoice_url
//! ```
//!
//! ## Callback Verification
//!
//! ```rust,ignore
//! use shop_gateway::{CallbackAck, CallbackPayload};
//!
//! // In the webhook endpoint:
//! payload.verify(&config)?; // Security error on mismatch, nothing trusted
//! if payload.is_approved() {
//!     // mark the order paid
//! }
//! let ack = CallbackAck::accept(&config, &payload.order_reference);
//! ```

pub mod callback;
pub mod config;
pub mod invoice;
pub mod signature;

// Re-exports
pub use callback::{CallbackAck, CallbackPayload, STATUS_APPROVED};
pub use config::GatewayConfig;
pub use invoice::{InvoiceClient, InvoiceCreateResult, InvoiceRequest, InvoiceStatus};
pub use signature::{constant_time_compare, generate_signature};
