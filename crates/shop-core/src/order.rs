//! # Order Types
//!
//! Persisted orders and their item snapshots. Items copy the product name,
//! unit price, and quantity at order time, so later catalog edits never
//! change what a customer was charged. The discount percentage is likewise
//! copied from the coupon at creation, not kept as a live reference.

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment lifecycle of an order.
///
/// `Pending -> InvoiceCreated -> {Approved, Declined}`; any other edge is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Order placed, no invoice yet
    Pending,
    /// Gateway invoice created, awaiting the callback
    InvoiceCreated,
    /// Gateway reported the transaction approved
    Approved,
    /// Gateway reported the transaction declined or cancelled
    Declined,
}

impl Default for PaymentState {
    fn default() -> Self {
        PaymentState::Pending
    }
}

impl PaymentState {
    /// Whether moving to `next` is a legal transition
    pub fn can_transition(self, next: PaymentState) -> bool {
        matches!(
            (self, next),
            (PaymentState::Pending, PaymentState::InvoiceCreated)
                | (PaymentState::InvoiceCreated, PaymentState::Approved)
                | (PaymentState::InvoiceCreated, PaymentState::Declined)
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::InvoiceCreated => "invoice_created",
            PaymentState::Approved => "approved",
            PaymentState::Declined => "declined",
        }
    }
}

/// A snapshot of one purchased product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product id at order time (the product may since be deleted)
    pub product_id: String,

    /// Product name snapshot
    pub name: String,

    /// Unit price snapshot, exact decimal
    pub price: Decimal,

    /// Quantity, >= 1
    pub quantity: u32,
}

impl OrderItem {
    /// Line cost: price x quantity
    pub fn cost(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Customer fields captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

impl CustomerDetails {
    /// Reject blank required fields and obviously malformed emails before
    /// anything is persisted.
    pub fn validate(&self) -> ShopResult<()> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("address", &self.address),
            ("postal_code", &self.postal_code),
            ("city", &self.city),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ShopError::Validation(format!("{} is required", field)));
            }
        }
        if !self.email.contains('@') {
            return Err(ShopError::Validation("email is malformed".to_string()));
        }
        Ok(())
    }
}

/// What a handler asks the repository to persist: the customer, the item
/// snapshots, and the discount copied by value from the applied coupon.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer: CustomerDetails,
    pub items: Vec<OrderItem>,
    pub coupon_id: Option<String>,
    pub discount_percent: u8,
}

/// A persisted order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order id (generated)
    pub id: String,

    pub customer: CustomerDetails,

    /// Item snapshots, decoupled from the live catalog
    pub items: Vec<OrderItem>,

    /// Coupon id at order time, informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<String>,

    /// Discount percentage copied from the coupon at creation
    pub discount_percent: u8,

    /// Whether the gateway confirmed payment
    pub paid: bool,

    /// Opaque gateway order reference, set when an invoice is created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_reference: Option<String>,

    /// Payment lifecycle state
    #[serde(default)]
    pub payment_state: PaymentState,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Order {
    /// Build a new unpaid order from a draft
    pub fn from_draft(draft: OrderDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            customer: draft.customer,
            items: draft.items,
            coupon_id: draft.coupon_id,
            discount_percent: draft.discount_percent,
            paid: false,
            order_reference: None,
            payment_state: PaymentState::Pending,
            created: now,
            updated: now,
        }
    }

    /// Sum of item costs before any discount
    pub fn total_cost_before_discount(&self) -> Decimal {
        self.items.iter().map(|i| i.cost()).sum()
    }

    /// Discount amount from the copied percentage
    pub fn discount_amount(&self) -> Decimal {
        if self.discount_percent > 0 {
            self.total_cost_before_discount() * Decimal::from(self.discount_percent)
                / Decimal::from(100)
        } else {
            Decimal::ZERO
        }
    }

    /// Final amount the customer is invoiced for
    pub fn total_cost(&self) -> Decimal {
        self.total_cost_before_discount() - self.discount_amount()
    }

    /// Advance the payment state, rejecting illegal edges
    pub fn transition(&mut self, next: PaymentState) -> ShopResult<()> {
        if !self.payment_state.can_transition(next) {
            return Err(ShopError::InvalidTransition {
                from: self.payment_state.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.payment_state = next;
        self.updated = Utc::now();
        Ok(())
    }
}
