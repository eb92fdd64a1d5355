//! # Storage Seams
//!
//! Repository traits decoupling the storefront from any particular backing
//! store, with in-memory implementations used by the server and tests.
//! Relationships are plain identifiers resolved through these interfaces,
//! never live object references.

use crate::cart::Cart;
use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderDraft};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-session cart storage keyed by an opaque session id.
///
/// The host is expected to serialize access per session; the store itself
/// only guards its own map.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session's cart, or a fresh empty cart on first access
    async fn load(&self, session_id: &str) -> ShopResult<Cart>;

    /// Persist the session's cart
    async fn store(&self, session_id: &str, cart: &Cart) -> ShopResult<()>;

    /// Drop the session entirely
    async fn remove(&self, session_id: &str) -> ShopResult<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order and all of its item snapshots as one all-or-nothing
    /// unit. A failure leaves no order visible.
    async fn create(&self, draft: OrderDraft) -> ShopResult<Order>;

    /// Fetch by order id
    async fn get(&self, order_id: &str) -> ShopResult<Option<Order>>;

    /// Fetch by the opaque gateway order reference
    async fn find_by_reference(&self, order_reference: &str) -> ShopResult<Option<Order>>;

    /// Order history for a customer email, newest first
    async fn list_for_email(&self, email: &str) -> ShopResult<Vec<Order>>;

    /// Attach the gateway order reference and move the payment state to
    /// `InvoiceCreated`
    async fn set_order_reference(&self, order_id: &str, reference: &str) -> ShopResult<()>;

    /// Record the gateway verdict for an order. For an approval, returns
    /// `true` only when the paid flag actually transitioned false -> true;
    /// repeat deliveries of the same callback return `false` so downstream
    /// notifications fire exactly once.
    async fn record_verdict(&self, order_id: &str, approved: bool) -> ShopResult<bool>;
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Cart>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> ShopResult<Cart> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn store(&self, session_id: &str, cart: &Cart) -> ShopResult<()> {
        let mut stored = cart.clone();
        stored.mark_clean();
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), stored);
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> ShopResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// In-memory order repository. All writes to one order map happen under a
/// single lock guard, which is what makes `create` all-or-nothing.
#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create(&self, draft: OrderDraft) -> ShopResult<Order> {
        draft.customer.validate()?;
        if draft.items.is_empty() {
            return Err(ShopError::Validation("order has no items".to_string()));
        }
        if draft.discount_percent > 100 {
            return Err(ShopError::Validation(
                "discount percent out of range".to_string(),
            ));
        }
        for item in &draft.items {
            if item.quantity == 0 {
                return Err(ShopError::Validation(format!(
                    "item {} has zero quantity",
                    item.product_id
                )));
            }
        }

        let order = Order::from_draft(draft);
        let mut orders = self.orders.write().await;
        orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: &str) -> ShopResult<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn find_by_reference(&self, order_reference: &str) -> ShopResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.order_reference.as_deref() == Some(order_reference))
            .cloned())
    }

    async fn list_for_email(&self, email: &str) -> ShopResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.customer.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(orders)
    }

    async fn set_order_reference(&self, order_id: &str, reference: &str) -> ShopResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;
        order.transition(crate::order::PaymentState::InvoiceCreated)?;
        order.order_reference = Some(reference.to_string());
        Ok(())
    }

    async fn record_verdict(&self, order_id: &str, approved: bool) -> ShopResult<bool> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if approved {
            if order.paid {
                // Duplicate delivery of an approval: no transition
                return Ok(false);
            }
            if order.payment_state.can_transition(crate::order::PaymentState::Approved) {
                order.payment_state = crate::order::PaymentState::Approved;
            }
            order.paid = true;
            order.updated = Utc::now();
            Ok(true)
        } else {
            if order.payment_state.can_transition(crate::order::PaymentState::Declined) {
                order.payment_state = crate::order::PaymentState::Declined;
            }
            order.paid = false;
            order.updated = Utc::now();
            Ok(false)
        }
    }
}

/// Shared handle types used across the API layer
pub type SharedSessionStore = Arc<dyn SessionStore>;
pub type SharedOrderRepository = Arc<dyn OrderRepository>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{CustomerDetails, OrderItem, PaymentState};
    use crate::product::Product;
    use rust_decimal_macros::dec;

    fn draft() -> OrderDraft {
        OrderDraft {
            customer: CustomerDetails {
                first_name: "Olena".to_string(),
                last_name: "Koval".to_string(),
                email: "olena@example.com".to_string(),
                address: "12 Khreshchatyk St".to_string(),
                postal_code: "01001".to_string(),
                city: "Kyiv".to_string(),
            },
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                name: "Inverter".to_string(),
                price: dec!(100.00),
                quantity: 1,
            }],
            coupon_id: None,
            discount_percent: 0,
        }
    }

    #[tokio::test]
    async fn test_session_store_roundtrip() {
        let store = MemorySessionStore::new();
        let product = Product::new("p1", "Inverter", dec!(100.00));

        let mut cart = store.load("sess-1").await.unwrap();
        assert!(cart.is_empty());

        cart.add(&product, 2, false).unwrap();
        store.store("sess-1", &cart).await.unwrap();

        let restored = store.load("sess-1").await.unwrap();
        assert_eq!(restored.len(), 2);
        assert!(!restored.is_modified());

        store.remove("sess-1").await.unwrap();
        assert!(store.load("sess-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft_without_persisting() {
        let repo = MemoryOrderRepository::new();

        let mut bad = draft();
        bad.items.clear();
        assert!(repo.create(bad).await.is_err());

        let mut bad = draft();
        bad.customer.email = "nope".to_string();
        assert!(repo.create(bad).await.is_err());

        // Nothing was persisted by the failed attempts
        assert!(repo.list_for_email("olena@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reference_lookup_and_verdicts() {
        let repo = MemoryOrderRepository::new();
        let order = repo.create(draft()).await.unwrap();

        repo.set_order_reference(&order.id, "DH1234567890")
            .await
            .unwrap();
        let found = repo
            .find_by_reference("DH1234567890")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, order.id);
        assert_eq!(found.payment_state, PaymentState::InvoiceCreated);

        // First approval transitions, the duplicate does not
        assert!(repo.record_verdict(&order.id, true).await.unwrap());
        assert!(!repo.record_verdict(&order.id, true).await.unwrap());

        let paid = repo.get(&order.id).await.unwrap().unwrap();
        assert!(paid.paid);
        assert_eq!(paid.payment_state, PaymentState::Approved);
    }

    #[tokio::test]
    async fn test_declined_verdict_leaves_unpaid() {
        let repo = MemoryOrderRepository::new();
        let order = repo.create(draft()).await.unwrap();
        repo.set_order_reference(&order.id, "DH0000000001")
            .await
            .unwrap();

        assert!(!repo.record_verdict(&order.id, false).await.unwrap());
        let declined = repo.get(&order.id).await.unwrap().unwrap();
        assert!(!declined.paid);
        assert_eq!(declined.payment_state, PaymentState::Declined);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let repo = MemoryOrderRepository::new();
        let first = repo.create(draft()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.create(draft()).await.unwrap();

        let history = repo.list_for_email("OLENA@example.com").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
    }
}
