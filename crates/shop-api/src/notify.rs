//! # Order Notifications
//!
//! Seam for the downstream notifications the shop sends: the confirmation
//! when an order is placed and the invoice email once it is paid. Actual
//! delivery (SMTP, task queue) lives behind this trait; the storefront only
//! guarantees the dispatch discipline — in particular that the paid
//! notification fires exactly once per order.

use async_trait::async_trait;
use shop_core::{Order, ShopResult};
use tracing::info;

/// Order lifecycle notification hooks
#[allow(unused_variables)]
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Called once when an order has been persisted
    async fn on_order_created(&self, order: &Order) -> ShopResult<()> {
        info!(
            "Order created: id={}, email={}, total={}",
            order.id,
            order.customer.email,
            order.total_cost()
        );
        Ok(())
    }

    /// Called exactly once when an order transitions to paid
    async fn on_order_paid(&self, order: &Order) -> ShopResult<()> {
        info!(
            "Order paid: id={}, reference={:?}",
            order.id, order.order_reference
        );
        Ok(())
    }
}

/// Default notifier: just logs events
pub struct LoggingNotifier;

#[async_trait]
impl OrderNotifier for LoggingNotifier {}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts dispatches, for exactly-once assertions
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub created: AtomicUsize,
        pub paid: AtomicUsize,
    }

    #[async_trait]
    impl OrderNotifier for RecordingNotifier {
        async fn on_order_created(&self, _order: &Order) -> ShopResult<()> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_order_paid(&self, _order: &Order) -> ShopResult<()> {
            self.paid.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
