//! Order event handling.
//!
//! Status changes always flow through here rather than being assigned
//! directly, so the transition table is enforced and side effects (audit
//! notes, customer notification on approval) happen in one place.

use std::sync::Arc;

use domain::{CheckoutConfig, Order, OrderError, OrderStatus};

use crate::services::notifier::{Notifier, ORDER_APPROVED};

/// Applies status changes to orders and runs their side effects.
pub struct OrderEventHandler<N> {
    config: Arc<CheckoutConfig>,
    notifier: N,
    /// Set when the change is made by staff. Only staff-made approvals
    /// notify the customer; system-made transitions stay quiet.
    privileged: bool,
}

impl<N: Notifier> OrderEventHandler<N> {
    /// Creates a handler for system-initiated status changes.
    pub fn new(config: Arc<CheckoutConfig>, notifier: N) -> Self {
        Self {
            config,
            notifier,
            privileged: false,
        }
    }

    /// Creates a handler for staff-initiated status changes.
    pub fn privileged(config: Arc<CheckoutConfig>, notifier: N) -> Self {
        Self {
            config,
            notifier,
            privileged: true,
        }
    }

    /// Transitions the order to `new_status`, appending `note` if given.
    ///
    /// When a staff member approves a new order, the customer is told their
    /// order is ready for payment. Notification failures are logged and
    /// swallowed; the status change already happened and must stand.
    #[tracing::instrument(skip(self, order), fields(order = %order.number))]
    pub async fn handle_order_status_change(
        &self,
        order: &mut Order,
        new_status: OrderStatus,
        note: Option<String>,
    ) -> Result<(), OrderError> {
        let old_status = order.status;
        self.config.pipeline.transition(order, new_status)?;
        if let Some(note) = note {
            order.add_note(note);
        }

        tracing::info!(
            from = %old_status,
            to = %new_status,
            "order status changed"
        );

        if self.privileged
            && old_status == OrderStatus::New
            && new_status == OrderStatus::Approved
        {
            if let Err(e) = self
                .notifier
                .send_customer_message(&order.number, ORDER_APPROVED)
                .await
            {
                tracing::error!(order = %order.number, error = %e, "failed to send approval notification");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::InMemoryNotifier;
    use common::{BasketId, OrderNumber};
    use domain::Line;
    use rust_decimal_macros::dec;

    fn new_order() -> Order {
        Order::new(
            OrderNumber::new("100001"),
            BasketId::new(),
            "USD",
            vec![Line::new("A", 1, dec!(10.00)).unwrap()],
        )
    }

    #[tokio::test]
    async fn staff_approval_notifies_the_customer() {
        let notifier = InMemoryNotifier::new();
        let handler =
            OrderEventHandler::privileged(Arc::new(CheckoutConfig::default()), notifier.clone());
        let mut order = new_order();

        handler
            .handle_order_status_change(&mut order, OrderStatus::Approved, None)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Approved);
        assert!(notifier.was_sent(&order.number, ORDER_APPROVED));
    }

    #[tokio::test]
    async fn system_transitions_stay_quiet() {
        let notifier = InMemoryNotifier::new();
        let handler =
            OrderEventHandler::new(Arc::new(CheckoutConfig::default()), notifier.clone());
        let mut order = new_order();

        handler
            .handle_order_status_change(&mut order, OrderStatus::Approved, None)
            .await
            .unwrap();

        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected_without_side_effects() {
        let notifier = InMemoryNotifier::new();
        let handler =
            OrderEventHandler::privileged(Arc::new(CheckoutConfig::default()), notifier.clone());
        let mut order = new_order();

        let result = handler
            .handle_order_status_change(&mut order, OrderStatus::Paid, None)
            .await;

        assert!(result.is_err());
        assert_eq!(order.status, OrderStatus::New);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn note_is_appended_after_the_transition_note() {
        let notifier = InMemoryNotifier::new();
        let handler =
            OrderEventHandler::new(Arc::new(CheckoutConfig::default()), notifier.clone());
        let mut order = new_order();

        handler
            .handle_order_status_change(
                &mut order,
                OrderStatus::Approved,
                Some("Approved after manual review.".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(order.notes.len(), 2);
        assert_eq!(order.notes[1].message, "Approved after manual review.");
    }
}
