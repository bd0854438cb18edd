//! Notification trait and in-memory implementation.
//!
//! Notifications are fire-and-forget from the checkout flow's point of
//! view: a failed send is logged, never propagated into the payment path.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderNumber;
use thiserror::Error;

/// Message code sent to the customer when their order is approved.
pub const ORDER_APPROVED: &str = "order_approved";

/// Message code sent to the customer when their payment settles.
pub const ORDER_PAID: &str = "order_paid";

/// Alert code raised to staff when an order is placed.
pub const ORDER_PLACED_ADMIN_ALERT: &str = "order_placed";

/// Alert code raised to staff when a wire-transfer order awaits funds.
pub const WIRE_TRANSFER_ADMIN_ALERT: &str = "awaiting_wire_transfer";

/// Alert code raised to staff when money was taken but the order could
/// not be marked paid.
pub const PLACEMENT_FAILED_ADMIN_ALERT: &str = "placement_failed";

/// Errors from sending notifications.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
}

/// Who a message was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Customer,
    Staff,
}

/// A recorded outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub audience: Audience,
    pub order_number: OrderNumber,
    pub code: String,
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a templated message to the order's customer.
    async fn send_customer_message(
        &self,
        order_number: &OrderNumber,
        code: &str,
    ) -> Result<(), NotifierError>;

    /// Raises an alert to staff.
    async fn send_admin_alert(
        &self,
        order_number: &OrderNumber,
        code: &str,
    ) -> Result<(), NotifierError>;
}

/// In-memory notifier for testing. Records every message it is asked to
/// send.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    sent: Arc<RwLock<Vec<SentMessage>>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every message sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().unwrap().clone()
    }

    /// Returns true if a message with `code` was sent for `order_number`.
    pub fn was_sent(&self, order_number: &OrderNumber, code: &str) -> bool {
        self.sent
            .read()
            .unwrap()
            .iter()
            .any(|m| &m.order_number == order_number && m.code == code)
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_customer_message(
        &self,
        order_number: &OrderNumber,
        code: &str,
    ) -> Result<(), NotifierError> {
        self.sent.write().unwrap().push(SentMessage {
            audience: Audience::Customer,
            order_number: order_number.clone(),
            code: code.to_string(),
        });
        Ok(())
    }

    async fn send_admin_alert(
        &self,
        order_number: &OrderNumber,
        code: &str,
    ) -> Result<(), NotifierError> {
        self.sent.write().unwrap().push(SentMessage {
            audience: Audience::Staff,
            order_number: order_number.clone(),
            code: code.to_string(),
        });
        Ok(())
    }
}
