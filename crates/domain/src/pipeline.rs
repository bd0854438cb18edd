//! Order-status state machine.
//!
//! The transition graph and the line cascade are configuration data, loaded
//! once at process start and read-only thereafter. The canonical tables live
//! in [`StatusPipeline::canonical`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::order::Order;
use crate::status::{LineStatus, OrderStatus};

/// The order-status transition graph plus the order-to-line status cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPipeline {
    transitions: HashMap<OrderStatus, Vec<OrderStatus>>,
    cascade: HashMap<OrderStatus, LineStatus>,
}

impl StatusPipeline {
    /// Builds a pipeline from explicit tables.
    pub fn new(
        transitions: HashMap<OrderStatus, Vec<OrderStatus>>,
        cascade: HashMap<OrderStatus, LineStatus>,
    ) -> Self {
        Self {
            transitions,
            cascade,
        }
    }

    /// The canonical pipeline.
    pub fn canonical() -> Self {
        use OrderStatus::*;
        let transitions = HashMap::from([
            (New, vec![Approved, Cancelled, Fraudulent]),
            (
                Approved,
                vec![PaymentInProgress, AwaitingWireTransfer, Paid, Cancelled, Fraudulent],
            ),
            (PaymentInProgress, vec![Approved, Paid, Cancelled, Fraudulent]),
            (AwaitingWireTransfer, vec![Approved, Paid, Cancelled, Fraudulent]),
            (Paid, vec![Shipped, Cancelled, Fraudulent]),
            (Shipped, vec![]),
            (Cancelled, vec![]),
            (Fraudulent, vec![]),
        ]);
        let cascade = HashMap::from([
            (Paid, LineStatus::BeingProcessed),
            (Shipped, LineStatus::Shipped),
            (Cancelled, LineStatus::Cancelled),
            (Fraudulent, LineStatus::Cancelled),
        ]);
        Self::new(transitions, cascade)
    }

    /// Returns the statuses reachable from `from`.
    pub fn allowed_from(&self, from: OrderStatus) -> &[OrderStatus] {
        self.transitions.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `from -> to` is a valid transition.
    pub fn can_transition(&self, from: OrderStatus, to: OrderStatus) -> bool {
        self.allowed_from(from).contains(&to)
    }

    /// Returns the line status that lines must cascade to when the order
    /// reaches `status`, if a cascade rule is configured.
    pub fn cascade_target(&self, status: OrderStatus) -> Option<LineStatus> {
        self.cascade.get(&status).copied()
    }

    /// Applies a status transition to the order.
    ///
    /// On success the status is set, an audit note is appended, and any
    /// configured cascade is applied to every non-terminal line. On failure
    /// the order is left untouched.
    pub fn transition(&self, order: &mut Order, new_status: OrderStatus) -> Result<(), OrderError> {
        if !self.can_transition(order.status, new_status) {
            return Err(OrderError::InvalidOrderStatus {
                number: order.number.clone(),
                current: order.status,
                requested: new_status,
            });
        }

        let old_status = order.status;
        order.status = new_status;
        order.status_updated_at = chrono::Utc::now();
        order.add_note(format!(
            "Order status changed from '{}' to '{}'.",
            old_status, new_status
        ));

        if let Some(target) = self.cascade_target(new_status) {
            for line in order.lines.iter_mut() {
                if !line.status.is_terminal() {
                    line.status = target;
                }
            }
        }

        Ok(())
    }
}

impl Default for StatusPipeline {
    fn default() -> Self {
        Self::canonical()
    }
}
