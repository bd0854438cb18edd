//! Order and line status enums.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Which transitions are valid is configuration, not code: see
/// [`crate::pipeline::StatusPipeline`]. The canonical pipeline is:
/// ```text
/// New ──► Approved ──┬──► PaymentInProgress ──► Paid ──► Shipped
///                    └──► AwaitingWireTransfer ──► Paid
/// (every non-terminal status may also move to Cancelled or Fraudulent)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been placed and awaits admin approval.
    #[default]
    New,

    /// Order is approved and may accept payment.
    Approved,

    /// A payment attempt is in flight; the order is frozen.
    PaymentInProgress,

    /// A deferred payment method was chosen; funds not yet received.
    AwaitingWireTransfer,

    /// Payment has been captured or received.
    Paid,

    /// Order has been dispatched (terminal).
    Shipped,

    /// Order was cancelled (terminal).
    Cancelled,

    /// Order was flagged as fraudulent (terminal).
    Fraudulent,
}

impl OrderStatus {
    /// Returns the human-readable status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "New (Awaiting Approval)",
            OrderStatus::Approved => "Approved (Awaiting Payment)",
            OrderStatus::PaymentInProgress => "Payment In Progress",
            OrderStatus::AwaitingWireTransfer => "Awaiting Wire Transfer",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Fraudulent => "Fraudulent",
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Shipped | OrderStatus::Cancelled | OrderStatus::Fraudulent
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LineStatus {
    /// Line awaits processing.
    #[default]
    Pending,

    /// Line is being picked/prepared.
    BeingProcessed,

    /// Line has been dispatched (terminal).
    Shipped,

    /// Line was cancelled (terminal).
    Cancelled,
}

impl LineStatus {
    /// Returns the human-readable status label.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStatus::Pending => "Pending",
            LineStatus::BeingProcessed => "Being processed",
            LineStatus::Shipped => "Shipped",
            LineStatus::Cancelled => "Cancelled",
        }
    }

    /// Returns true if the line can no longer be modified or deleted.
    ///
    /// Terminal lines are excluded from status cascades.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LineStatus::Shipped | LineStatus::Cancelled)
    }
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
