//! Domain error types.

use common::OrderNumber;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur while operating on orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status is not reachable from the order's current status.
    #[error(
        "invalid status transition for order {number}: '{current}' does not allow '{requested}'"
    )]
    InvalidOrderStatus {
        number: OrderNumber,
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// A line quantity of zero is never valid.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}
