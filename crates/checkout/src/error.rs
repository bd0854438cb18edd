//! Checkout error types.

use common::OrderNumber;
use domain::OrderError;
use thiserror::Error;

use crate::services::gateway::GatewayError;
use crate::services::repository::RepositoryError;

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Payment cannot be taken until every line's tax is known.
    #[error("tax is not known for order {0}; payment cannot be taken")]
    TaxNotKnown(OrderNumber),

    /// The requested payment method code is not in the supported set.
    #[error("unsupported payment method '{method}'")]
    UnsupportedPaymentMethod { method: String },

    /// The chosen method requires a payment instrument and none was captured.
    #[error("no payment data captured for order {0}")]
    PaymentDataMissing(OrderNumber),

    /// The chosen method defers payment; it cannot be charged up front.
    #[error("payment method '{method}' defers payment and cannot be charged")]
    MethodNotChargeable { method: String },

    /// The gateway refused or failed the charge. The order has been
    /// restored to its pre-attempt status.
    #[error(transparent)]
    Payment(#[from] GatewayError),

    /// The charge settled but the order could not be persisted as paid.
    /// The reference identifies the captured funds for manual follow-up.
    #[error("payment {reference} was taken for order {number} but the order could not be placed")]
    PlacementFailed {
        number: OrderNumber,
        reference: String,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
