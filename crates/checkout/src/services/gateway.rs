//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderNumber;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors a payment gateway can return from a charge attempt.
///
/// The taxonomy decides what the customer is told: declines and
/// unable-to-take-payment errors carry messages safe to show verbatim,
/// everything else is reported with a generic message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The card issuer declined the charge. Message is customer-safe.
    #[error("payment declined: {0}")]
    UserDeclined(String),

    /// The gateway rejected the charge for a reason the customer can act
    /// on (expired card, invalid number). Message is customer-safe.
    #[error("unable to take payment: {0}")]
    UnableToTakePayment(String),

    /// The gateway could not be reached or timed out. The charge outcome
    /// is unknown; the order must be swept later.
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Our request was malformed. A bug on our side, never the customer's.
    #[error("invalid gateway request: {0}")]
    InvalidGatewayRequest(String),
}

impl GatewayError {
    /// Returns true when the underlying message may be shown to the
    /// customer verbatim.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            GatewayError::UserDeclined(_) | GatewayError::UnableToTakePayment(_)
        )
    }

    /// The message to show the customer.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::UserDeclined(msg) | GatewayError::UnableToTakePayment(msg) => {
                msg.clone()
            }
            GatewayError::GatewayUnavailable(_) | GatewayError::InvalidGatewayRequest(_) => {
                "A problem occurred while processing your payment. \
                 You have not been charged. Please try again later."
                    .to_string()
            }
        }
    }
}

/// A charge request sent to the gateway.
///
/// `idempotency_key` makes retries safe: the gateway must return the
/// original receipt for a key it has already settled.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_number: OrderNumber,
    pub amount: Decimal,
    pub currency: String,
    pub token: String,
    pub description: String,
    pub idempotency_key: String,
}

/// A settled charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
    /// The gateway's reference for this charge.
    pub reference: String,
    /// A customer-facing label for the instrument, e.g. a masked card number.
    pub instrument_label: String,
    pub amount: Decimal,
}

/// External payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount against the tokenized instrument.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: HashMap<String, ChargeReceipt>,
    next_id: u32,
    fail_with: Option<GatewayError>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail every subsequent charge with `error`.
    pub fn set_fail_with(&self, error: Option<GatewayError>) {
        self.state.write().unwrap().fail_with = error;
    }

    /// Returns the number of settled charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        let mut state = self.state.write().unwrap();

        if let Some(error) = &state.fail_with {
            return Err(error.clone());
        }

        if let Some(receipt) = state.charges.get(&request.idempotency_key) {
            return Ok(receipt.clone());
        }

        state.next_id += 1;
        let receipt = ChargeReceipt {
            reference: format!("ch_{:04}", state.next_id),
            instrument_label: "************4242".to_string(),
            amount: request.amount,
        };
        state
            .charges
            .insert(request.idempotency_key, receipt.clone());

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(key: &str) -> ChargeRequest {
        ChargeRequest {
            order_number: OrderNumber::new("100001"),
            amount: dec!(118.50),
            currency: "USD".to_string(),
            token: "tok_visa".to_string(),
            description: "Order #100001".to_string(),
            idempotency_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn charge_settles_and_assigns_reference() {
        let gateway = InMemoryGateway::new();
        let receipt = gateway.charge(request("key-1")).await.unwrap();
        assert_eq!(receipt.reference, "ch_0001");
        assert_eq!(receipt.amount, dec!(118.50));
        assert_eq!(gateway.charge_count(), 1);
    }

    #[tokio::test]
    async fn repeated_idempotency_key_returns_original_receipt() {
        let gateway = InMemoryGateway::new();
        let first = gateway.charge(request("key-1")).await.unwrap();
        let second = gateway.charge(request("key-1")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.charge_count(), 1);
    }

    #[tokio::test]
    async fn configured_failure_is_returned() {
        let gateway = InMemoryGateway::new();
        gateway.set_fail_with(Some(GatewayError::UserDeclined(
            "Your card was declined.".to_string(),
        )));
        let err = gateway.charge(request("key-1")).await.unwrap_err();
        assert!(err.is_user_actionable());
        assert_eq!(err.user_message(), "Your card was declined.");
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_gateway_hides_details_from_customer() {
        let err = GatewayError::GatewayUnavailable("connect timeout".to_string());
        assert!(!err.is_user_actionable());
        assert!(!err.user_message().contains("timeout"));
    }
}
