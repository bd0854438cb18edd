//! Payment methods offered at checkout.

use common::{round_to_minor_unit, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CheckoutConfig;
use crate::order::Order;

/// Stable code for the card payment method.
pub const CARD_PAYMENT: &str = "card_payment";

/// Stable code for the wire transfer method.
pub const WIRE_TRANSFER: &str = "wire_transfer";

/// A payment method a customer may settle an order with.
///
/// The set is closed. Card payments are immediate and carry a processing
/// fee; wire transfers are deferred, fee-free, and need no payment data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    CardPayment,
    WireTransfer,
}

impl PaymentMethod {
    /// Resolves a method from its stable code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            CARD_PAYMENT => Some(PaymentMethod::CardPayment),
            WIRE_TRANSFER => Some(PaymentMethod::WireTransfer),
            _ => None,
        }
    }

    /// The stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::CardPayment => CARD_PAYMENT,
            PaymentMethod::WireTransfer => WIRE_TRANSFER,
        }
    }

    /// The customer-facing name.
    pub fn name(&self) -> &'static str {
        match self {
            PaymentMethod::CardPayment => "Credit/Debit Card Payment",
            PaymentMethod::WireTransfer => "Wire Transfer",
        }
    }

    /// The processing-fee rate as a fraction of the order subtotal.
    pub fn rate(&self, config: &CheckoutConfig) -> Decimal {
        match self {
            PaymentMethod::CardPayment => config.payment_processing_fee,
            PaymentMethod::WireTransfer => Decimal::ZERO,
        }
    }

    /// Whether a payment instrument must be captured before submission.
    pub fn is_payment_data_required(&self) -> bool {
        match self {
            PaymentMethod::CardPayment => true,
            PaymentMethod::WireTransfer => false,
        }
    }

    /// Computes the processing fee for an order, rounded to the minor unit.
    ///
    /// The fee itself attracts no tax, so the inclusive price equals the
    /// exclusive one.
    pub fn calculate(&self, order: &Order, config: &CheckoutConfig) -> Price {
        let fee = round_to_minor_unit(order.subtotal() * self.rate(config));
        Price::with_tax(&order.currency, fee, Decimal::ZERO)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Line;
    use common::{BasketId, OrderNumber};
    use rust_decimal_macros::dec;

    fn order(subtotal_lines: Vec<Line>) -> Order {
        Order::new(
            OrderNumber::new("100001"),
            BasketId::new(),
            "USD",
            subtotal_lines,
        )
    }

    #[test]
    fn card_fee_is_three_and_a_half_percent() {
        let config = CheckoutConfig::default();
        let order = order(vec![Line::new("A", 1, dec!(100.00)).unwrap()]);
        let fee = PaymentMethod::CardPayment.calculate(&order, &config);
        assert_eq!(fee.excl_tax, dec!(3.50));
        assert_eq!(fee.incl_tax, Some(dec!(3.50)));
    }

    #[test]
    fn card_fee_uses_bankers_rounding() {
        let config = CheckoutConfig::default();
        // 47.50 * 0.035 = 1.6625, half-even to 1.66
        let order = order(vec![Line::new("A", 1, dec!(47.50)).unwrap()]);
        let fee = PaymentMethod::CardPayment.calculate(&order, &config);
        assert_eq!(fee.excl_tax, dec!(1.66));
    }

    #[test]
    fn wire_transfer_has_no_fee_and_needs_no_payment_data() {
        let config = CheckoutConfig::default();
        let order = order(vec![Line::new("A", 1, dec!(100.00)).unwrap()]);
        let fee = PaymentMethod::WireTransfer.calculate(&order, &config);
        assert_eq!(fee.excl_tax, Decimal::ZERO);
        assert!(!PaymentMethod::WireTransfer.is_payment_data_required());
        assert!(PaymentMethod::CardPayment.is_payment_data_required());
    }

    #[test]
    fn codes_roundtrip() {
        assert_eq!(
            PaymentMethod::from_code(CARD_PAYMENT),
            Some(PaymentMethod::CardPayment)
        );
        assert_eq!(
            PaymentMethod::from_code(WIRE_TRANSFER),
            Some(PaymentMethod::WireTransfer)
        );
        assert_eq!(PaymentMethod::from_code("cheque"), None);
        assert_eq!(PaymentMethod::CardPayment.code(), "card_payment");
    }
}
