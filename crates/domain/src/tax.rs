//! Tax contributions.
//!
//! Each contribution computes a single tax amount against an order's
//! subtotal. Distributing the amount onto lines is the checkout pipeline's
//! job, not the contribution's.

use common::round_to_minor_unit;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CheckoutConfig;
use crate::order::Order;
use crate::payment_method::PaymentMethod;

/// Stable code for the US state sales tax contribution.
pub const US_STATE_SALES_TAX: &str = "us_state_sales_tax";

/// One computed tax amount, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxInfo {
    pub title: String,
    pub code: String,
    pub amount: Decimal,
}

/// A source of tax on an order. The set is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxContribution {
    /// The processing fee charged by the payment method, folded in as tax.
    PaymentMethodFee { method: PaymentMethod },

    /// Sales tax for the shipping address's region. Regions missing from
    /// the configured table are taxed at zero rather than rejected.
    JurisdictionSalesTax { region: Option<String> },
}

impl TaxContribution {
    /// The stable code this contribution is registered under.
    pub fn code(&self) -> &'static str {
        match self {
            TaxContribution::PaymentMethodFee { method } => method.code(),
            TaxContribution::JurisdictionSalesTax { .. } => US_STATE_SALES_TAX,
        }
    }

    /// Computes the tax amount for `order`, or `None` when this contribution
    /// does not apply at all.
    ///
    /// A zero-rated sales tax still returns `Some` with a zero amount: the
    /// tax is known, it just happens to be nothing. A fee-free payment
    /// method returns `None` because no fee contribution exists for it.
    pub fn calculate(&self, order: &Order, config: &CheckoutConfig) -> Option<TaxInfo> {
        match self {
            TaxContribution::PaymentMethodFee { method } => {
                let rate = method.rate(config);
                if rate.is_zero() {
                    return None;
                }
                Some(TaxInfo {
                    title: format!("{} ({}%)", method.name(), percent(rate)),
                    code: self.code().to_string(),
                    amount: round_to_minor_unit(order.subtotal() * rate),
                })
            }
            TaxContribution::JurisdictionSalesTax { region } => {
                let rate = config.sales_tax_rate(region.as_deref());
                let title = match region {
                    Some(r) => format!(
                        "{} state sales tax ({}%)",
                        r.trim().to_ascii_uppercase(),
                        percent(rate)
                    ),
                    None => format!("Sales tax ({}%)", percent(rate)),
                };
                Some(TaxInfo {
                    title,
                    code: self.code().to_string(),
                    amount: round_to_minor_unit(order.subtotal() * rate),
                })
            }
        }
    }
}

fn percent(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Line;
    use common::{BasketId, OrderNumber};
    use rust_decimal_macros::dec;

    fn order(unit_price: Decimal) -> Order {
        Order::new(
            OrderNumber::new("100001"),
            BasketId::new(),
            "USD",
            vec![Line::new("A", 1, unit_price).unwrap()],
        )
    }

    #[test]
    fn card_fee_contribution() {
        let config = CheckoutConfig::default();
        let contribution = TaxContribution::PaymentMethodFee {
            method: PaymentMethod::CardPayment,
        };
        let info = contribution.calculate(&order(dec!(100.00)), &config).unwrap();
        assert_eq!(info.amount, dec!(3.50));
        assert_eq!(info.code, "card_payment");
        assert_eq!(info.title, "Credit/Debit Card Payment (3.50%)");
    }

    #[test]
    fn wire_transfer_contributes_no_fee() {
        let config = CheckoutConfig::default();
        let contribution = TaxContribution::PaymentMethodFee {
            method: PaymentMethod::WireTransfer,
        };
        assert!(contribution.calculate(&order(dec!(100.00)), &config).is_none());
    }

    #[test]
    fn texas_sales_tax() {
        let config = CheckoutConfig::default();
        let contribution = TaxContribution::JurisdictionSalesTax {
            region: Some("tx".to_string()),
        };
        let info = contribution.calculate(&order(dec!(100.00)), &config).unwrap();
        assert_eq!(info.amount, dec!(6.25));
        assert_eq!(info.code, US_STATE_SALES_TAX);
        assert_eq!(info.title, "TX state sales tax (6.25%)");
    }

    #[test]
    fn unknown_region_is_zero_rated_but_still_known() {
        let config = CheckoutConfig::default();
        let contribution = TaxContribution::JurisdictionSalesTax {
            region: Some("ca".to_string()),
        };
        let info = contribution.calculate(&order(dec!(100.00)), &config).unwrap();
        assert_eq!(info.amount, Decimal::ZERO);
        assert_eq!(info.title, "CA state sales tax (0.00%)");
    }

    #[test]
    fn missing_region_is_zero_rated() {
        let config = CheckoutConfig::default();
        let contribution = TaxContribution::JurisdictionSalesTax { region: None };
        let info = contribution.calculate(&order(dec!(100.00)), &config).unwrap();
        assert_eq!(info.amount, Decimal::ZERO);
        assert_eq!(info.title, "Sales tax (0.00%)");
    }

    #[test]
    fn amounts_use_bankers_rounding() {
        let config = CheckoutConfig::default();
        let contribution = TaxContribution::JurisdictionSalesTax {
            region: Some("tx".to_string()),
        };
        // 26.00 * 0.0625 = 1.625, half-even to 1.62
        let info = contribution.calculate(&order(dec!(26.00)), &config).unwrap();
        assert_eq!(info.amount, dec!(1.62));
    }
}
