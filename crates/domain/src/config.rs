//! Checkout configuration.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pipeline::StatusPipeline;

/// Immutable checkout configuration, built once at startup.
///
/// Rates are plain fractions (0.035 is 3.5%). Sales tax rates are keyed by
/// lowercased region code; regions not in the table are taxed at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub currency: String,
    pub payment_processing_fee: Decimal,
    pub sales_tax_rates: HashMap<String, Decimal>,
    pub min_basket_quantity: u32,
    pub shipping_charge_excl_tax: Decimal,
    pub shipping_charge_incl_tax: Decimal,
    pub pipeline: StatusPipeline,
}

impl CheckoutConfig {
    /// Looks up the sales tax rate for a region code, case-insensitively.
    /// Unknown or absent regions are taxed at zero.
    pub fn sales_tax_rate(&self, region: Option<&str>) -> Decimal {
        region
            .map(|r| r.trim().to_ascii_lowercase())
            .and_then(|r| self.sales_tax_rates.get(&r).copied())
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        let tax_rate = Decimal::new(625, 4); // 6.25%
        Self {
            currency: "USD".to_string(),
            payment_processing_fee: Decimal::new(35, 3), // 3.5%
            sales_tax_rates: HashMap::from([
                ("tx".to_string(), tax_rate),
                ("texas".to_string(), tax_rate),
            ]),
            min_basket_quantity: 5,
            shipping_charge_excl_tax: Decimal::new(1500, 2),
            shipping_charge_incl_tax: Decimal::new(3000, 2),
            pipeline: StatusPipeline::canonical(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn known_region_rates() {
        let config = CheckoutConfig::default();
        assert_eq!(config.sales_tax_rate(Some("tx")), dec!(0.0625));
        assert_eq!(config.sales_tax_rate(Some("Texas")), dec!(0.0625));
        assert_eq!(config.sales_tax_rate(Some(" TX ")), dec!(0.0625));
    }

    #[test]
    fn unknown_region_is_zero_rated() {
        let config = CheckoutConfig::default();
        assert_eq!(config.sales_tax_rate(Some("ca")), Decimal::ZERO);
        assert_eq!(config.sales_tax_rate(None), Decimal::ZERO);
    }

    #[test]
    fn default_values() {
        let config = CheckoutConfig::default();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.payment_processing_fee, dec!(0.035));
        assert_eq!(config.min_basket_quantity, 5);
        assert_eq!(config.shipping_charge_excl_tax, dec!(15.00));
        assert_eq!(config.shipping_charge_incl_tax, dec!(30.00));
    }
}
