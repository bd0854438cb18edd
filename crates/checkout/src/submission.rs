//! The submission bundle handed to the coordinator.

use common::{CustomerId, Price};
use domain::{Address, Basket, CheckoutConfig};

/// A shipping method with its charge.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingMethod {
    pub name: String,
    pub charge: Price,
}

impl ShippingMethod {
    /// The flat-rate standard shipping method from configuration.
    pub fn standard(config: &CheckoutConfig) -> Self {
        Self {
            name: "Standard shipping".to_string(),
            charge: Price {
                currency: config.currency.clone(),
                excl_tax: config.shipping_charge_excl_tax,
                incl_tax: Some(config.shipping_charge_incl_tax),
            },
        }
    }
}

/// Everything collected during checkout, gathered into one value before
/// payment is attempted.
#[derive(Debug, Clone)]
pub struct Submission {
    pub user: Option<CustomerId>,
    pub basket: Basket,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub shipping_method: ShippingMethod,
    pub guest_email: Option<String>,
    /// Tokenized payment instrument, captured earlier in the flow. Absent
    /// for methods that need no payment data.
    pub payment_token: Option<String>,
}

impl Submission {
    /// The region code used for sales tax lookup, from the shipping address.
    pub fn tax_region(&self) -> Option<String> {
        self.shipping_address
            .as_ref()
            .and_then(Address::region_code)
    }
}
