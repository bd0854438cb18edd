//! Tax-aware price value object.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounds a monetary amount to the currency's minor unit (2 decimal places)
/// using banker's rounding (round half to even).
///
/// Every division performed while distributing tax across lines must pass
/// through this function so that rounding drift never exceeds one minor unit
/// per line.
pub fn round_to_minor_unit(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// A price with an exclusive-of-tax amount and an optional inclusive-of-tax
/// amount.
///
/// The tax on a price is "known" once the inclusive amount has been set;
/// until then any tax-dependent step (such as taking payment) must refuse
/// to proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub currency: String,
    pub excl_tax: Decimal,
    pub incl_tax: Option<Decimal>,
}

impl Price {
    /// Creates a price whose tax is not yet known.
    pub fn tax_unknown(currency: impl Into<String>, excl_tax: Decimal) -> Self {
        Self {
            currency: currency.into(),
            excl_tax,
            incl_tax: None,
        }
    }

    /// Creates a price from an exclusive amount and a tax amount.
    pub fn with_tax(currency: impl Into<String>, excl_tax: Decimal, tax: Decimal) -> Self {
        Self {
            currency: currency.into(),
            excl_tax,
            incl_tax: Some(excl_tax + tax),
        }
    }

    /// Creates a zero price with known (zero) tax.
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::with_tax(currency, Decimal::ZERO, Decimal::ZERO)
    }

    /// Returns true once the inclusive-of-tax amount has been set.
    pub fn is_tax_known(&self) -> bool {
        self.incl_tax.is_some()
    }

    /// Returns the tax portion, if known.
    pub fn tax(&self) -> Option<Decimal> {
        self.incl_tax.map(|incl| incl - self.excl_tax)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.incl_tax {
            Some(incl) => write!(f, "{} {} (incl. tax)", incl, self.currency),
            None => write!(f, "{} {} (excl. tax)", self.excl_tax, self.currency),
        }
    }
}
