//! Tax application and order total calculation.
//!
//! Contributions compute a single amount against the order subtotal; this
//! module spreads that amount across the order's lines and recomputes the
//! order total from the lines afterwards. All intermediate division passes
//! through [`round_to_minor_unit`], so per-line drift never exceeds one
//! minor unit.

use std::collections::HashMap;

use common::{round_to_minor_unit, Price};
use domain::{CheckoutConfig, Order, PaymentMethod, TaxContribution, TaxInfo, US_STATE_SALES_TAX};
use rust_decimal::Decimal;

/// An explicit map from tax code to contribution.
///
/// Codes not present in the registry are logged and skipped: an unknown
/// code means the tax was already folded into the prices upstream, and
/// silently recomputing it would double-charge.
#[derive(Debug, Clone)]
pub struct TaxRegistry {
    entries: HashMap<String, TaxContribution>,
}

impl TaxRegistry {
    /// Builds an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a contribution under its own code.
    pub fn register(&mut self, contribution: TaxContribution) {
        self.entries
            .insert(contribution.code().to_string(), contribution);
    }

    /// The standard registry: the chosen method's processing fee plus the
    /// sales tax for the shipping region.
    pub fn standard(method: PaymentMethod, region: Option<String>) -> Self {
        let mut registry = Self::new();
        registry.register(TaxContribution::PaymentMethodFee { method });
        registry.register(TaxContribution::JurisdictionSalesTax { region });
        registry
    }

    /// Looks up a contribution by code.
    pub fn get(&self, code: &str) -> Option<&TaxContribution> {
        self.entries.get(code)
    }

    /// Applies the contributions named by `codes` to the order's lines, in
    /// the given sequence, and returns the audit trail of computed amounts.
    ///
    /// Each applied contribution distributes its amount evenly: the
    /// per-line share is the amount divided by the line count, the per-unit
    /// share is the per-line share divided by the line's quantity, each
    /// rounded to the minor unit. Applying a zero amount still marks the
    /// lines' tax as known.
    pub fn apply(
        &self,
        codes: &[&str],
        order: &mut Order,
        config: &CheckoutConfig,
    ) -> Vec<TaxInfo> {
        let mut applied = Vec::new();

        for code in codes {
            let Some(contribution) = self.get(code) else {
                tracing::debug!(
                    order = %order.number,
                    code,
                    "no contribution registered for tax code; assuming it was applied upstream"
                );
                continue;
            };

            let Some(info) = contribution.calculate(order, config) else {
                continue;
            };

            distribute(order, info.amount);
            tracing::info!(
                order = %order.number,
                code,
                amount = %info.amount,
                "applied tax contribution"
            );
            applied.push(info);
        }

        applied
    }
}

impl Default for TaxRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard sequence of tax codes applied at checkout.
pub fn standard_codes(method: PaymentMethod) -> [&'static str; 2] {
    [method.code(), US_STATE_SALES_TAX]
}

fn distribute(order: &mut Order, amount: Decimal) {
    let line_count = order.lines.len();
    if line_count == 0 {
        return;
    }
    let per_line = round_to_minor_unit(amount / Decimal::from(line_count));
    for line in order.lines.iter_mut() {
        let per_unit = round_to_minor_unit(per_line / Decimal::from(line.quantity));
        line.add_tax(per_line, per_unit);
    }
}

/// Computes an order total from its lines plus a shipping charge.
///
/// The total is the sum of line prices, not a recomputation from rates:
/// whatever rounding the distribution produced is what the customer pays.
/// The inclusive total exists only once every line's tax is known and the
/// shipping charge's tax is known.
pub fn order_total(order: &Order, shipping_charge: &Price) -> Price {
    let excl_tax = order
        .lines
        .iter()
        .map(|l| l.line_price_excl_tax)
        .sum::<Decimal>()
        + shipping_charge.excl_tax;

    let incl_tax = order
        .lines
        .iter()
        .map(|l| l.line_price_incl_tax)
        .try_fold(Decimal::ZERO, |acc, incl| incl.map(|v| acc + v))
        .and_then(|lines_incl| shipping_charge.incl_tax.map(|s| lines_incl + s));

    Price {
        currency: order.currency.clone(),
        excl_tax,
        incl_tax,
    }
}
