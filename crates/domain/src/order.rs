//! Order and line records.

use chrono::{DateTime, Utc};
use common::{BasketId, CustomerId, LineId, OrderNumber};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::status::{LineStatus, OrderStatus};

/// A single line of an order.
///
/// Prices exclusive of tax are always known. Prices inclusive of tax are
/// `None` until a tax pipeline run has distributed tax onto the line: the
/// tax on a line is "known" iff `line_price_incl_tax` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub title: String,
    pub quantity: u32,
    pub status: LineStatus,
    pub unit_price_excl_tax: Decimal,
    pub unit_price_incl_tax: Option<Decimal>,
    pub line_price_before_discounts_excl_tax: Decimal,
    pub line_price_before_discounts_incl_tax: Option<Decimal>,
    pub discount_excl_tax: Decimal,
    pub discount_incl_tax: Decimal,
    pub line_price_excl_tax: Decimal,
    pub line_price_incl_tax: Option<Decimal>,
}

impl Line {
    /// Creates a new line with tax not yet known and no discount.
    pub fn new(
        title: impl Into<String>,
        quantity: u32,
        unit_price_excl_tax: Decimal,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        let before_discounts = unit_price_excl_tax * Decimal::from(quantity);
        Ok(Self {
            id: LineId::new(),
            title: title.into(),
            quantity,
            status: LineStatus::Pending,
            unit_price_excl_tax,
            unit_price_incl_tax: None,
            line_price_before_discounts_excl_tax: before_discounts,
            line_price_before_discounts_incl_tax: None,
            discount_excl_tax: Decimal::ZERO,
            discount_incl_tax: Decimal::ZERO,
            line_price_excl_tax: before_discounts,
            line_price_incl_tax: None,
        })
    }

    /// Applies a discount to the line, keeping the price fields consistent.
    pub fn apply_discount(&mut self, discount: Decimal) {
        self.discount_excl_tax += discount;
        self.discount_incl_tax += discount;
        self.line_price_excl_tax = self.line_price_before_discounts_excl_tax - self.discount_excl_tax;
        if let Some(before) = self.line_price_before_discounts_incl_tax {
            self.line_price_incl_tax = Some(before - self.discount_incl_tax);
        }
    }

    /// Returns true once the inclusive-of-tax line price has been set.
    pub fn is_tax_known(&self) -> bool {
        self.line_price_incl_tax.is_some()
    }

    /// Adds a distributed tax amount into the line's inclusive-tax fields.
    ///
    /// On the first call the inclusive fields are seeded from their
    /// exclusive counterparts, so adding a zero amount is how a zero-rated
    /// contribution marks the line's tax as known.
    pub fn add_tax(&mut self, per_line: Decimal, per_unit: Decimal) {
        self.line_price_incl_tax =
            Some(self.line_price_incl_tax.unwrap_or(self.line_price_excl_tax) + per_line);
        self.line_price_before_discounts_incl_tax = Some(
            self.line_price_before_discounts_incl_tax
                .unwrap_or(self.line_price_before_discounts_excl_tax)
                + per_line,
        );
        self.unit_price_incl_tax =
            Some(self.unit_price_incl_tax.unwrap_or(self.unit_price_excl_tax) + per_unit);
    }
}

/// An append-only audit note on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// An order record.
///
/// Orders are created once, mutated by status changes and line edits, and
/// never deleted; notes provide the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub number: OrderNumber,
    pub user: Option<CustomerId>,
    pub guest_email: Option<String>,
    pub basket_id: BasketId,
    pub currency: String,
    pub status: OrderStatus,
    pub status_updated_at: DateTime<Utc>,
    pub payment_method_code: Option<String>,
    pub payment_method_name: Option<String>,
    pub total_excl_tax: Decimal,
    pub total_incl_tax: Decimal,
    pub shipping_excl_tax: Decimal,
    pub shipping_incl_tax: Decimal,
    pub lines: Vec<Line>,
    pub notes: Vec<OrderNote>,
}

impl Order {
    /// Creates a new order in the initial status with the given lines.
    pub fn new(
        number: OrderNumber,
        basket_id: BasketId,
        currency: impl Into<String>,
        lines: Vec<Line>,
    ) -> Self {
        let total_excl_tax = lines.iter().map(|l| l.line_price_excl_tax).sum();
        Self {
            number,
            user: None,
            guest_email: None,
            basket_id,
            currency: currency.into(),
            status: OrderStatus::New,
            status_updated_at: Utc::now(),
            payment_method_code: None,
            payment_method_name: None,
            total_excl_tax,
            total_incl_tax: Decimal::ZERO,
            shipping_excl_tax: Decimal::ZERO,
            shipping_incl_tax: Decimal::ZERO,
            lines,
            notes: Vec::new(),
        }
    }

    /// Returns the order subtotal: the sum of line prices exclusive of tax,
    /// without shipping. Tax contributions are computed against this value.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(|l| l.line_price_excl_tax).sum()
    }

    /// Returns true once every line's tax is known.
    pub fn is_tax_known(&self) -> bool {
        self.lines.iter().all(Line::is_tax_known)
    }

    /// Looks a line up by its stable ID.
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Appends an audit note.
    pub fn add_note(&mut self, message: impl Into<String>) {
        self.notes.push(OrderNote {
            at: Utc::now(),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order_with_lines(lines: Vec<Line>) -> Order {
        Order::new(OrderNumber::new("100001"), BasketId::new(), "USD", lines)
    }

    #[test]
    fn line_prices_scale_with_quantity() {
        let line = Line::new("Refurbished phone", 3, dec!(50.00)).unwrap();
        assert_eq!(line.line_price_before_discounts_excl_tax, dec!(150.00));
        assert_eq!(line.line_price_excl_tax, dec!(150.00));
        assert!(!line.is_tax_known());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = Line::new("Refurbished phone", 0, dec!(50.00)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { quantity: 0 }));
    }

    #[test]
    fn discount_keeps_price_fields_consistent() {
        let mut line = Line::new("Refurbished phone", 2, dec!(50.00)).unwrap();
        line.add_tax(dec!(0.00), dec!(0.00));
        line.apply_discount(dec!(10.00));
        assert_eq!(line.line_price_excl_tax, dec!(90.00));
        assert_eq!(
            line.line_price_incl_tax.unwrap(),
            line.line_price_before_discounts_incl_tax.unwrap() - line.discount_incl_tax
        );
    }

    #[test]
    fn add_tax_seeds_inclusive_fields_from_exclusive() {
        let mut line = Line::new("Refurbished phone", 1, dec!(100.00)).unwrap();
        line.add_tax(dec!(3.50), dec!(3.50));
        assert_eq!(line.line_price_incl_tax, Some(dec!(103.50)));
        assert_eq!(line.unit_price_incl_tax, Some(dec!(103.50)));
        assert_eq!(line.line_price_before_discounts_incl_tax, Some(dec!(103.50)));
        assert!(line.is_tax_known());
    }

    #[test]
    fn adding_zero_tax_marks_tax_known() {
        let mut line = Line::new("Refurbished phone", 1, dec!(100.00)).unwrap();
        line.add_tax(dec!(0.00), dec!(0.00));
        assert!(line.is_tax_known());
        assert_eq!(line.line_price_incl_tax, Some(dec!(100.00)));
    }

    #[test]
    fn order_tax_known_requires_all_lines() {
        let mut order = order_with_lines(vec![
            Line::new("A", 1, dec!(10.00)).unwrap(),
            Line::new("B", 1, dec!(20.00)).unwrap(),
        ]);
        assert!(!order.is_tax_known());
        order.lines[0].add_tax(dec!(0.00), dec!(0.00));
        assert!(!order.is_tax_known());
        order.lines[1].add_tax(dec!(0.00), dec!(0.00));
        assert!(order.is_tax_known());
    }

    #[test]
    fn subtotal_sums_line_prices() {
        let order = order_with_lines(vec![
            Line::new("A", 2, dec!(10.00)).unwrap(),
            Line::new("B", 1, dec!(30.00)).unwrap(),
        ]);
        assert_eq!(order.subtotal(), dec!(50.00));
        assert_eq!(order.total_excl_tax, dec!(50.00));
    }

    #[test]
    fn notes_are_append_only() {
        let mut order = order_with_lines(vec![]);
        order.add_note("Order placed.");
        order.add_note("Order approved.");
        assert_eq!(order.notes.len(), 2);
        assert_eq!(order.notes[0].message, "Order placed.");
    }

    #[test]
    fn line_lookup_by_stable_id() {
        let order = order_with_lines(vec![Line::new("A", 1, dec!(10.00)).unwrap()]);
        let id = order.lines[0].id;
        assert!(order.line(id).is_some());
        assert!(order.line(LineId::new()).is_none());
    }
}
