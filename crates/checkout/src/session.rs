//! Per-customer checkout session state.

use common::{BasketId, OrderNumber};
use domain::PaymentMethod;
use serde::{Deserialize, Serialize};

/// Mutable checkout state carried across a customer's requests.
///
/// The session is scratch space, not a source of truth: it remembers which
/// order is being paid for and how, and is flushed once the flow completes
/// so a stale choice can never leak into the next checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    order_number: Option<OrderNumber>,
    payment_method: Option<PaymentMethod>,
    guest_email: Option<String>,
    submitted_basket: Option<BasketId>,
}

impl CheckoutSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the order this session is paying for.
    pub fn set_order_number(&mut self, number: OrderNumber) {
        self.order_number = Some(number);
    }

    /// The order being paid for, if one has been selected.
    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.order_number.as_ref()
    }

    /// Records the chosen payment method.
    pub fn pay_by(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    /// The chosen payment method.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Records the email of a guest checkout.
    pub fn set_guest_email(&mut self, email: impl Into<String>) {
        self.guest_email = Some(email.into());
    }

    /// The guest email, if checking out anonymously.
    pub fn guest_email(&self) -> Option<&str> {
        self.guest_email.as_deref()
    }

    /// Records the basket that was turned into an order.
    pub fn set_submitted_basket(&mut self, basket: BasketId) {
        self.submitted_basket = Some(basket);
    }

    /// The submitted basket, if any.
    pub fn submitted_basket(&self) -> Option<BasketId> {
        self.submitted_basket
    }

    /// Clears all checkout state.
    pub fn flush(&mut self) {
        *self = Self::default();
    }

    /// Returns true when no checkout state is held.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
