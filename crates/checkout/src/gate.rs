//! Pre-payment gate.
//!
//! Every entry point into the payment flow runs a list of conditions
//! before doing anything else. A condition never fails with an error:
//! it either lets the request proceed, redirects the customer somewhere
//! with an explanation, or skips them forward past a step they do not
//! need. The first non-proceed outcome wins.

use common::CustomerId;
use domain::{Basket, CheckoutConfig, Order, OrderStatus, PaymentMethod};

/// Where a redirected or skipped-forward request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    OrderList,
    OrderDetail,
    BasketSummary,
    PaymentDetails,
    Preview,
}

/// The outcome of evaluating gate conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// All conditions passed.
    Proceed,

    /// The request must be turned away, with messages for the customer.
    Redirect {
        target: RedirectTarget,
        messages: Vec<String>,
    },

    /// The customer may jump forward, skipping steps they do not need.
    SkipTo { target: RedirectTarget },
}

impl GateOutcome {
    /// Returns true for the `Proceed` outcome.
    pub fn is_proceed(&self) -> bool {
        matches!(self, GateOutcome::Proceed)
    }
}

/// Everything a condition may inspect.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub order: &'a Order,
    pub user: Option<CustomerId>,
    pub guest_email: Option<&'a str>,
    pub basket: Option<&'a Basket>,
    pub method: Option<PaymentMethod>,
    pub payment_data_captured: bool,
    pub config: &'a CheckoutConfig,
}

/// A single gate condition. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// The requesting identity must match the order's account, or its
    /// captured guest email for anonymous orders.
    UserOwnsOrder,

    /// Payment may only be taken against approved orders.
    OrderIsApproved,

    /// Zero-total orders are barred from payment capture outright.
    OrderHasNonZeroTotal,

    /// The basket must hold the configured minimum number of items.
    BasketHasMinimumQuantity,

    /// The chosen method needs a captured payment instrument.
    PaymentDataCaptured,

    /// Methods that need no payment data skip the payment-details step.
    SkipUnlessPaymentDataRequired,
}

impl Condition {
    /// Evaluates this condition against the context.
    pub fn evaluate(&self, ctx: &GateContext<'_>) -> GateOutcome {
        match self {
            Condition::UserOwnsOrder => {
                let owned = match (ctx.order.user, ctx.order.guest_email.as_deref()) {
                    (Some(owner), _) => ctx.user == Some(owner),
                    (None, Some(email)) => ctx.guest_email == Some(email),
                    (None, None) => true,
                };
                if owned {
                    GateOutcome::Proceed
                } else {
                    GateOutcome::Redirect {
                        target: RedirectTarget::OrderList,
                        messages: vec!["That order is not yours to pay for.".to_string()],
                    }
                }
            }
            Condition::OrderIsApproved => {
                if ctx.order.status == OrderStatus::Approved {
                    GateOutcome::Proceed
                } else {
                    GateOutcome::Redirect {
                        target: RedirectTarget::OrderDetail,
                        messages: vec![format!(
                            "Order {} cannot be paid for while it is '{}'.",
                            ctx.order.number, ctx.order.status
                        )],
                    }
                }
            }
            Condition::OrderHasNonZeroTotal => {
                if ctx.order.total_excl_tax.is_zero() && ctx.order.total_incl_tax.is_zero() {
                    GateOutcome::Redirect {
                        target: RedirectTarget::OrderDetail,
                        messages: vec![format!(
                            "Order {} has a zero total; its total must be non-zero to take payment.",
                            ctx.order.number
                        )],
                    }
                } else {
                    GateOutcome::Proceed
                }
            }
            Condition::BasketHasMinimumQuantity => match ctx.basket {
                Some(basket) if basket.num_items < ctx.config.min_basket_quantity => {
                    GateOutcome::Redirect {
                        target: RedirectTarget::BasketSummary,
                        messages: vec![format!(
                            "You need to purchase a minimum of {} items.",
                            ctx.config.min_basket_quantity
                        )],
                    }
                }
                _ => GateOutcome::Proceed,
            },
            Condition::PaymentDataCaptured => match ctx.method {
                Some(method) if method.is_payment_data_required() && !ctx.payment_data_captured => {
                    GateOutcome::Redirect {
                        target: RedirectTarget::PaymentDetails,
                        messages: vec!["Please enter your payment details.".to_string()],
                    }
                }
                _ => GateOutcome::Proceed,
            },
            Condition::SkipUnlessPaymentDataRequired => match ctx.method {
                Some(method) if !method.is_payment_data_required() => GateOutcome::SkipTo {
                    target: RedirectTarget::Preview,
                },
                _ => GateOutcome::Proceed,
            },
        }
    }
}

/// Evaluates conditions in order; the first non-proceed outcome wins.
pub fn check(conditions: &[Condition], ctx: &GateContext<'_>) -> GateOutcome {
    for condition in conditions {
        let outcome = condition.evaluate(ctx);
        if !outcome.is_proceed() {
            tracing::info!(
                order = %ctx.order.number,
                condition = ?condition,
                outcome = ?outcome,
                "gate condition stopped the request"
            );
            return outcome;
        }
    }
    GateOutcome::Proceed
}
