//! Submission coordinator.
//!
//! Drives the payment flow end to end: apply taxes, freeze the order and
//! basket, charge the gateway, and place the order, compensating on
//! failure. The order status flag is the only guard against two requests
//! paying for the same order, so the freeze is persisted before any money
//! moves.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{OrderNumber, Price};
use domain::{Order, OrderStatus, PaymentMethod, TaxInfo};
use rust_decimal::Decimal;

use crate::error::CheckoutError;
use crate::gate::{self, Condition, GateContext, GateOutcome};
use crate::services::gateway::{ChargeReceipt, ChargeRequest, PaymentGateway};
use crate::services::notifier::{
    Notifier, ORDER_PAID, ORDER_PLACED_ADMIN_ALERT, PLACEMENT_FAILED_ADMIN_ALERT,
    WIRE_TRANSFER_ADMIN_ALERT,
};
use crate::services::repository::OrderRepository;
use crate::session::CheckoutSession;
use crate::submission::Submission;
use crate::taxes::{order_total, standard_codes, TaxRegistry};

/// Resolves a payment method from a customer-supplied code.
pub fn resolve_method(code: &str) -> Result<PaymentMethod, CheckoutError> {
    PaymentMethod::from_code(code).ok_or_else(|| CheckoutError::UnsupportedPaymentMethod {
        method: code.to_string(),
    })
}

/// An allocation of funds against an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSource {
    pub source_type: String,
    pub currency: String,
    pub amount_allocated: Decimal,
    pub amount_debited: Decimal,
    /// The gateway's reference. Absent for deferred methods where no
    /// charge has happened yet.
    pub reference: Option<String>,
    pub label: String,
}

/// A record of money actually moving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_type: String,
    pub amount: Decimal,
    pub reference: String,
    pub at: DateTime<Utc>,
}

/// Everything a successful submission produced.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub order: Order,
    pub receipt: Option<ChargeReceipt>,
    pub payment_source: Option<PaymentSource>,
    pub payment_event: Option<PaymentEvent>,
    /// Audit trail of the tax amounts applied, in application order.
    pub taxes: Vec<TaxInfo>,
}

/// Coordinates order submission against the repository, the payment
/// gateway, and the notification channel.
pub struct CheckoutCoordinator<R, G, N> {
    repository: R,
    gateway: G,
    notifier: N,
    config: Arc<domain::CheckoutConfig>,
}

impl<R, G, N> CheckoutCoordinator<R, G, N>
where
    R: OrderRepository,
    G: PaymentGateway,
    N: Notifier,
{
    /// Creates a new coordinator.
    pub fn new(
        repository: R,
        gateway: G,
        notifier: N,
        config: Arc<domain::CheckoutConfig>,
    ) -> Self {
        Self {
            repository,
            gateway,
            notifier,
            config,
        }
    }

    /// Runs the full pre-payment gate for a request.
    pub fn pre_payment_check(
        &self,
        order: &Order,
        submission: &Submission,
        method: Option<PaymentMethod>,
        payment_data_captured: bool,
    ) -> GateOutcome {
        let ctx = GateContext {
            order,
            user: submission.user,
            guest_email: submission.guest_email.as_deref(),
            basket: Some(&submission.basket),
            method,
            payment_data_captured,
            config: &self.config,
        };
        gate::check(
            &[
                Condition::UserOwnsOrder,
                Condition::OrderIsApproved,
                Condition::OrderHasNonZeroTotal,
                Condition::BasketHasMinimumQuantity,
                Condition::SkipUnlessPaymentDataRequired,
                Condition::PaymentDataCaptured,
            ],
            &ctx,
        )
    }

    /// Takes immediate payment for an approved order and places it.
    ///
    /// The working copy of the order accumulates taxes in memory; nothing
    /// is persisted until the freeze, and the taxed lines and totals are
    /// only written once the charge has settled. A failed charge leaves
    /// the stored order exactly as it was.
    #[tracing::instrument(skip(self, submission, session), fields(order = %number))]
    pub async fn submit(
        &self,
        number: &OrderNumber,
        method: PaymentMethod,
        submission: &mut Submission,
        session: &mut CheckoutSession,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        metrics::counter!("checkout_submissions_total").increment(1);
        let started = std::time::Instant::now();
        session.set_order_number(number.clone());
        session.set_submitted_basket(submission.basket.id);

        if !method.is_payment_data_required() {
            return Err(CheckoutError::MethodNotChargeable {
                method: method.code().to_string(),
            });
        }
        let token = submission
            .payment_token
            .clone()
            .ok_or_else(|| CheckoutError::PaymentDataMissing(number.clone()))?;

        let mut working = self.repository.load_order(number).await?;
        let registry = TaxRegistry::standard(method, submission.tax_region());
        let taxes = registry.apply(&standard_codes(method), &mut working, &self.config);

        if !working.is_tax_known() {
            return Err(CheckoutError::TaxNotKnown(number.clone()));
        }
        let total = order_total(&working, &submission.shipping_method.charge);
        let Some(total_incl) = total.incl_tax else {
            return Err(CheckoutError::TaxNotKnown(number.clone()));
        };

        // Persisted freeze: any concurrent submit now fails the status check.
        let prior = self.freeze(number).await?;
        if let Err(e) = submission.basket.freeze() {
            tracing::warn!(order = %number, error = %e, "could not freeze basket");
        }

        let request = ChargeRequest {
            order_number: number.clone(),
            amount: total_incl,
            currency: total.currency.clone(),
            token,
            description: format!("Order #{number}"),
            idempotency_key: format!("{number}:{total_incl}"),
        };

        let receipt = match self.gateway.charge(request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::warn!(order = %number, error = %e, "charge failed, restoring order");
                self.restore(number, &prior).await;
                if let Err(thaw_err) = submission.basket.thaw() {
                    tracing::warn!(order = %number, error = %thaw_err, "could not thaw basket");
                }
                metrics::counter!("checkout_failed").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                return Err(CheckoutError::Payment(e));
            }
        };

        // Money has moved. From here every failure is a placement failure
        // that staff must reconcile against the charge reference.
        let order = match self
            .place_order(number, working, method, submission, &total, total_incl)
            .await
        {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    order = %number,
                    reference = %receipt.reference,
                    error = %e,
                    "payment taken but order could not be placed"
                );
                self.restore(number, &prior).await;
                if let Err(alert_err) = self
                    .notifier
                    .send_admin_alert(number, PLACEMENT_FAILED_ADMIN_ALERT)
                    .await
                {
                    tracing::error!(order = %number, error = %alert_err, "failed to alert staff");
                }
                metrics::counter!("checkout_failed").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                return Err(CheckoutError::PlacementFailed {
                    number: number.clone(),
                    reference: receipt.reference,
                });
            }
        };

        if let Err(e) = submission.basket.submit() {
            tracing::warn!(order = %number, error = %e, "could not submit basket");
        }
        session.flush();
        self.notify_paid(number).await;

        let payment_source = PaymentSource {
            source_type: method.code().to_string(),
            currency: total.currency.clone(),
            amount_allocated: total_incl,
            amount_debited: total_incl,
            reference: Some(receipt.reference.clone()),
            label: receipt.instrument_label.clone(),
        };
        let payment_event = PaymentEvent {
            event_type: "Paid".to_string(),
            amount: total_incl,
            reference: receipt.reference.clone(),
            at: Utc::now(),
        };

        let duration = started.elapsed().as_secs_f64();
        metrics::counter!("checkout_completed").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(duration);
        tracing::info!(order = %number, amount = %total_incl, duration, "order paid and placed");

        Ok(SubmissionOutcome {
            order,
            receipt: Some(receipt),
            payment_source: Some(payment_source),
            payment_event: Some(payment_event),
            taxes,
        })
    }

    /// Places an order against a deferred payment method.
    ///
    /// No payment data is captured and no gateway call happens: the order
    /// moves to awaiting-funds, staff are alerted, and payment is recorded
    /// later when the transfer arrives.
    #[tracing::instrument(skip(self, submission, session), fields(order = %number))]
    pub async fn submit_deferred(
        &self,
        number: &OrderNumber,
        submission: &mut Submission,
        session: &mut CheckoutSession,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        metrics::counter!("checkout_submissions_total").increment(1);
        let started = std::time::Instant::now();
        session.set_order_number(number.clone());
        session.set_submitted_basket(submission.basket.id);
        let method = PaymentMethod::WireTransfer;

        let mut working = self.repository.load_order(number).await?;
        let registry = TaxRegistry::standard(method, submission.tax_region());
        let taxes = registry.apply(&standard_codes(method), &mut working, &self.config);

        if !working.is_tax_known() {
            return Err(CheckoutError::TaxNotKnown(number.clone()));
        }
        let total = order_total(&working, &submission.shipping_method.charge);
        let Some(total_incl) = total.incl_tax else {
            return Err(CheckoutError::TaxNotKnown(number.clone()));
        };

        if let Err(e) = submission.basket.freeze() {
            tracing::warn!(order = %number, error = %e, "could not freeze basket");
        }

        let mut stored = self.repository.load_order(number).await?;
        apply_submission(&mut stored, &working, method, submission, &total, total_incl);
        let result: Result<(), CheckoutError> = async {
            self.config
                .pipeline
                .transition(&mut stored, OrderStatus::AwaitingWireTransfer)?;
            for line in &stored.lines {
                self.repository.save_line(number, line).await?;
            }
            self.repository.save_order(&stored).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            if let Err(thaw_err) = submission.basket.thaw() {
                tracing::warn!(order = %number, error = %thaw_err, "could not thaw basket");
            }
            metrics::counter!("checkout_failed").increment(1);
            return Err(e);
        }

        if let Err(e) = submission.basket.submit() {
            tracing::warn!(order = %number, error = %e, "could not submit basket");
        }
        session.flush();

        if let Err(e) = self
            .notifier
            .send_admin_alert(number, WIRE_TRANSFER_ADMIN_ALERT)
            .await
        {
            tracing::error!(order = %number, error = %e, "failed to alert staff");
        }

        let payment_source = PaymentSource {
            source_type: method.code().to_string(),
            currency: total.currency.clone(),
            amount_allocated: total_incl,
            amount_debited: Decimal::ZERO,
            reference: None,
            label: method.name().to_string(),
        };

        let duration = started.elapsed().as_secs_f64();
        metrics::counter!("checkout_completed").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(duration);
        tracing::info!(order = %number, amount = %total_incl, duration, "order placed, awaiting wire transfer");

        Ok(SubmissionOutcome {
            order: stored,
            receipt: None,
            payment_source: Some(payment_source),
            payment_event: None,
            taxes,
        })
    }

    /// Returns orders stuck in the frozen payment status for longer than
    /// `older_than`, for manual review.
    pub async fn stuck_orders(
        &self,
        older_than: Duration,
    ) -> Result<Vec<OrderNumber>, CheckoutError> {
        let stuck = self
            .repository
            .orders_stuck_in_payment(older_than, Utc::now())
            .await?;
        if !stuck.is_empty() {
            tracing::warn!(count = stuck.len(), "orders stuck in payment");
        }
        Ok(stuck)
    }

    /// Persists the payment-in-progress freeze. Returns the full pre-freeze
    /// order so a failed attempt can be rolled back exactly.
    async fn freeze(&self, number: &OrderNumber) -> Result<Order, CheckoutError> {
        let mut stored = self.repository.load_order(number).await?;
        let prior = stored.clone();
        self.config
            .pipeline
            .transition(&mut stored, OrderStatus::PaymentInProgress)?;
        self.repository.save_order(&stored).await?;
        Ok(prior)
    }

    /// Rolls a frozen order back to its pre-attempt state: status, lines,
    /// and totals. Rewriting the lines matters as much as the status; a
    /// line left with tax already folded in would accumulate a second fee
    /// on the next attempt. Failures are logged, not propagated: the caller
    /// is already reporting a payment error and the sweep will find the
    /// order if the rollback is lost.
    async fn restore(&self, number: &OrderNumber, prior: &Order) {
        let result: Result<(), CheckoutError> = async {
            let mut stored = self.repository.load_order(number).await?;
            self.config.pipeline.transition(&mut stored, prior.status)?;
            stored.lines = prior.lines.clone();
            stored.total_excl_tax = prior.total_excl_tax;
            stored.total_incl_tax = prior.total_incl_tax;
            stored.shipping_excl_tax = prior.shipping_excl_tax;
            stored.shipping_incl_tax = prior.shipping_incl_tax;
            for line in &stored.lines {
                self.repository.save_line(number, line).await?;
            }
            self.repository.save_order(&stored).await?;
            Ok(())
        }
        .await;
        if let Err(e) = result {
            tracing::error!(order = %number, error = %e, "failed to restore order after payment failure");
        }
    }

    /// Writes the paid order: payment method, totals, taxed lines, status.
    ///
    /// The order write comes first; the per-line writes only run once it
    /// has succeeded, so a failed placement leaves no taxed lines behind
    /// for a retry to stack tax onto.
    async fn place_order(
        &self,
        number: &OrderNumber,
        working: Order,
        method: PaymentMethod,
        submission: &Submission,
        total: &Price,
        total_incl: Decimal,
    ) -> Result<Order, CheckoutError> {
        let mut stored = self.repository.load_order(number).await?;
        apply_submission(&mut stored, &working, method, submission, total, total_incl);
        self.config
            .pipeline
            .transition(&mut stored, OrderStatus::Paid)?;
        self.repository.save_order(&stored).await?;
        for line in &stored.lines {
            self.repository.save_line(number, line).await?;
        }
        Ok(stored)
    }

    async fn notify_paid(&self, number: &OrderNumber) {
        if let Err(e) = self.notifier.send_customer_message(number, ORDER_PAID).await {
            tracing::error!(order = %number, error = %e, "failed to send paid notification");
        }
        if let Err(e) = self
            .notifier
            .send_admin_alert(number, ORDER_PLACED_ADMIN_ALERT)
            .await
        {
            tracing::error!(order = %number, error = %e, "failed to alert staff");
        }
    }
}

/// Copies the submission's outcome onto the stored order: payer identity,
/// payment method, taxed lines, and totals.
fn apply_submission(
    stored: &mut Order,
    working: &Order,
    method: PaymentMethod,
    submission: &Submission,
    total: &Price,
    total_incl: Decimal,
) {
    if submission.user.is_some() {
        stored.user = submission.user;
    }
    if submission.guest_email.is_some() {
        stored.guest_email = submission.guest_email.clone();
    }
    stored.payment_method_code = Some(method.code().to_string());
    stored.payment_method_name = Some(method.name().to_string());
    stored.lines = working.lines.clone();
    stored.total_excl_tax = total.excl_tax;
    stored.total_incl_tax = total_incl;
    stored.shipping_excl_tax = submission.shipping_method.charge.excl_tax;
    stored.shipping_incl_tax = submission
        .shipping_method
        .charge
        .incl_tax
        .unwrap_or(submission.shipping_method.charge.excl_tax);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_code_is_rejected() {
        let err = resolve_method("cheque").unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::UnsupportedPaymentMethod { method } if method == "cheque"
        ));
        assert_eq!(
            resolve_method("card_payment").unwrap(),
            PaymentMethod::CardPayment
        );
    }
}
