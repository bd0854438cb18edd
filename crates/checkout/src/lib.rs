//! Order checkout and payment submission.
//!
//! The flow: a placed order waits for staff approval, the customer then
//! pays for it through the pre-payment gate, the tax pipeline prices the
//! order, and the coordinator freezes it, charges the gateway, and places
//! it, compensating if anything fails along the way.

pub mod coordinator;
pub mod error;
pub mod gate;
pub mod processing;
pub mod services;
pub mod session;
pub mod submission;
pub mod taxes;

pub use coordinator::{
    resolve_method, CheckoutCoordinator, PaymentEvent, PaymentSource, SubmissionOutcome,
};
pub use error::CheckoutError;
pub use gate::{check, Condition, GateContext, GateOutcome, RedirectTarget};
pub use processing::OrderEventHandler;
pub use session::CheckoutSession;
pub use submission::{ShippingMethod, Submission};
pub use taxes::{order_total, standard_codes, TaxRegistry};
