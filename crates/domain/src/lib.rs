//! Domain model for the checkout core.
//!
//! This crate provides:
//! - the `Order`/`Line` records with tax-aware price fields
//! - the `Basket` with its Open/Frozen/Submitted flag
//! - the order-status state machine (`StatusPipeline`) with line cascade
//! - the closed set of payment methods and tax contributions
//! - the immutable `CheckoutConfig` built once at startup

pub mod address;
pub mod basket;
pub mod config;
pub mod error;
pub mod order;
pub mod payment_method;
pub mod pipeline;
pub mod status;
pub mod tax;

pub use address::Address;
pub use basket::{Basket, BasketError, BasketStatus};
pub use config::CheckoutConfig;
pub use error::OrderError;
pub use order::{Line, Order, OrderNote};
pub use payment_method::{CARD_PAYMENT, PaymentMethod, WIRE_TRANSFER};
pub use pipeline::StatusPipeline;
pub use status::{LineStatus, OrderStatus};
pub use tax::{TaxContribution, TaxInfo, US_STATE_SALES_TAX};
