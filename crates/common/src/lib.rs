//! Shared types for the checkout core.
//!
//! This crate provides the identifier newtypes and the tax-aware `Price`
//! value object that every other crate in the workspace builds on.

pub mod price;
pub mod types;

pub use price::{Price, round_to_minor_unit};
pub use types::{BasketId, CustomerId, LineId, OrderNumber};
