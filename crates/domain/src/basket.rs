//! Basket with its Open/Frozen/Submitted flag.

use common::BasketId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle flag of a basket.
///
/// This is a state flag, not a lock: the basket's own write path rejects
/// mutation while frozen, but concurrent-request protection lives at the
/// persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BasketStatus {
    /// Basket accepts mutation.
    #[default]
    Open,

    /// A payment attempt is in flight; mutation is rejected.
    Frozen,

    /// The basket has been turned into an order.
    Submitted,
}

/// Errors from basket operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BasketError {
    /// The basket cannot be mutated in its current status.
    #[error("basket {id} is {status:?} and cannot be modified")]
    NotOpen { id: BasketId, status: BasketStatus },

    /// The requested flag change is not valid from the current status.
    #[error("basket {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: BasketId,
        from: BasketStatus,
        to: BasketStatus,
    },
}

/// A pre-order basket.
///
/// Only the submission coordinator may drive the Open → Frozen → Submitted
/// transitions (or thaw a frozen basket back to Open after a failed payment
/// attempt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub id: BasketId,
    pub status: BasketStatus,
    pub num_items: u32,
}

impl Basket {
    /// Creates an open basket holding `num_items` items.
    pub fn new(num_items: u32) -> Self {
        Self {
            id: BasketId::new(),
            status: BasketStatus::Open,
            num_items,
        }
    }

    /// Adds items to the basket. Rejected unless the basket is open.
    pub fn add_items(&mut self, quantity: u32) -> Result<(), BasketError> {
        if self.status != BasketStatus::Open {
            return Err(BasketError::NotOpen {
                id: self.id,
                status: self.status,
            });
        }
        self.num_items += quantity;
        Ok(())
    }

    /// Freezes the basket ahead of a payment attempt.
    pub fn freeze(&mut self) -> Result<(), BasketError> {
        self.set_status(BasketStatus::Open, BasketStatus::Frozen)
    }

    /// Restores a frozen basket after a failed payment attempt.
    pub fn thaw(&mut self) -> Result<(), BasketError> {
        self.set_status(BasketStatus::Frozen, BasketStatus::Open)
    }

    /// Marks a frozen basket as submitted once the order is committed.
    pub fn submit(&mut self) -> Result<(), BasketError> {
        self.set_status(BasketStatus::Frozen, BasketStatus::Submitted)
    }

    fn set_status(&mut self, expected: BasketStatus, to: BasketStatus) -> Result<(), BasketError> {
        if self.status != expected {
            return Err(BasketError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_basket_accepts_items() {
        let mut basket = Basket::new(2);
        basket.add_items(3).unwrap();
        assert_eq!(basket.num_items, 5);
    }

    #[test]
    fn frozen_basket_rejects_mutation() {
        let mut basket = Basket::new(2);
        basket.freeze().unwrap();
        let err = basket.add_items(1).unwrap_err();
        assert!(matches!(err, BasketError::NotOpen { .. }));
        assert_eq!(basket.num_items, 2);
    }

    #[test]
    fn freeze_submit_lifecycle() {
        let mut basket = Basket::new(5);
        basket.freeze().unwrap();
        assert_eq!(basket.status, BasketStatus::Frozen);
        basket.submit().unwrap();
        assert_eq!(basket.status, BasketStatus::Submitted);
    }

    #[test]
    fn thaw_restores_open_status() {
        let mut basket = Basket::new(5);
        basket.freeze().unwrap();
        basket.thaw().unwrap();
        assert_eq!(basket.status, BasketStatus::Open);
        basket.add_items(1).unwrap();
    }

    #[test]
    fn cannot_freeze_twice() {
        let mut basket = Basket::new(5);
        basket.freeze().unwrap();
        assert!(basket.freeze().is_err());
    }

    #[test]
    fn cannot_submit_open_basket() {
        let mut basket = Basket::new(5);
        assert!(basket.submit().is_err());
    }
}
