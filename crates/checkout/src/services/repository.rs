//! Order repository trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::OrderNumber;
use domain::{Line, Order, OrderStatus, PaymentMethod};
use thiserror::Error;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No order exists with the given number.
    #[error("order {0} not found")]
    OrderNotFound(OrderNumber),

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Persistence boundary for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order by number.
    async fn load_order(&self, number: &OrderNumber) -> Result<Order, RepositoryError>;

    /// Persists an order.
    ///
    /// Durable implementations must compare-and-swap on the order status:
    /// the write must fail if the stored status no longer matches the status
    /// the order was loaded with. The status flag is the only guard against
    /// two requests paying for the same order.
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Persists a single line of an order.
    async fn save_line(&self, number: &OrderNumber, line: &Line) -> Result<(), RepositoryError>;

    /// Returns the payment methods available for an order. Zero-total
    /// orders cannot be charged, so only the deferred method is offered.
    async fn payment_methods(&self, order: &Order) -> Result<Vec<PaymentMethod>, RepositoryError> {
        if order.total_incl_tax.is_zero() && order.total_excl_tax.is_zero() {
            Ok(vec![PaymentMethod::WireTransfer])
        } else {
            Ok(vec![PaymentMethod::CardPayment, PaymentMethod::WireTransfer])
        }
    }

    /// Returns orders that have sat in `PaymentInProgress` longer than
    /// `older_than`. A charge attempt that died between freeze and restore
    /// leaves the order here; a periodic sweep picks them up for manual
    /// review.
    async fn orders_stuck_in_payment(
        &self,
        older_than: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderNumber>, RepositoryError>;
}

#[derive(Debug, Default)]
struct InMemoryRepositoryState {
    orders: HashMap<OrderNumber, Order>,
    // Fails the n-th upcoming save_order call, counting down.
    fail_on_save_order_in: Option<u32>,
}

/// In-memory order repository for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryRepositoryState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an order into the store.
    pub fn insert(&self, order: Order) {
        self.state
            .write()
            .unwrap()
            .orders
            .insert(order.number.clone(), order);
    }

    /// Configures the repository to fail the n-th upcoming `save_order`
    /// call (1-based), succeeding before and after it.
    pub fn fail_on_save_order_in(&self, n: u32) {
        self.state.write().unwrap().fail_on_save_order_in = Some(n);
    }

    /// Returns a snapshot of a stored order.
    pub fn get(&self, number: &OrderNumber) -> Option<Order> {
        self.state.read().unwrap().orders.get(number).cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn load_order(&self, number: &OrderNumber) -> Result<Order, RepositoryError> {
        self.state
            .read()
            .unwrap()
            .orders
            .get(number)
            .cloned()
            .ok_or_else(|| RepositoryError::OrderNotFound(number.clone()))
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut state = self.state.write().unwrap();
        if let Some(n) = state.fail_on_save_order_in {
            if n <= 1 {
                state.fail_on_save_order_in = None;
                return Err(RepositoryError::Storage("write failed".to_string()));
            }
            state.fail_on_save_order_in = Some(n - 1);
        }
        state.orders.insert(order.number.clone(), order.clone());
        Ok(())
    }

    async fn save_line(&self, number: &OrderNumber, line: &Line) -> Result<(), RepositoryError> {
        let mut state = self.state.write().unwrap();
        let order = state
            .orders
            .get_mut(number)
            .ok_or_else(|| RepositoryError::OrderNotFound(number.clone()))?;
        match order.lines.iter_mut().find(|l| l.id == line.id) {
            Some(stored) => *stored = line.clone(),
            None => order.lines.push(line.clone()),
        }
        Ok(())
    }

    async fn orders_stuck_in_payment(
        &self,
        older_than: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderNumber>, RepositoryError> {
        let state = self.state.read().unwrap();
        Ok(state
            .orders
            .values()
            .filter(|o| {
                o.status == OrderStatus::PaymentInProgress
                    && now - o.status_updated_at > older_than
            })
            .map(|o| o.number.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BasketId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn order(number: &str) -> Order {
        Order::new(
            OrderNumber::new(number),
            BasketId::new(),
            "USD",
            vec![Line::new("A", 1, dec!(10.00)).unwrap()],
        )
    }

    #[tokio::test]
    async fn load_save_roundtrip() {
        let repo = InMemoryOrderRepository::new();
        let order = order("100001");
        repo.save_order(&order).await.unwrap();
        let loaded = repo.load_order(&order.number).await.unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        let err = repo.load_order(&OrderNumber::new("999999")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn save_line_updates_in_place() {
        let repo = InMemoryOrderRepository::new();
        let order = order("100001");
        let mut line = order.lines[0].clone();
        repo.save_order(&order).await.unwrap();

        line.add_tax(dec!(0.50), dec!(0.50));
        repo.save_line(&order.number, &line).await.unwrap();

        let loaded = repo.load_order(&order.number).await.unwrap();
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.lines[0].line_price_incl_tax, Some(dec!(10.50)));
    }

    #[tokio::test]
    async fn configured_save_failure_fires_once_at_the_right_call() {
        let repo = InMemoryOrderRepository::new();
        let order = order("100001");
        repo.fail_on_save_order_in(2);
        assert!(repo.save_order(&order).await.is_ok());
        assert!(repo.save_order(&order).await.is_err());
        assert!(repo.save_order(&order).await.is_ok());
    }

    #[tokio::test]
    async fn zero_total_orders_only_offer_wire_transfer() {
        let repo = InMemoryOrderRepository::new();
        let mut zero = order("100001");
        zero.total_excl_tax = Decimal::ZERO;
        zero.total_incl_tax = Decimal::ZERO;
        zero.lines.clear();

        let methods = repo.payment_methods(&zero).await.unwrap();
        assert_eq!(methods, vec![PaymentMethod::WireTransfer]);

        let paid = order("100002");
        let methods = repo.payment_methods(&paid).await.unwrap();
        assert!(methods.contains(&PaymentMethod::CardPayment));
    }

    #[tokio::test]
    async fn sweep_finds_stale_payment_in_progress_orders() {
        let repo = InMemoryOrderRepository::new();
        let mut stuck = order("100001");
        stuck.status = OrderStatus::PaymentInProgress;
        stuck.status_updated_at = Utc::now() - Duration::hours(2);
        repo.insert(stuck);

        let mut fresh = order("100002");
        fresh.status = OrderStatus::PaymentInProgress;
        repo.insert(fresh);

        let mut approved = order("100003");
        approved.status = OrderStatus::Approved;
        approved.status_updated_at = Utc::now() - Duration::hours(2);
        repo.insert(approved);

        let stuck_orders = repo
            .orders_stuck_in_payment(Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(stuck_orders, vec![OrderNumber::new("100001")]);
    }
}
