//! Service traits the checkout flow depends on, with in-memory
//! implementations for testing.

pub mod gateway;
pub mod notifier;
pub mod repository;

pub use gateway::{
    ChargeReceipt, ChargeRequest, GatewayError, InMemoryGateway, PaymentGateway,
};
pub use notifier::{
    InMemoryNotifier, Notifier, NotifierError, SentMessage, ORDER_APPROVED, ORDER_PAID,
    ORDER_PLACED_ADMIN_ALERT, PLACEMENT_FAILED_ADMIN_ALERT, WIRE_TRANSFER_ADMIN_ALERT,
};
pub use repository::{InMemoryOrderRepository, OrderRepository, RepositoryError};
