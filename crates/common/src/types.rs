use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an order.
///
/// Order numbers are generated once, when a basket is first submitted for
/// order placement, and are stable for the lifetime of the order. They are
/// used as the idempotency key for payment requests, so they must exist
/// before any gateway call is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Creates an order number from an existing value.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Generates a fresh order number.
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(raw[..12].to_uppercase())
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Creates a new random customer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a customer ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasketId(Uuid);

impl BasketId {
    /// Creates a new random basket ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BasketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BasketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for an order line.
///
/// Lines are always addressed by this ID. Matching lines by recomputed
/// product or stock-record references is fragile under concurrent edits
/// and is deliberately not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Creates a new random line ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_generate_creates_unique_values() {
        let a = OrderNumber::generate();
        let b = OrderNumber::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 12);
    }

    #[test]
    fn order_number_display_matches_value() {
        let number = OrderNumber::new("100042");
        assert_eq!(number.to_string(), "100042");
    }

    #[test]
    fn order_number_serialization_is_transparent() {
        let number = OrderNumber::new("100042");
        let json = serde_json::to_string(&number).unwrap();
        assert_eq!(json, "\"100042\"");
    }

    #[test]
    fn customer_id_new_creates_unique_ids() {
        assert_ne!(CustomerId::new(), CustomerId::new());
    }

    #[test]
    fn line_id_new_creates_unique_ids() {
        assert_ne!(LineId::new(), LineId::new());
    }
}
