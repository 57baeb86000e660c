use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery status of an order.
///
/// The first four variants form the delivery journey, in order. `Cancelled` is
/// only ever set from outside the tracker. Status strings that this crate does
/// not recognise deserialize to `Unknown` so stored orders stay readable.
///
/// The original string is not kept: an `Unknown` order serializes as
/// `"unknown"`, so writing it back or exporting it loses the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// The delivery journey, in the only order statuses may advance.
    pub const JOURNEY: [OrderStatus; 4] = [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Position of this status within [`Self::JOURNEY`].
    pub fn journey_index(self) -> Option<usize> {
        Self::JOURNEY.iter().position(|s| *s == self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
            image: None,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Represents a customer order, laid out the way the web client stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    #[serde(alias = "date")]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl Order {
    /// Whether `user_id` owns this order.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Returns a copy of this order carrying `status`.
    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Checkout payload for placing a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderCreate {
    /// Starts a checkout payload; `created_at` is stamped by the order client.
    pub fn new(user_id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            user_id: user_id.into(),
            items,
            delivery_address: None,
            special_instructions: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_delivery_address(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    pub fn with_special_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.special_instructions = Some(instructions.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_journey_positions() {
        assert_eq!(OrderStatus::Confirmed.journey_index(), Some(0));
        assert_eq!(OrderStatus::Delivered.journey_index(), Some(3));
        assert_eq!(OrderStatus::Cancelled.journey_index(), None);
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_reads_web_client_layout() {
        let raw = r#"{
            "id": "1718000000000",
            "userId": "user_1",
            "date": "2024-06-10T06:13:20Z",
            "status": "out_for_delivery",
            "items": [{"name": "Paneer Tikka", "price": 220.0, "quantity": 2}],
            "total": 440.0,
            "deliveryAddress": "12 MG Road"
        }"#;
        let order: Order = serde_json::from_str(raw).unwrap();
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert_eq!(order.user_id, "user_1");
        assert_eq!(order.delivery_address.as_deref(), Some("12 MG Road"));
        assert_eq!(order.special_instructions, None);

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["createdAt"], "2024-06-10T06:13:20Z");
        assert_eq!(json["status"], "out_for_delivery");
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let status: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"unknown\"");
    }
}
