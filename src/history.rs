//! Per-user order history for the history screen.

use tracing::instrument;
use crate::clients::OrderClient;
use crate::domain::{Order, OrderStatus};
use crate::order_actor::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderStats {
    pub total_orders: usize,
    pub total_spent: f64,
    pub delivered: usize,
    /// Neither delivered nor cancelled
    pub pending: usize,
    pub cancelled: usize,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut stats, order| {
            stats.total_orders += 1;
            stats.total_spent += order.total;
            match order.status {
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
                _ => stats.pending += 1,
            }
            stats
        })
    }
}

#[derive(Clone)]
pub struct OrderHistory {
    orders: OrderClient,
}

impl OrderHistory {
    pub fn new(orders: OrderClient) -> Self {
        Self { orders }
    }

    /// The user's orders, most recent first.
    #[instrument(skip(self))]
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.orders.list_orders(user_id).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(orders)
    }

    pub async fn stats(&self, user_id: &str) -> Result<OrderStats, OrderError> {
        let orders = self.orders.list_orders(user_id).await?;
        Ok(OrderStats::from_orders(&orders))
    }

    /// The user's history as a pretty-printed JSON array, in stored layout.
    pub async fn export_json(&self, user_id: &str) -> Result<String, OrderError> {
        let orders = self.for_user(user_id).await?;
        serde_json::to_string_pretty(&orders).map_err(|e| OrderError::SerializationError(e.to_string()))
    }
}
