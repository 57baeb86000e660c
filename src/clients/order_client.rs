use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use crate::actor_framework::ResourceClient;
use crate::clock::Clock;
use crate::domain::{Order, OrderCreate, OrderStatus};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};

/// A write that went through this store, published on the change feed.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Upserted { order_id: String, status: OrderStatus },
    Cleared { user_id: String, removed: usize },
}

impl StoreChange {
    /// Whether this change may have touched `order_id`.
    pub fn concerns(&self, order_id: &str) -> bool {
        match self {
            Self::Upserted { order_id: id, .. } => id == order_id,
            Self::Cleared { .. } => true,
        }
    }
}

/// Client for the order store actor.
///
/// Every handle cloned from the same client shares one change feed, so a
/// write made through any of them reaches every subscriber.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    changes: broadcast::Sender<StoreChange>,
    clock: Arc<dyn Clock>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, clock: Arc<dyn Clock>, change_capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(change_capacity.max(1));
        Self { inner, changes, clock }
    }

    /// Subscribes to writes made through this store.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: StoreChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }

    /// Places a new order, stamping it with the current time.
    #[instrument(skip(self, params), fields(user_id = %params.user_id, items = params.items.len()))]
    pub async fn place_order(&self, mut params: OrderCreate) -> Result<Order, OrderError> {
        params.created_at = self.clock.now();
        let order = self.inner.create(params).await.map_err(|e| match OrderError::from(e) {
            OrderError::StorageError(reason) => OrderError::ValidationError(reason),
            other => other,
        })?;

        info!(order_id = %order.id, total = order.total, "Order placed");
        self.publish(StoreChange::Upserted {
            order_id: order.id.clone(),
            status: order.status,
        });
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        Ok(self.inner.get(id.to_string()).await?)
    }

    /// Writes an order back to the store.
    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status))]
    pub async fn put_order(&self, order: Order) -> Result<(), OrderError> {
        debug!("Sending request");
        let change = StoreChange::Upserted {
            order_id: order.id.clone(),
            status: order.status,
        };
        self.inner.put(order).await?;
        self.publish(change);
        Ok(())
    }

    /// All orders owned by `user_id`, in no particular order.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        let owner = user_id.to_string();
        Ok(self.inner.list(move |order: &Order| order.is_owned_by(&owner)).await?)
    }

    /// Cancels an order on behalf of its owner.
    ///
    /// Returns `false` if the order was already cancelled. Another user's order
    /// is reported as not found.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: &str, user_id: &str) -> Result<bool, OrderError> {
        let action = OrderAction::Cancel {
            user_id: user_id.to_string(),
        };
        let (order, outcome) = self
            .inner
            .perform_action(id.to_string(), action)
            .await
            .map_err(|e| match OrderError::from(e) {
                OrderError::StorageError(reason) => OrderError::ValidationError(reason),
                other => other,
            })?;

        match outcome {
            OrderActionResult::NotOwned => {
                warn!("Cancel requested by a user who does not own the order");
                Err(OrderError::NotFound(id.to_string()))
            }
            OrderActionResult::Cancel(changed) => {
                if changed {
                    info!("Order cancelled");
                    self.publish(StoreChange::Upserted {
                        order_id: order.id,
                        status: order.status,
                    });
                }
                Ok(changed)
            }
        }
    }

    /// Removes every order owned by `user_id`, leaving other users' orders.
    #[instrument(skip(self))]
    pub async fn clear_history(&self, user_id: &str) -> Result<usize, OrderError> {
        let owner = user_id.to_string();
        let removed = self
            .inner
            .remove_where(move |order: &Order| order.is_owned_by(&owner))
            .await?;

        info!(removed, "Order history cleared");
        self.publish(StoreChange::Cleared {
            user_id: user_id.to_string(),
            removed,
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::clock::ManualClock;
    use crate::domain::OrderItem;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn spawn_client(clock: ManualClock) -> OrderClient {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("order_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, inner) = ResourceActor::<Order>::new(16, next_id);
        tokio::spawn(actor.run());
        OrderClient::new(inner, Arc::new(clock), 16)
    }

    fn checkout(user_id: &str) -> OrderCreate {
        OrderCreate::new(user_id, vec![OrderItem::new("Veg Biryani", 180.0, 2)])
            .with_delivery_address("4 Park Street")
    }

    #[tokio::test]
    async fn test_place_order_stamps_clock_and_publishes() {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let client = spawn_client(ManualClock::new(start));
        let mut changes = client.subscribe_changes();

        let order = client.place_order(checkout("user_1")).await.unwrap();
        assert_eq!(order.id, "order_1");
        assert_eq!(order.created_at, start);
        assert_eq!(order.total, 360.0);
        assert_eq!(
            changes.recv().await.unwrap(),
            StoreChange::Upserted { order_id: "order_1".into(), status: OrderStatus::Confirmed }
        );
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart() {
        let client = spawn_client(ManualClock::new(Utc::now()));
        let result = client.place_order(OrderCreate::new("user_1", vec![])).await;
        assert!(matches!(result, Err(OrderError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_orders_is_per_user() {
        let client = spawn_client(ManualClock::new(Utc::now()));
        client.place_order(checkout("user_1")).await.unwrap();
        client.place_order(checkout("user_2")).await.unwrap();
        client.place_order(checkout("user_1")).await.unwrap();

        let mine = client.list_orders("user_1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.user_id == "user_1"));
    }

    #[tokio::test]
    async fn test_put_order_refuses_regression() {
        let client = spawn_client(ManualClock::new(Utc::now()));
        let order = client.place_order(checkout("user_1")).await.unwrap();

        client.put_order(order.with_status(OrderStatus::Preparing)).await.unwrap();
        let result = client.put_order(order.with_status(OrderStatus::Confirmed)).await;
        assert!(matches!(result, Err(OrderError::StorageError(_))));

        let stored = client.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn test_cancel_order_checks_owner() {
        let client = spawn_client(ManualClock::new(Utc::now()));
        let order = client.place_order(checkout("user_1")).await.unwrap();

        let stranger = client.cancel_order(&order.id, "user_2").await;
        assert_eq!(stranger, Err(OrderError::NotFound(order.id.clone())));

        assert_eq!(client.cancel_order(&order.id, "user_1").await, Ok(true));
        assert_eq!(client.cancel_order(&order.id, "user_1").await, Ok(false));
        let stored = client.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_delivered_order_fails() {
        let client = spawn_client(ManualClock::new(Utc::now()));
        let order = client.place_order(checkout("user_1")).await.unwrap();
        client.put_order(order.with_status(OrderStatus::Delivered)).await.unwrap();

        let result = client.cancel_order(&order.id, "user_1").await;
        assert!(matches!(result, Err(OrderError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_clear_history_keeps_other_users() {
        let client = spawn_client(ManualClock::new(Utc::now()));
        client.place_order(checkout("user_1")).await.unwrap();
        client.place_order(checkout("user_1")).await.unwrap();
        let kept = client.place_order(checkout("user_2")).await.unwrap();

        assert_eq!(client.clear_history("user_1").await.unwrap(), 2);
        assert!(client.list_orders("user_1").await.unwrap().is_empty());
        assert_eq!(client.get_order(&kept.id).await.unwrap(), Some(kept));
    }
}
