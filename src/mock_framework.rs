//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_put`] to assert behavior.

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest};
use tokio::sync::{mpsc, oneshot};

/// Creates a mock client and a receiver for asserting requests.
///
/// The test plays the actor: it reads each request off `receiver` and answers
/// it, so store failures and odd replies can be produced on demand.
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Put request
pub async fn expect_put<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T, oneshot::Sender<Result<(), FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Put { item, respond_to }) => Some((item, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, oneshot::Sender<Result<(T, T::ActionResult), FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, OrderStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Order>(10);

        let get_task = tokio::spawn(async move { client.get("order_1".to_string()).await });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, "order_1");
        responder.send(Ok(None)).unwrap();

        let result = get_task.await.unwrap();
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_mock_put_failure() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let order = Order {
            id: "order_1".to_string(),
            user_id: "user_1".to_string(),
            created_at: Utc::now(),
            status: OrderStatus::Preparing,
            items: vec![],
            total: 0.0,
            delivery_address: None,
            special_instructions: None,
        };

        let put_task = tokio::spawn(async move { client.put(order).await });

        let (item, responder) = expect_put(&mut receiver).await.expect("Expected Put request");
        assert_eq!(item.status, OrderStatus::Preparing);
        responder.send(Err(FrameworkError::Rejected("disk full".into()))).unwrap();

        assert_eq!(put_task.await.unwrap(), Err(FrameworkError::Rejected("disk full".into())));
    }

    #[tokio::test]
    async fn test_mock_cancel_by_stranger() {
        use crate::clients::OrderClient;
        use crate::clock::ManualClock;
        use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
        use std::sync::Arc;

        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner, Arc::new(ManualClock::new(Utc::now())), 4);

        let cancel_task = tokio::spawn(async move { client.cancel_order("order_1", "user_2").await });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, "order_1");
        assert!(matches!(action, OrderAction::Cancel { ref user_id } if user_id == "user_2"));
        let untouched = Order {
            id: "order_1".to_string(),
            user_id: "user_1".to_string(),
            created_at: Utc::now(),
            status: OrderStatus::Confirmed,
            items: vec![],
            total: 0.0,
            delivery_address: None,
            special_instructions: None,
        };
        responder.send(Ok((untouched, OrderActionResult::NotOwned))).unwrap();

        assert_eq!(cancel_task.await.unwrap(), Err(OrderError::NotFound("order_1".to_string())));
    }
}
