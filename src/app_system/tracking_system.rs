use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use crate::actor_framework::ResourceActor;
use crate::clients::OrderClient;
use crate::clock::Clock;
use crate::config::TrackingConfig;
use crate::domain::Order;
use crate::history::OrderHistory;
use crate::tracking::TrackingEngine;

/// The order tracking system: the order store actor plus everything built on it.
///
/// Responsible for starting the store, wiring the engine and history to it,
/// and handling shutdown.
pub struct TrackingSystem {
    pub order_client: OrderClient,
    pub engine: TrackingEngine,
    pub history: OrderHistory,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TrackingSystem {
    pub fn new(config: &TrackingConfig, clock: Arc<dyn Clock>) -> Self {
        let order_id_counter = Arc::new(AtomicU64::new(1));
        let next_order_id = move || {
            let id = order_id_counter.fetch_add(1, Ordering::SeqCst);
            format!("order_{}", id)
        };

        let (order_actor, order_resource_client) =
            ResourceActor::<Order>::new(config.store.buffer_size, next_order_id);
        let order_client = OrderClient::new(
            order_resource_client,
            Arc::clone(&clock),
            config.store.change_capacity,
        );
        let order_handle = tokio::spawn(order_actor.run());

        let engine = TrackingEngine::new(order_client.clone(), clock, config);
        let history = OrderHistory::new(order_client.clone());

        info!("Order tracking system started");
        Self {
            order_client,
            engine,
            history,
            handles: vec![order_handle],
        }
    }

    /// Drops every client (closing the actor's channel) and waits for the
    /// actor to stop. Tracking sessions still running keep the store alive
    /// until they end, so stop them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        drop(self.order_client);
        drop(self.engine);
        drop(self.history);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
