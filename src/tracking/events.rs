//! Status change notifications.
//!
//! Observers register a handler with [`StatusNotifier::subscribe`]; every
//! handler is called synchronously, inside the refresh that advanced the order.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::domain::OrderStatus;

/// Emitted whenever a refresh advances a stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChanged {
    pub order_id: String,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

type Handler = Arc<dyn Fn(&StatusChanged) + Send + Sync>;

/// Registry of status-change observers. Clones share the same registry.
#[derive(Clone, Default)]
pub struct StatusNotifier {
    handlers: Arc<DashMap<SubscriptionId, Handler>>,
    next_id: Arc<AtomicU64>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        handler: impl Fn(&StatusChanged) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.insert(id, Arc::new(handler));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Calls every registered handler with `event` and returns how many ran.
    pub fn notify(&self, event: &StatusChanged) -> usize {
        // Snapshot first: a handler may subscribe or unsubscribe while running.
        let handlers: Vec<Handler> = self.handlers.iter().map(|h| Arc::clone(h.value())).collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}
