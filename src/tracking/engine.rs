use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use crate::clients::OrderClient;
use crate::clock::Clock;
use crate::config::TrackingConfig;
use crate::domain::{Order, OrderStatus};
use super::error::TrackingError;
use super::events::{StatusChanged, StatusNotifier, SubscriptionId};
use super::session::SessionConfig;
use super::view::{EtaConfig, TrackingView};

/// How fast the simulated delivery moves along the journey.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Minutes spent in each journey status before moving to the next.
    pub stage_minutes: i64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self { stage_minutes: 8 }
    }
}

/// Whole minutes from `created_at` to `now`, rounded down.
pub fn elapsed_minutes(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_milliseconds().div_euclid(60_000)
}

/// The status an order placed at `created_at` should have reached by `now`.
///
/// Only journey statuses short of `Delivered` move, and only forwards, one
/// journey step per `stage_minutes` elapsed, capped at `Delivered`.
pub fn progressed_status(
    status: OrderStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &ProgressionConfig,
) -> OrderStatus {
    let Some(stage_index) = status.journey_index() else {
        return status;
    };
    let elapsed = elapsed_minutes(created_at, now);
    if elapsed < 0 {
        return status;
    }

    let last = OrderStatus::JOURNEY.len() - 1;
    let steps = elapsed / config.stage_minutes.max(1);
    let target_index = usize::try_from(steps).map_or(last, |steps| steps.min(last));
    if target_index > stage_index {
        OrderStatus::JOURNEY[target_index]
    } else {
        status
    }
}

/// Returns `order` advanced to the status it should have reached by `now`.
pub fn compute_progressed_status(order: &Order, now: DateTime<Utc>, config: &ProgressionConfig) -> Order {
    let status = progressed_status(order.status, order.created_at, now, config);
    if status == order.status {
        order.clone()
    } else {
        order.with_status(status)
    }
}

/// Result of a refresh: the order as it now stands and whether it moved.
#[derive(Debug, Clone, PartialEq)]
pub struct Refreshed {
    pub order: Order,
    pub changed: bool,
}

/// Advances stored orders along the simulated delivery journey.
///
/// Cloning is cheap; clones share the store handle and the observer registry.
#[derive(Clone)]
pub struct TrackingEngine {
    orders: OrderClient,
    clock: Arc<dyn Clock>,
    notifier: StatusNotifier,
    progression: ProgressionConfig,
    eta: EtaConfig,
    session: SessionConfig,
}

impl TrackingEngine {
    pub fn new(orders: OrderClient, clock: Arc<dyn Clock>, config: &TrackingConfig) -> Self {
        Self {
            orders,
            clock,
            notifier: StatusNotifier::new(),
            progression: config.progression,
            eta: config.eta,
            session: config.session,
        }
    }

    pub fn orders(&self) -> &OrderClient {
        &self.orders
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    /// Registers `handler` for every [`StatusChanged`] this engine emits.
    pub fn on_status_changed(
        &self,
        handler: impl Fn(&StatusChanged) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Refreshes an order against the engine clock.
    pub async fn refresh(&self, order_id: &str, user_id: &str) -> Result<Refreshed, TrackingError> {
        self.refresh_at(order_id, user_id, self.clock.now()).await
    }

    /// Re-reads the order, advances its status if `now` calls for it and
    /// persists the change.
    ///
    /// # Errors
    /// `NotFound` if the order does not exist or belongs to another user;
    /// `Storage` if the store fails, in which case nothing was changed and no
    /// event was emitted.
    #[instrument(skip(self, now))]
    pub async fn refresh_at(
        &self,
        order_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Refreshed, TrackingError> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .filter(|order| order.is_owned_by(user_id))
            .ok_or_else(|| TrackingError::NotFound(order_id.to_string()))?;

        let progressed = compute_progressed_status(&order, now, &self.progression);
        if progressed.status == order.status {
            debug!(status = %order.status, "Order status is current");
            return Ok(Refreshed { order, changed: false });
        }

        if let Err(e) = self.orders.put_order(progressed.clone()).await {
            warn!(error = %e, "Could not persist status change");
            return Err(e.into());
        }

        let event = StatusChanged {
            order_id: progressed.id.clone(),
            old_status: order.status,
            new_status: progressed.status,
        };
        info!(old_status = %event.old_status, new_status = %event.new_status, "Order status advanced");
        self.notifier.notify(&event);

        Ok(Refreshed { order: progressed, changed: true })
    }

    /// Derived display values for `order` at the engine clock's time.
    pub fn view(&self, order: &Order) -> TrackingView {
        TrackingView::build(order, self.clock.now(), &self.eta)
    }

    /// Refreshes the order and returns its view.
    pub async fn track(&self, order_id: &str, user_id: &str) -> Result<TrackingView, TrackingError> {
        let refreshed = self.refresh(order_id, user_id).await?;
        Ok(self.view(&refreshed.order))
    }
}
