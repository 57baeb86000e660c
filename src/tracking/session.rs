use serde::Deserialize;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn, Instrument};
use crate::clients::StoreChange;
use crate::domain::OrderStatus;
use super::engine::TrackingEngine;
use super::error::TrackingError;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between automatic refreshes of a watched order.
    pub refresh_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// Handle to a running auto-refresh of one order.
///
/// The session ends on its own once the order is delivered, cancelled or gone.
/// Dropping the handle ends it too.
pub struct TrackingSession {
    order_id: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TrackingSession {
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stops refreshing and waits for the session task to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.join().await;
    }

    /// Waits until the session ends on its own.
    pub async fn finished(mut self) {
        self.join().await;
    }

    async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(order_id = %self.order_id, error = %e, "Tracking session task failed");
            }
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl TrackingEngine {
    /// Starts auto-refreshing an order for its owner.
    ///
    /// Returns `None` when the order is already delivered or cancelled. The
    /// first refresh happens one interval after the start, and again whenever
    /// the store reports a write to the order.
    #[instrument(skip(self))]
    pub async fn watch(
        &self,
        order_id: &str,
        user_id: &str,
    ) -> Result<Option<TrackingSession>, TrackingError> {
        let changes = self.orders().subscribe_changes();
        let order = self
            .orders()
            .get_order(order_id)
            .await?
            .filter(|order| order.is_owned_by(user_id))
            .ok_or_else(|| TrackingError::NotFound(order_id.to_string()))?;

        if order.status.is_terminal() {
            debug!(status = %order.status, "Order is final, not watching");
            return Ok(None);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let period = self.session_config().refresh_interval();
        let span = tracing::info_span!("tracking_session", order_id = %order_id);
        let task = tokio::spawn(
            run_session(
                self.clone(),
                order_id.to_string(),
                user_id.to_string(),
                order.status,
                period,
                shutdown_rx,
                changes,
            )
            .instrument(span),
        );

        info!(interval_secs = period.as_secs(), "Tracking session started");
        Ok(Some(TrackingSession {
            order_id: order_id.to_string(),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }))
    }
}

async fn run_session(
    engine: TrackingEngine,
    order_id: String,
    user_id: String,
    mut last_status: OrderStatus,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
    mut changes: broadcast::Receiver<StoreChange>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut feed_open = true;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Tracking session closed");
                break;
            }
            _ = ticker.tick() => {}
            change = changes.recv(), if feed_open => match change {
                // Our own refresh writes come back through the feed
                Ok(StoreChange::Upserted { order_id: id, status })
                    if id == order_id && status == last_status => continue,
                Ok(change) if change.concerns(&order_id) => {
                    debug!(?change, "Watched order changed in the store");
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Change feed lagged");
                }
                Err(RecvError::Closed) => {
                    feed_open = false;
                    continue;
                }
            },
        }

        let outcome = engine.refresh(&order_id, &user_id).await;
        if let Ok(refreshed) = &outcome {
            last_status = refreshed.order.status;
        }
        match outcome {
            Ok(refreshed) if refreshed.order.status.is_terminal() => {
                info!(status = %refreshed.order.status, "Order reached a final status, tracking stopped");
                break;
            }
            Ok(_) => {}
            Err(TrackingError::NotFound(_)) => {
                warn!("Watched order is no longer available, tracking stopped");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, retrying on next tick");
            }
        }
    }
}
