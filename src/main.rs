use chrono::{Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Instrument};
use order_tracker::app_system::{setup_tracing, TrackingSystem};
use order_tracker::clock::ManualClock;
use order_tracker::config::ConfigLoader;
use order_tracker::domain::{OrderCreate, OrderItem};
use order_tracker::tracking::share_link;

const CONFIG_PATH_ENV: &str = "ORDER_TRACKER_CONFIG";
const SHARE_BASE_URL: &str = "https://thesocialbite.example/orders";

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let config = ConfigLoader::from_env_and_file(config_path.as_deref()).map_err(|e| e.to_string())?;
    info!(stage_minutes = config.progression.stage_minutes, "Starting order tracking demo");

    // Simulated time, so the whole journey plays out instantly
    let clock = ManualClock::new(Utc::now());
    let system = TrackingSystem::new(&config, Arc::new(clock.clone()));

    system.engine.on_status_changed(|event| {
        info!(
            order_id = %event.order_id,
            from = %event.old_status,
            to = %event.new_status,
            "Status update"
        );
    });

    let checkout = OrderCreate::new("user_1", vec![
        OrderItem::new("Paneer Tikka", 240.0, 1),
        OrderItem::new("Garlic Naan", 60.0, 3),
    ])
    .with_delivery_address("12 MG Road, Bengaluru")
    .with_special_instructions("Ring the bell twice");
    let order = system.order_client.place_order(checkout).await.map_err(|e| e.to_string())?;

    let link = share_link(SHARE_BASE_URL, &order.id);
    info!(url = %link.url, "Share link ready");

    let span = tracing::info_span!("tracking", order_id = %order.id);
    async {
        loop {
            let view = match system.engine.track(&order.id, "user_1").await {
                Ok(view) => view,
                Err(e) => {
                    error!(error = %e, "Tracking failed");
                    break;
                }
            };
            let eta = view.eta.map(|eta| eta.to_string()).unwrap_or_default();
            info!(status = view.status_label, progress = view.progress, eta = %eta, "Tracking");
            if !view.is_live() {
                break;
            }
            clock.advance(Duration::minutes(4));
        }
    }
    .instrument(span)
    .await;

    let second = system
        .order_client
        .place_order(OrderCreate::new("user_1", vec![OrderItem::new("Masala Chai", 40.0, 2)]))
        .await
        .map_err(|e| e.to_string())?;
    system.order_client.cancel_order(&second.id, "user_1").await.map_err(|e| e.to_string())?;

    let stats = system.history.stats("user_1").await.map_err(|e| e.to_string())?;
    info!(
        orders = stats.total_orders,
        spent = stats.total_spent,
        delivered = stats.delivered,
        cancelled = stats.cancelled,
        "Order history"
    );

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
