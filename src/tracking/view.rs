//! Display values derived from an order. Pure; nothing here touches the store.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use crate::domain::{Order, OrderStatus};
use super::engine::elapsed_minutes;

/// Shape of the delivery-time estimate: three equal phases plus floors.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EtaConfig {
    pub phase_minutes: i64,
    /// Lowest estimate shown while confirmed or preparing.
    pub min_remaining_minutes: i64,
    /// Lowest estimate shown once out for delivery.
    pub final_min_remaining_minutes: i64,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            phase_minutes: 15,
            min_remaining_minutes: 5,
            final_min_remaining_minutes: 2,
        }
    }
}

pub fn progress_percentage(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Confirmed => 25,
        OrderStatus::Preparing => 50,
        OrderStatus::OutForDelivery => 75,
        OrderStatus::Delivered | OrderStatus::Cancelled => 100,
        OrderStatus::Unknown => 0,
    }
}

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Confirmed => "Confirmed",
        OrderStatus::Preparing => "Preparing",
        OrderStatus::OutForDelivery => "Out for Delivery",
        OrderStatus::Delivered => "Delivered",
        OrderStatus::Cancelled => "Cancelled",
        OrderStatus::Unknown => "Unknown",
    }
}

pub fn status_badge_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Confirmed => "bg-primary",
        OrderStatus::Preparing => "bg-warning text-dark",
        OrderStatus::OutForDelivery => "bg-info",
        OrderStatus::Delivered => "bg-success",
        OrderStatus::Cancelled => "bg-danger",
        OrderStatus::Unknown => "bg-secondary",
    }
}

/// Estimated time until delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    Remaining { minutes: u32 },
    Delivered,
    Cancelled,
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remaining { minutes } => write!(f, "~{} minutes remaining", minutes),
            Self::Delivered => f.write_str("Delivered"),
            Self::Cancelled => f.write_str("Order Cancelled"),
        }
    }
}

/// Counts down linearly through the phase belonging to `status`, never
/// below that phase's floor. `None` for statuses without an estimate.
pub fn estimated_time_remaining(
    status: OrderStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &EtaConfig,
) -> Option<Eta> {
    // (phases still ahead, phases already behind, floor)
    let (ahead, behind, floor): (i64, i64, i64) = match status {
        OrderStatus::Confirmed => (3, 0, config.min_remaining_minutes),
        OrderStatus::Preparing => (2, 1, config.min_remaining_minutes),
        OrderStatus::OutForDelivery => (1, 2, config.final_min_remaining_minutes),
        OrderStatus::Delivered => return Some(Eta::Delivered),
        OrderStatus::Cancelled => return Some(Eta::Cancelled),
        OrderStatus::Unknown => return None,
    };

    let phase = config.phase_minutes;
    let into_phase = elapsed_minutes(created_at, now)
        .saturating_sub(behind.saturating_mul(phase))
        .min(phase);
    let remaining = ahead
        .saturating_mul(phase)
        .saturating_sub(into_phase)
        .max(floor)
        .max(0);
    Some(Eta::Remaining {
        minutes: u32::try_from(remaining).unwrap_or(u32::MAX),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

/// One step of the delivery journey as shown on the tracking timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub description: &'static str,
    pub state: StepState,
}

fn step_text(status: OrderStatus) -> (&'static str, &'static str) {
    match status {
        OrderStatus::Confirmed => ("Order Confirmed", "Your order has been received and confirmed"),
        OrderStatus::Preparing => ("Preparing Food", "The restaurant is preparing your delicious meal"),
        OrderStatus::OutForDelivery => ("Out for Delivery", "Your order is on the way to you"),
        _ => ("Delivered", "Your order has been delivered. Enjoy your meal!"),
    }
}

/// The four journey steps for an order in `status`.
///
/// A delivered order has every step completed; a cancelled one has none.
pub fn tracking_timeline(status: OrderStatus) -> Vec<TimelineStep> {
    let current = status.journey_index();
    OrderStatus::JOURNEY
        .iter()
        .enumerate()
        .map(|(index, &step)| {
            let (label, description) = step_text(step);
            let state = match current {
                Some(c) if index < c => StepState::Completed,
                Some(c) if index == c && status.is_terminal() => StepState::Completed,
                Some(c) if index == c => StepState::Current,
                _ => StepState::Pending,
            };
            TimelineStep { status: step, label, description, state }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
    pub image: Option<String>,
}

/// Everything the tracking screen shows for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingView {
    pub order_id: String,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub badge_class: &'static str,
    pub progress: u8,
    pub eta: Option<Eta>,
    pub timeline: Vec<TimelineStep>,
    pub items: Vec<ItemLine>,
    pub total: f64,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
}

impl TrackingView {
    pub fn build(order: &Order, now: DateTime<Utc>, eta: &EtaConfig) -> Self {
        Self {
            order_id: order.id.clone(),
            placed_at: order.created_at,
            status: order.status,
            status_label: status_label(order.status),
            badge_class: status_badge_class(order.status),
            progress: progress_percentage(order.status),
            eta: estimated_time_remaining(order.status, order.created_at, now, eta),
            timeline: tracking_timeline(order.status),
            items: order
                .items
                .iter()
                .map(|item| ItemLine {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.price,
                    line_total: item.line_total(),
                    image: item.image.clone(),
                })
                .collect(),
            total: order.total,
            delivery_address: order.delivery_address.clone(),
            special_instructions: order.special_instructions.clone(),
        }
    }

    /// Whether the screen should keep polling for updates.
    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// A link that opens the tracking screen for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub url: String,
    pub title: String,
    pub text: String,
}

pub fn share_link(base_url: &str, order_id: &str) -> ShareLink {
    let url = format!("{}?track-order={}", base_url, order_id);
    ShareLink {
        title: format!("Order #{} - The Social Bite", order_id),
        text: format!("Track my order #{} from The Social Bite: {}", order_id, url),
        url,
    }
}
