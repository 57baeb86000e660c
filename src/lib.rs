//! Simulated order tracking for a food-ordering app.
//!
//! Orders live in an actor-backed store. The tracking engine moves them
//! along `confirmed -> preparing -> out_for_delivery -> delivered` as time
//! passes and tells registered observers about each move.

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod clock;
pub mod config;
pub mod domain;
pub mod history;
pub mod order_actor;
pub mod tracking;

#[cfg(test)]
mod mock_framework;
