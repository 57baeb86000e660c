//! Handles for talking to the store actors.

pub mod order_client;

pub use order_client::*;
