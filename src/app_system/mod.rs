//! System orchestration, startup, and shutdown logic.

pub mod logging;
pub mod tracking_system;

pub use logging::*;
pub use tracking_system::*;
