//! Simulated delivery tracking: status progression, observers, derived view
//! values and timer-driven auto-refresh.

pub mod engine;
pub mod error;
pub mod events;
pub mod session;
pub mod view;

pub use engine::*;
pub use error::*;
pub use events::*;
pub use session::*;
pub use view::*;
