//! Order-specific store logic: creation rules, replace guards and cancellation.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
