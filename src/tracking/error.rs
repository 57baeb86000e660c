use thiserror::Error;
use crate::order_actor::OrderError;

/// Errors surfaced by the tracking engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    /// No such order, or it belongs to another user.
    #[error("Order not found: {0}")]
    NotFound(String),
    /// The order store could not be read or written; nothing was changed.
    #[error("Order store error: {0}")]
    Storage(String),
}

impl From<OrderError> for TrackingError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other.to_string()),
        }
    }
}
