use thiserror::Error;

/// Errors that can occur during order store operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Order storage error: {0}")]
    StorageError(String),
    #[error("Order serialization error: {0}")]
    SerializationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<crate::actor_framework::FrameworkError> for OrderError {
    fn from(e: crate::actor_framework::FrameworkError) -> Self {
        use crate::actor_framework::FrameworkError;
        match e {
            FrameworkError::NotFound(id) => Self::NotFound(id),
            FrameworkError::Rejected(reason) => Self::StorageError(reason),
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                Self::ActorCommunicationError(e.to_string())
            }
        }
    }
}
