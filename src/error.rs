//! Unexpected faults raised while serving a request.
//!
//! Business outcomes such as a declined payment are plain values in
//! [`crate::shop::outcome`]; only faults the pipeline does not model end up
//! here. They are recorded on the active span and surface as a server fault.

use thiserror::Error;

/// Errors that terminate a request with a generic server fault.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Fault raised on purpose by the error endpoint.
    #[error("Simulated error for observability testing")]
    Simulated {
        #[source]
        cause: FaultCause,
    },

    /// A stage failed in a way the pipeline does not model.
    #[error("stage {stage} failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },

    /// The task driving a request panicked or was aborted.
    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Underlying cause attached to a fault.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FaultCause(pub String);

impl ShopError {
    /// Build the fault raised by the error endpoint.
    pub fn simulated(cause: impl Into<String>) -> Self {
        Self::Simulated {
            cause: FaultCause(cause.into()),
        }
    }
}

pub type ShopResult<T> = Result<T, ShopError>;
