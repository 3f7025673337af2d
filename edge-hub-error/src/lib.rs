use anyhow::Error as AnyhowError;
use config::ConfigError;
use std::error::Error as StdError;
use thiserror::Error;
use tokio::time::{error::Elapsed, Duration};

pub type HubResult<T, E = HubError> = anyhow::Result<T, E>;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("read/write timeout")]
    Timeout(Duration),
    #[error("Message size exceeds maximum allowed size: got {size}, limit {limit}")]
    MessageTooLarge { size: u64, limit: u64 },
    #[error("Failed to synchronize subscription {subscription} for client {id}: {source}")]
    SubscriptionSyncFailure {
        id: String,
        subscription: String,
        #[source]
        source: Box<HubError>,
    },
    #[error("Collaborator error: {0}")]
    Collaborator(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    ConfigError(#[from] ConfigError),
    #[error("{0}")]
    Anyhow(#[from] AnyhowError),
    #[error("{0}")]
    Msg(String),
}

impl HubError {
    /// Whether this error was produced by a timed-out collaborator call.
    ///
    /// Wrapped sources are inspected as well, so a timeout that surfaced
    /// through a subscription sync failure or an `anyhow` chain still
    /// classifies as a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            HubError::Timeout(_) => true,
            HubError::SubscriptionSyncFailure { source, .. } => source.is_timeout(),
            HubError::Anyhow(e) => e.chain().any(is_timeout_cause),
            _ => false,
        }
    }
}

fn is_timeout_cause(cause: &(dyn StdError + 'static)) -> bool {
    if cause.is::<Elapsed>() {
        return true;
    }
    cause
        .downcast_ref::<HubError>()
        .is_some_and(|e| matches!(e, HubError::Timeout(_)))
}

impl From<Elapsed> for HubError {
    #[inline]
    fn from(_: Elapsed) -> Self {
        HubError::Timeout(Duration::ZERO)
    }
}

impl From<String> for HubError {
    #[inline]
    fn from(e: String) -> Self {
        HubError::Msg(e)
    }
}
