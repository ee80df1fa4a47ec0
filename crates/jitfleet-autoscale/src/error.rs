//! Autoscaler error types.

use thiserror::Error;

use jitfleet_core::{ConfigError, NodeId, WorldView};

/// Failure reported by a capability source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("transient I/O error: {0}")]
    Transient(String),

    /// Credential refresh is the adapter's job; the autoscaler treats
    /// this like any other failed call.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Errors that can abort a reconciliation cycle.
#[derive(Debug, Error)]
pub enum AutoscaleError {
    #[error("{op} failed: {source}")]
    Source {
        op: &'static str,
        source: SourceError,
    },

    /// A sequential stop failed after at least one earlier stop was
    /// accepted. `view` holds the pending entries recorded so far.
    #[error("stop_node({node}) failed after earlier stops were accepted: {source}")]
    PartialStop {
        node: NodeId,
        view: Box<WorldView>,
        source: SourceError,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AutoscaleError {
    pub(crate) fn source_failed(op: &'static str, source: SourceError) -> Self {
        Self::Source { op, source }
    }

    /// Whether the next tick may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source { .. } | Self::PartialStop { .. } => true,
            Self::Config(_) => false,
        }
    }

    /// The bookkeeping a partially applied stop left behind, if any.
    pub fn into_partial_view(self) -> Option<WorldView> {
        match self {
            Self::PartialStop { view, .. } => Some(*view),
            _ => None,
        }
    }
}

pub type AutoscaleResult<T> = Result<T, AutoscaleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_failures_are_retryable() {
        let err = AutoscaleError::source_failed("backlog", SourceError::Transient("reset".into()));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "backlog failed: transient I/O error: reset");

        let auth = AutoscaleError::source_failed("time", SourceError::Unauthorized("expired".into()));
        assert!(auth.is_retryable());
        assert!(auth.into_partial_view().is_none());
    }

    #[test]
    fn config_failures_are_fatal() {
        let err: AutoscaleError = ConfigError::EmptyNodeSet.into();
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "configuration error: managed node set is empty");
    }
}
