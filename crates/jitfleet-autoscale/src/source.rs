//! Capability interfaces the autoscaler consumes.
//!
//! Transport, authentication, and per-call timeouts belong to the
//! implementations. Methods return boxed futures so the traits stay
//! object-safe and can be injected as `Arc<dyn ...>`.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use jitfleet_core::{NodeId, Timestamp};

use crate::error::SourceError;

/// Boxed future alias for source calls.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// The CI job queue.
pub trait WorkQueueSource: Send + Sync {
    /// Number of queued jobs.
    fn backlog(&self) -> SourceFuture<'_, u64>;

    /// Number of registered worker agents.
    fn agent_count(&self) -> SourceFuture<'_, u64>;
}

/// The cloud node manager.
///
/// `start_node` and `stop_node` resolve once the request is accepted, not
/// once the node has changed state.
pub trait NodeManagerSource: Send + Sync {
    /// The manager's notion of the current time.
    fn time(&self) -> SourceFuture<'_, Timestamp>;

    /// Every node under autoscaler control, in a stable order.
    fn managed_nodes(&self) -> SourceFuture<'_, Vec<NodeId>>;

    /// Running nodes and the time each became alive.
    fn alive_nodes(&self) -> SourceFuture<'_, BTreeMap<NodeId, Timestamp>>;

    fn start_node<'a>(&'a self, node: &'a str) -> SourceFuture<'a, ()>;

    fn stop_node<'a>(&'a self, node: &'a str) -> SourceFuture<'a, ()>;
}
