//! Action executor — issues start/stop requests and records them as
//! pending in the returned view.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{info, warn};

use jitfleet_core::{Action, NodeSet, StopStrategy, WorldView};

use crate::error::{AutoscaleError, AutoscaleResult};
use crate::source::NodeManagerSource;

pub struct Executor {
    nodes: Arc<dyn NodeManagerSource>,
    strategy: StopStrategy,
}

impl Executor {
    pub fn new(nodes: Arc<dyn NodeManagerSource>, strategy: StopStrategy) -> Self {
        Self { nodes, strategy }
    }

    pub fn strategy(&self) -> StopStrategy {
        self.strategy
    }

    /// Apply `action` and return `w` with the accepted requests recorded
    /// in `pending` at `w.time`.
    ///
    /// Does not wait for nodes to change state; the next snapshot
    /// observes that.
    pub async fn act(&self, w: WorldView, action: &Action) -> AutoscaleResult<WorldView> {
        match action {
            Action::NoOp => Ok(w),
            Action::StartNode(node) => {
                self.nodes
                    .start_node(node)
                    .await
                    .map_err(|source| AutoscaleError::source_failed("start_node", source))?;
                info!(node = %node, "start requested");
                Ok(w.with_pending_entry(node.clone()))
            }
            Action::StopNodes(nodes) => match self.strategy {
                StopStrategy::Sequential => self.stop_sequential(w, nodes).await,
                StopStrategy::Parallel => self.stop_parallel(w, nodes).await,
            },
        }
    }

    /// Stop one node at a time. The first failure skips the remaining
    /// nodes; entries recorded before it are returned in the error.
    async fn stop_sequential(&self, w: WorldView, nodes: &NodeSet) -> AutoscaleResult<WorldView> {
        let mut view = w;
        let mut recorded = 0usize;

        for node in nodes {
            if let Err(source) = self.nodes.stop_node(node).await {
                warn!(node = %node, recorded, error = %source, "stop request failed");
                if recorded == 0 {
                    return Err(AutoscaleError::source_failed("stop_node", source));
                }
                return Err(AutoscaleError::PartialStop {
                    node: node.clone(),
                    view: Box::new(view),
                    source,
                });
            }
            info!(node = %node, "stop requested");
            view = view.with_pending_entry(node.clone());
            recorded += 1;
        }

        Ok(view)
    }

    /// Stop all nodes concurrently. Any failure fails the batch and no
    /// pending entries are recorded.
    async fn stop_parallel(&self, w: WorldView, nodes: &NodeSet) -> AutoscaleResult<WorldView> {
        try_join_all(nodes.iter().map(|node| self.nodes.stop_node(node)))
            .await
            .map_err(|source| {
                warn!(error = %source, "parallel stop failed, nothing recorded");
                AutoscaleError::source_failed("stop_node", source)
            })?;

        info!(nodes = ?nodes.as_slice(), "stop requested");
        Ok(nodes
            .iter()
            .fold(w, |view, node| view.with_pending_entry(node.clone())))
    }
}
