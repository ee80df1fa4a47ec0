//! Snapshot collector: one consistent read of the queue and the fleet.

use std::collections::BTreeMap;

use tracing::debug;

use jitfleet_core::{NodeSet, WorldView};

use crate::error::{AutoscaleError, AutoscaleResult};
use crate::source::{NodeManagerSource, SourceFuture, WorkQueueSource};

/// Read backlog, agent count, time, managed nodes, and alive nodes.
///
/// The five reads are independent and run concurrently. The first
/// failure fails the whole snapshot; no partial view is built. The
/// returned view has an empty `pending` map.
pub async fn collect(
    queue: &dyn WorkQueueSource,
    nodes: &dyn NodeManagerSource,
) -> AutoscaleResult<WorldView> {
    let (backlog, agent_count, time, managed, alive) = tokio::try_join!(
        read("backlog", queue.backlog()),
        read("agent_count", queue.agent_count()),
        read("time", nodes.time()),
        read("managed_nodes", nodes.managed_nodes()),
        read("alive_nodes", nodes.alive_nodes()),
    )?;

    let managed = NodeSet::new(managed)?;

    debug!(
        backlog,
        agents = agent_count,
        managed = managed.as_slice().len(),
        alive = alive.len(),
        time,
        "snapshot collected"
    );

    Ok(WorldView {
        backlog,
        agent_count,
        managed,
        alive,
        pending: BTreeMap::new(),
        time,
    })
}

async fn read<T>(op: &'static str, call: SourceFuture<'_, T>) -> AutoscaleResult<T> {
    call.await
        .map_err(|source| AutoscaleError::source_failed(op, source))
}
