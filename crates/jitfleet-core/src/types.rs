//! Domain types for the fleet autoscaler.
//!
//! A [`WorldView`] is the only state carried between reconciliation
//! cycles. It is rebuilt from a fresh snapshot every cycle and never
//! mutated in place; the `with_*` helpers consume a view and return the
//! next one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Identifier of a compute node, as reported by the node manager.
pub type NodeId = String;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

// ── NodeSet ────────────────────────────────────────────────────────

/// A non-empty, ordered set of node ids.
///
/// Order is the order ids were first seen; duplicates are dropped. The
/// first id is the deterministic scale-up candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NodeId>", into = "Vec<NodeId>")]
pub struct NodeSet(Vec<NodeId>);

impl NodeSet {
    /// Build a set from ids, keeping first-seen order.
    ///
    /// Fails with [`ConfigError::EmptyNodeSet`] if no ids are given.
    pub fn new<I>(ids: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut nodes: Vec<NodeId> = Vec::new();
        for id in ids {
            if !nodes.contains(&id) {
                nodes.push(id);
            }
        }
        if nodes.is_empty() {
            return Err(ConfigError::EmptyNodeSet);
        }
        Ok(Self(nodes))
    }

    /// A set holding exactly one node.
    pub fn single(id: impl Into<NodeId>) -> Self {
        Self(vec![id.into()])
    }

    /// The first node in set order.
    pub fn first(&self) -> &NodeId {
        &self.0[0]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|n| n == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }
}

impl TryFrom<Vec<NodeId>> for NodeSet {
    type Error = ConfigError;

    fn try_from(ids: Vec<NodeId>) -> ConfigResult<Self> {
        Self::new(ids)
    }
}

impl From<NodeSet> for Vec<NodeId> {
    fn from(set: NodeSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── WorldView ──────────────────────────────────────────────────────

/// Point-in-time view of the job queue and the managed fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldView {
    /// Queued job count.
    pub backlog: u64,
    /// Registered workers. May exceed the managed node count when
    /// operators attach agents by hand.
    pub agent_count: u64,
    /// Every node under autoscaler control.
    pub managed: NodeSet,
    /// Running nodes and the time each became alive.
    pub alive: BTreeMap<NodeId, Timestamp>,
    /// Nodes with an unconfirmed start or stop request, and when it was
    /// requested.
    pub pending: BTreeMap<NodeId, Timestamp>,
    /// When this view was assembled. All ages are measured against it.
    pub time: Timestamp,
}

impl WorldView {
    /// Seconds elapsed between `since` and this view's time.
    ///
    /// Instants after `time` count as zero.
    pub fn age_secs(&self, since: Timestamp) -> u64 {
        self.time.saturating_sub(since)
    }

    /// Replace the pending map.
    pub fn with_pending(self, pending: BTreeMap<NodeId, Timestamp>) -> Self {
        Self { pending, ..self }
    }

    /// Record an in-flight request for `node` at this view's time.
    pub fn with_pending_entry(mut self, node: NodeId) -> Self {
        self.pending.insert(node, self.time);
        self
    }
}

// ── Action ─────────────────────────────────────────────────────────

/// The single action a reconciliation cycle takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum Action {
    /// Nothing to do.
    NoOp,
    /// Request one node to start.
    StartNode(NodeId),
    /// Request every node in the set to stop.
    StopNodes(NodeSet),
}

impl Action {
    /// Nodes this action issues requests for, in request order.
    pub fn targets(&self) -> Vec<&NodeId> {
        match self {
            Action::NoOp => Vec::new(),
            Action::StartNode(node) => vec![node],
            Action::StopNodes(nodes) => nodes.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> WorldView {
        WorldView {
            backlog: 0,
            agent_count: 0,
            managed: NodeSet::new(["n1".to_string(), "n2".to_string()]).unwrap(),
            alive: BTreeMap::new(),
            pending: BTreeMap::new(),
            time: 10_000,
        }
    }

    #[test]
    fn node_set_rejects_empty() {
        assert_eq!(
            NodeSet::new(Vec::<NodeId>::new()),
            Err(ConfigError::EmptyNodeSet)
        );
    }

    #[test]
    fn node_set_keeps_first_seen_order() {
        let set = NodeSet::new(
            ["n2", "n1", "n2", "n3"].into_iter().map(String::from),
        )
        .unwrap();
        assert_eq!(set.as_slice(), ["n2", "n1", "n3"]);
        assert_eq!(set.first(), "n2");
        assert!(set.contains("n3"));
        assert!(!set.contains("n4"));
    }

    #[test]
    fn node_set_deserialize_rejects_empty() {
        let result: Result<NodeSet, _> = serde_json::from_str("[]");
        assert!(result.is_err());

        let set: NodeSet = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(set.first(), "a");
    }

    #[test]
    fn age_saturates_for_future_timestamps() {
        let w = view();
        assert_eq!(w.age_secs(9_400), 600);
        assert_eq!(w.age_secs(20_000), 0);
    }

    #[test]
    fn pending_entry_uses_view_time() {
        let w = view().with_pending_entry("n1".to_string());
        assert_eq!(w.pending.get("n1"), Some(&10_000));
    }

    #[test]
    fn action_targets() {
        assert!(Action::NoOp.targets().is_empty());
        assert_eq!(Action::StartNode("n1".into()).targets(), vec!["n1"]);

        let stop = Action::StopNodes(view().managed);
        assert_eq!(stop.targets(), vec!["n1", "n2"]);
    }

    #[test]
    fn action_serializes_tagged() {
        let json = serde_json::to_string(&Action::StartNode("n1".into())).unwrap();
        assert_eq!(json, r#"{"action":"start_node","target":"n1"}"#);

        let stop = serde_json::to_string(&Action::StopNodes(view().managed)).unwrap();
        assert_eq!(stop, r#"{"action":"stop_nodes","target":["n1","n2"]}"#);

        let noop = serde_json::to_string(&Action::NoOp).unwrap();
        assert_eq!(noop, r#"{"action":"no_op"}"#);
    }
}
