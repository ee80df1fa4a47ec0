//! Decision engine — classifies a [`WorldView`] into one [`Action`].
//!
//! Rules are checked in a fixed order and the first match wins:
//!
//! ```text
//! 1. scale-up    agents == 0 && backlog > 0 && alive == {} && pending == {}
//!                -> StartNode(first managed node)
//! 2. scale-down  for each alive, managed node without a pending request:
//!                  age >= max_node_age                          (MaxAge)
//!                  backlog == 0 && age % billing >= boundary    (BillingBoundary)
//!                -> StopNodes(selected) if any were selected
//! 3.             -> NoOp
//! ```
//!
//! Ages are whole minutes, truncated. Nodes are billed per started hour,
//! so an idle node is stopped from minute 58 on to land before the next
//! boundary.

use tracing::debug;

use jitfleet_core::{Action, NodeId, NodeSet, Policy, Timestamp, WorldView};

/// Why a node was selected for stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Idle and close to the next billing boundary.
    BillingBoundary,
    /// Past the hard age cap, regardless of backlog.
    MaxAge,
}

/// An action together with the per-node reasons behind a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    /// Empty unless `action` is [`Action::StopNodes`].
    pub stop_reasons: Vec<(NodeId, StopReason)>,
}

impl Decision {
    fn only(action: Action) -> Self {
        Self {
            action,
            stop_reasons: Vec::new(),
        }
    }
}

/// Decide with the default [`Policy`].
pub fn decide(w: &WorldView) -> Action {
    decide_with(&Policy::default(), w)
}

pub fn decide_with(policy: &Policy, w: &WorldView) -> Action {
    explain(policy, w).action
}

/// Evaluate the rules and keep the reason each stopped node was chosen.
pub fn explain(policy: &Policy, w: &WorldView) -> Decision {
    if needs_first_node(w) {
        let node = w.managed.first().clone();
        debug!(node = %node, backlog = w.backlog, "scale-up: backlog with no capacity");
        return Decision::only(Action::StartNode(node));
    }

    if !w.alive.is_empty() {
        let stop_reasons: Vec<(NodeId, StopReason)> = w
            .managed
            .iter()
            .filter(|node| !w.pending.contains_key(*node))
            .filter_map(|node| {
                let started = *w.alive.get(node)?;
                stop_reason(policy, w, started).map(|reason| (node.clone(), reason))
            })
            .collect();

        if let Ok(nodes) = NodeSet::new(stop_reasons.iter().map(|(node, _)| node.clone())) {
            return Decision {
                action: Action::StopNodes(nodes),
                stop_reasons,
            };
        }
    }

    Decision::only(Action::NoOp)
}

/// Scale-up fires only when nothing is running or on its way.
fn needs_first_node(w: &WorldView) -> bool {
    w.agent_count == 0 && w.backlog > 0 && w.alive.is_empty() && w.pending.is_empty()
}

fn stop_reason(policy: &Policy, w: &WorldView, started: Timestamp) -> Option<StopReason> {
    let age_mins = w.age_secs(started) / 60;

    if age_mins >= policy.max_node_age_mins() {
        return Some(StopReason::MaxAge);
    }

    let near_boundary = age_mins
        .checked_rem(policy.billing_period_mins())
        .is_some_and(|into_period| into_period >= policy.stop_before_boundary_mins());
    if w.backlog == 0 && near_boundary {
        return Some(StopReason::BillingBoundary);
    }

    None
}
