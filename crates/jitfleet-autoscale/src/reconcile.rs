//! Reconciler: carries unresolved pending requests into a fresh snapshot.

use tracing::debug;

use jitfleet_core::{Policy, WorldView};

/// Reconcile with the default [`Policy`].
pub fn reconcile(previous: &WorldView, fresh: WorldView) -> WorldView {
    reconcile_with(&Policy::default(), previous, fresh)
}

/// Merge `previous.pending` into `fresh`.
///
/// A pending entry is dropped when its node changed alive membership
/// between the two views (the request resolved, one way or another), or
/// when it is at least `policy.pending_expiry` old by `fresh.time` (the
/// request is presumed lost). Only `pending` is replaced.
pub fn reconcile_with(policy: &Policy, previous: &WorldView, fresh: WorldView) -> WorldView {
    let expiry = policy.pending_expiry.as_secs();

    let pending = previous
        .pending
        .iter()
        .filter(|&(node, _)| {
            let changed =
                previous.alive.contains_key(node) != fresh.alive.contains_key(node);
            if changed {
                debug!(node = %node, reason = "resolved", "dropping pending entry");
            }
            !changed
        })
        .filter(|&(node, &requested)| {
            let age = fresh.age_secs(requested);
            let expired = age >= expiry;
            if expired {
                debug!(
                    node = %node,
                    reason = "expired",
                    age_mins = age / 60,
                    "dropping pending entry"
                );
            }
            !expired
        })
        .map(|(node, &requested)| (node.clone(), requested))
        .collect();

    fresh.with_pending(pending)
}
