//! Autoscaler — runs one reconciliation cycle per `tick`.

use std::sync::Arc;

use tracing::{debug, info};

use jitfleet_core::{Action, ConfigResult, FleetConfig, Policy, StopStrategy, WorldView};

use crate::decide::explain;
use crate::error::AutoscaleResult;
use crate::executor::Executor;
use crate::reconcile::reconcile_with;
use crate::snapshot;
use crate::source::{NodeManagerSource, WorkQueueSource};

/// Owns the two capability sources and the scaling policy.
///
/// Holds no per-cycle state: the caller passes the previous
/// [`WorldView`] in and stores the one returned.
pub struct Autoscaler {
    queue: Arc<dyn WorkQueueSource>,
    nodes: Arc<dyn NodeManagerSource>,
    policy: Policy,
    executor: Executor,
}

impl Autoscaler {
    /// Create an autoscaler with the default policy and sequential stops.
    pub fn new(queue: Arc<dyn WorkQueueSource>, nodes: Arc<dyn NodeManagerSource>) -> Self {
        let executor = Executor::new(nodes.clone(), StopStrategy::default());
        Self {
            queue,
            nodes,
            policy: Policy::default(),
            executor,
        }
    }

    /// Build an autoscaler from a parsed fleet.toml.
    pub fn from_config(
        queue: Arc<dyn WorkQueueSource>,
        nodes: Arc<dyn NodeManagerSource>,
        config: &FleetConfig,
    ) -> AutoscaleResult<Self> {
        let policy = config.policy()?;
        Ok(Self::new(queue, nodes)
            .with_policy(policy)?
            .with_stop_strategy(config.stop_strategy()))
    }

    /// Replace the scaling policy. Rejects a policy that fails
    /// [`Policy::validate`].
    pub fn with_policy(mut self, policy: Policy) -> ConfigResult<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn with_stop_strategy(mut self, strategy: StopStrategy) -> Self {
        self.executor = Executor::new(self.nodes.clone(), strategy);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn stop_strategy(&self) -> StopStrategy {
        self.executor.strategy()
    }

    /// Run one snapshot → reconcile → decide → act cycle.
    ///
    /// `None` bootstraps with no pending requests. On error the caller keeps
    /// `previous`, except for [`AutoscaleError::PartialStop`], which carries
    /// the view with the stops already accepted and should replace it.
    ///
    /// [`AutoscaleError::PartialStop`]: crate::error::AutoscaleError::PartialStop
    pub async fn tick(&self, previous: Option<&WorldView>) -> AutoscaleResult<WorldView> {
        let fresh = snapshot::collect(self.queue.as_ref(), self.nodes.as_ref()).await?;

        let world = match previous {
            Some(previous) => reconcile_with(&self.policy, previous, fresh),
            None => {
                debug!("bootstrap cycle, no previous world view");
                fresh
            }
        };

        let decision = explain(&self.policy, &world);
        match &decision.action {
            Action::NoOp => debug!(
                backlog = world.backlog,
                agents = world.agent_count,
                alive = world.alive.len(),
                pending = world.pending.len(),
                "no action"
            ),
            Action::StartNode(node) => info!(
                node = %node,
                backlog = world.backlog,
                "scaling up"
            ),
            Action::StopNodes(_) => {
                for (node, reason) in &decision.stop_reasons {
                    let age_mins = world
                        .alive
                        .get(node)
                        .map(|&started| world.age_secs(started) / 60)
                        .unwrap_or_default();
                    info!(
                        node = %node,
                        reason = ?reason,
                        age_mins,
                        backlog = world.backlog,
                        "scaling down"
                    );
                }
            }
        }

        self.executor.act(world, &decision.action).await
    }
}
