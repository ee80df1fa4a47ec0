//! jitfleet-autoscale — just-in-time compute-fleet autoscaling.
//!
//! Watches a CI job queue and a cloud node manager, and starts or stops
//! managed nodes so the backlog is served at the lowest billed cost.
//!
//! # Cycle
//!
//! ```text
//! tick(previous)
//!   ├── snapshot   five concurrent reads → WorldView (pending = {})
//!   ├── reconcile  carry previous.pending, drop resolved/expired
//!   ├── decide     NoOp | StartNode | StopNodes
//!   └── act        start/stop requests → pending[node] = time
//! ```
//!
//! `tick` never loops. Hosts call it on their own schedule, or use
//! [`driver::run`]. State lives only in the returned [`WorldView`]; a
//! restart loses pending bookkeeping, which heals within one expiry
//! window.

pub mod autoscaler;
pub mod decide;
pub mod driver;
pub mod error;
pub mod executor;
pub mod reconcile;
pub mod snapshot;
pub mod source;

#[cfg(test)]
mod testing;

pub use autoscaler::Autoscaler;
pub use decide::{Decision, StopReason, decide, decide_with, explain};
pub use error::{AutoscaleError, AutoscaleResult, SourceError};
pub use executor::Executor;
pub use reconcile::{reconcile, reconcile_with};
pub use source::{NodeManagerSource, SourceFuture, WorkQueueSource};
