//! Tick driver — calls [`Autoscaler::tick`] on a fixed interval.
//!
//! Optional. Hosts that schedule ticks themselves (cron, manual trigger)
//! call `tick` directly and keep the returned view.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use jitfleet_core::WorldView;

use crate::autoscaler::Autoscaler;
use crate::error::{AutoscaleError, AutoscaleResult};

/// Run ticks until `shutdown` fires or a fatal error occurs.
///
/// The previous view lives only in this loop. A retryable failure keeps
/// it, except a partial stop, whose recorded entries replace it. Returns
/// the last good view on shutdown.
pub async fn run(
    autoscaler: &Autoscaler,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> AutoscaleResult<Option<WorldView>> {
    info!(interval_secs = interval.as_secs(), "autoscaler driver started");

    let mut previous: Option<WorldView> = None;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match autoscaler.tick(previous.as_ref()).await {
                    Ok(view) => previous = Some(view),
                    Err(AutoscaleError::PartialStop { node, view, source }) => {
                        warn!(node = %node, error = %source, "stop batch partially applied");
                        previous = Some(*view);
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(error = %e, "tick failed, keeping previous world view");
                    }
                    Err(e) => {
                        error!(error = %e, "autoscaler driver stopping");
                        return Err(e);
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("autoscaler driver shutting down");
                break;
            }
        }
    }

    Ok(previous)
}
