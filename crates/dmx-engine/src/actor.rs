//! Scheduler actor
//!
//! Owns an [`UpdateScheduler`] and drives it from two sources: frames
//! forwarded by the listener and the single retry deadline. Light commands
//! are spawned as independent tasks so a slow bridge never holds up frame
//! processing.
//!
//! # Example
//!
//! ```rust,ignore
//! use dmx_engine::actor::{run_scheduler_actor, SchedulerCommand};
//! use tokio::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel(64);
//! tokio::spawn(run_scheduler_actor(scheduler, bridge, rx));
//!
//! tx.send(SchedulerCommand::Frame(frame)).await?;
//! ```

use std::sync::Arc;

use dmx_protocol::Frame;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::bridge::LightingBridge;
use crate::scheduler::{Dispatch, UpdateScheduler};

/// Commands sent to the scheduler actor
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// DMX frame for the followed universe
    Frame(Frame),
    /// Stop the actor
    Shutdown,
}

/// Send each dispatch on its own task and forget about it
fn spawn_dispatches<B: LightingBridge>(bridge: &Arc<B>, dispatches: Vec<Dispatch>) {
    for Dispatch {
        fixture_id,
        command,
    } in dispatches
    {
        let bridge = Arc::clone(bridge);
        tokio::spawn(async move {
            if let Err(e) = bridge.apply_command(&fixture_id, &command).await {
                warn!("Failed to update fixture {}: {}", fixture_id, e);
            }
        });
    }
}

/// Run the scheduler actor until shutdown or until every sender is dropped
///
/// # Arguments
///
/// * `scheduler` - State machine deciding what to send and when
/// * `bridge` - Destination for light commands
/// * `cmd_rx` - Frames from the listener
pub async fn run_scheduler_actor<B, R>(
    mut scheduler: UpdateScheduler<R>,
    bridge: Arc<B>,
    mut cmd_rx: mpsc::Receiver<SchedulerCommand>,
) where
    B: LightingBridge,
    R: Rng + Send + 'static,
{
    info!(
        "Scheduler actor started ({} fixtures)",
        scheduler.plan().len()
    );

    loop {
        let retry_at = scheduler.next_retry().map(Instant::from_std);
        let retry = async {
            match retry_at {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    SchedulerCommand::Frame(frame) => {
                        let now = Instant::now().into_std();
                        let dispatches = scheduler.on_frame(frame, now);
                        spawn_dispatches(&bridge, dispatches);
                    }
                    SchedulerCommand::Shutdown => {
                        info!("Scheduler actor shutting down");
                        break;
                    }
                }
            }

            _ = retry => {
                let now = Instant::now().into_std();
                let dispatches = scheduler.on_retry(now);
                debug!("Retry fired, {} dispatch(es)", dispatches.len());
                spawn_dispatches(&bridge, dispatches);
            }
        }
    }

    info!("Scheduler actor stopped");
}
