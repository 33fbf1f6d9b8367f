//! dmx-hue - Art-Net node driving Philips Hue lights
//!
//! Listens for ArtDmx frames on one universe, maps consecutive DMX channels
//! onto the lights known to a Hue bridge, and forwards color changes while
//! respecting the bridge's command rate.

mod cli;
mod hue;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dmx_engine::{
    run_scheduler_actor, FixturePlan, LightingBridge, SchedulerCommand, UniverseListener,
    UpdateScheduler,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::Args;
use crate::hue::HueBridge;
use crate::settings::Settings;

/// Frames buffered between the listener and the scheduler
const FRAME_QUEUE_DEPTH: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dmx_hue=info,dmx_engine=info,dmx_protocol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let config = args.session_config(&settings)?;

    let bridge = HueBridge::from_parts(args.bridge_ip(&settings), args.bridge_user(&settings))
        .context("Hue bridge not configured (set --bridge and --user or the settings file)")?;

    let lights = bridge
        .list_fixtures()
        .await
        .context("failed to list lights from the Hue bridge")?;
    if lights.is_empty() {
        anyhow::bail!("no lights found on the Hue bridge");
    }

    let plan = FixturePlan::build(
        &lights,
        &settings.disabled_ids(),
        &settings.lights_order,
        config.channel_mode.channels_per_fixture(),
        config.base_address,
        config.transition.uses_channel(),
    )?;
    if plan.is_empty() {
        warn!("No lights mapped to DMX channels");
    }

    info!(
        "Mode: {} ({} channels per light), transition: {}, colorloop: {}, rate limit: {}",
        config.channel_mode,
        plan.channels_per_fixture(),
        config.transition,
        config.colorloop,
        config.rate_limit
    );
    info!("DMX addresses mapping:");
    for (address, name) in plan.mapping() {
        info!(" {}: {}", address, name);
    }

    let (frame_tx, frame_rx) = mpsc::channel(FRAME_QUEUE_DEPTH);
    let listener = match UniverseListener::bind(args.listen_addr(), config.universe, frame_tx.clone())
        .await
    {
        Ok(listener) => listener,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let scheduler = UpdateScheduler::new(plan, &config);
    let actor = tokio::spawn(run_scheduler_actor(scheduler, Arc::new(bridge), frame_rx));

    tokio::select! {
        result = listener.run() => {
            result?;
            warn!("Listener stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    let _ = frame_tx.send(SchedulerCommand::Shutdown).await;
    let _ = actor.await;
    Ok(())
}
