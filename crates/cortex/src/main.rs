//! Circuit Farm Cortex
//!
//! Runs the game loop headless:
//! - Receives hand and object detections (UDP and/or the scripted detector)
//! - Debounces them into committed recognitions
//! - Routes them to game actions
//! - Logs game events and snapshots in place of a renderer

use anyhow::Result;
use circuitfarm_cortex::{Cortex, CortexConfig, GameEvent, SnapshotReader, VisionPathway};
use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::LevelFilter;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "circuitfarm-cortex")]
#[command(about = "Gesture and object driven logic circuit game", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Level started from the menu
    #[arg(short, long)]
    phase: Option<u32>,

    /// Listen for detection frames on this UDP address
    #[arg(short, long, value_name = "ADDR")]
    udp: Option<SocketAddr>,

    /// Play the scripted Fase 1 session instead of waiting for a camera
    #[arg(short, long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CortexConfig::load(path)?,
        None => CortexConfig::default(),
    };
    if let Some(phase) = cli.phase {
        config.start_phase = phase;
    }
    let udp_addr = cli.udp.or_else(|| config.udp_addr_with_env());

    log::info!("═══════════════════════════════════════");
    log::info!("  Circuit Farm Cortex");
    log::info!("═══════════════════════════════════════");

    let (frames_tx, frames_rx) = crossbeam_channel::unbounded();
    let (events_tx, events_rx) = crossbeam_channel::unbounded();

    let mut cortex = Cortex::new(config, frames_rx)?;
    cortex.connect_events(events_tx);
    cortex.attach_vision(VisionPathway::new(frames_tx, udp_addr, cli.simulate));

    let render_running = Arc::new(AtomicBool::new(true));
    let render = {
        let snapshots = cortex.snapshots();
        let running = Arc::clone(&render_running);
        std::thread::spawn(move || render_loop(events_rx, snapshots, running))
    };

    log::info!("Press Ctrl+C to exit");

    let (tx, rx) = tokio::sync::mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal...");
        let _ = tx.blocking_send(());
    })?;

    let cortex_task = tokio::spawn(async move {
        if let Err(e) = cortex.run(rx).await {
            log::error!("Cortex error: {}", e);
        }
        cortex
    });

    let cortex = cortex_task.await?;
    cortex.shutdown();

    render_running.store(false, Ordering::Relaxed);
    if render.join().is_err() {
        log::warn!("Render loop panicked");
    }

    log::info!("Cortex shutdown complete. Goodbye!");
    Ok(())
}

/// Stand-in for the renderer: reports events and board changes.
fn render_loop(events: Receiver<GameEvent>, snapshots: SnapshotReader, running: Arc<AtomicBool>) {
    let mut last_board = None;

    while running.load(Ordering::Relaxed) {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(GameEvent::StateChanged { from, to }) => log::info!("[render] {:?} -> {:?}", from, to),
            Ok(GameEvent::PhaseValidated(verdict)) => {
                log::info!("[render] {}", verdict.message);
                for (zone, value) in &verdict.zone_values {
                    log::info!("[render]   {}: {:?}", zone, value);
                }
            }
            Ok(GameEvent::NarrationRepeated(state)) => log::info!("[render] replaying narration for {:?}", state),
            Ok(GameEvent::SettingChanged(setting)) => log::info!("[render] setting changed: {:?}", setting),
            Ok(GameEvent::ExitRequested) => log::info!("[render] exit requested"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let snapshot = snapshots.latest();
        if last_board.as_ref() != Some(&snapshot.zone_objects) {
            log::debug!("[render] tick {} board {:?}", snapshot.tick, snapshot.zone_objects);
            last_board = Some(snapshot.zone_objects.clone());
        }
    }
}
