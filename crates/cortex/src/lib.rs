//! # Circuit Farm Cortex
//!
//! The interactive side of the circuit game: detection frames from the hand
//! and object detectors go through the dwell/cooldown validators, committed
//! recognitions are routed to actions, and the game session evaluates the
//! board. The render loop only sees [`GameSnapshot`]s and [`GameEvent`]s.

pub mod actions;
pub mod config;
pub mod dispatch;
pub mod managers;
pub mod recognition;
pub mod session;
pub mod snapshot;
pub mod types;
pub mod vision;
pub mod zones;

pub use actions::{ActionContext, ActionId, ActionRegistry, RouteTable};
pub use config::CortexConfig;
pub use dispatch::{ActionDispatcher, DispatchOutcome, RecognitionRecord};
pub use recognition::{Recognition, RecognitionValidator};
pub use session::{GameEvent, GameSession, GameState};
pub use snapshot::{GameSnapshot, SnapshotPublisher, SnapshotReader};
pub use types::*;
pub use vision::VisionPathway;
pub use zones::{Screen, ZoneManager};

use anyhow::Context;
use circuitfarm_kernel::{PhaseCatalog, PhaseConfig, ZoneObjects};
use crossbeam_channel::{Receiver, Sender};
use std::time::Instant;

/// Build the level catalog: built-in levels, then any level files on top.
pub fn load_catalog(config: &CortexConfig) -> anyhow::Result<PhaseCatalog> {
    let mut catalog = PhaseCatalog::builtin();
    for path in &config.phase_files {
        let phase = PhaseConfig::load(path).with_context(|| format!("Failed to load level {}", path.display()))?;
        catalog
            .insert(phase)
            .with_context(|| format!("Invalid level {}", path.display()))?;
    }
    log::info!("{} level(s) available", catalog.len());
    Ok(catalog)
}

/// The game loop: owns the validators, the dispatcher and the session
pub struct Cortex {
    config: CortexConfig,
    zones: ZoneManager,
    gestures: RecognitionValidator,
    objects: RecognitionValidator,
    dispatcher: ActionDispatcher,
    session: GameSession,
    publisher: SnapshotPublisher,
    frames: Receiver<DetectionFrame>,
    vision: Option<VisionPathway>,
    installed_phase: Option<u32>,
    ticks: u64,
}

impl Cortex {
    pub fn new(config: CortexConfig, frames: Receiver<DetectionFrame>) -> anyhow::Result<Self> {
        log::info!("Initializing Circuit Farm Cortex...");
        config.validate()?;

        let catalog = load_catalog(&config)?;
        if catalog.get(config.start_phase).is_none() {
            anyhow::bail!("Start level {} is not in the catalog", config.start_phase);
        }

        let registry = ActionRegistry::from_config(&config);
        let routes = RouteTable::standard();
        let zones = ZoneManager::standard(&registry, &routes, config.frame_width);
        let dispatcher = ActionDispatcher::new(registry, routes, config.action_cooldown(), config.history_capacity);

        let cortex = Self {
            zones,
            gestures: RecognitionValidator::for_gestures(&config),
            objects: RecognitionValidator::for_objects(&config),
            dispatcher,
            session: GameSession::new(&config, catalog),
            publisher: SnapshotPublisher::new(),
            frames,
            vision: None,
            installed_phase: None,
            ticks: 0,
            config,
        };
        cortex.publish(Instant::now());

        log::info!("Cortex initialization complete");
        Ok(cortex)
    }

    /// Detection sources started by [`Cortex::run`].
    pub fn attach_vision(&mut self, vision: VisionPathway) {
        self.vision = Some(vision);
    }

    /// Forward game events to the render loop.
    pub fn connect_events(&mut self, tx: Sender<GameEvent>) {
        log::info!("Connecting game events to the render loop");
        self.session.connect_events(tx);
    }

    pub fn snapshots(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &CortexConfig {
        &self.config
    }

    /// One game loop step: drain the pending frames, act on what committed,
    /// publish a snapshot.
    pub fn tick(&mut self, now: Instant) {
        self.ticks += 1;
        let pending: Vec<DetectionFrame> = self.frames.try_iter().collect();
        for frame in &pending {
            self.handle_frame(frame);
        }
        self.sync_zones();
        self.publish(now);
    }

    fn handle_frame(&mut self, frame: &DetectionFrame) {
        let validator = match frame.kind {
            RecognitionKind::Gesture => &mut self.gestures,
            RecognitionKind::Object => &mut self.objects,
        };
        let committed = validator.process_frame(frame, &self.zones);

        for recognition in committed {
            let screen = self.session.state().screen();
            let outcome = self.dispatcher.execute_action(&recognition, screen, &mut self.session);
            log::debug!("{} | {} -> {:?}", recognition.name, recognition.zone, outcome);
            self.sync_zones();
        }

        if frame.kind == RecognitionKind::Object {
            self.refresh_board();
        }
    }

    /// Follow the session's screen: install the level's zones, drop held
    /// gestures when the screen changes.
    fn sync_zones(&mut self) {
        let state = self.session.state();

        if let GameState::Phase { id } = state {
            if self.installed_phase != Some(id) {
                if let Some(phase) = self.session.current_phase() {
                    self.zones.set_phase_zones(phase, self.config.object_mapping.keys());
                    self.installed_phase = Some(id);
                }
            }
        }

        let screen = state.screen();
        if screen != self.zones.screen() {
            self.zones.set_screen(screen);
            self.gestures.cleanup();
            self.refresh_board();
        }
    }

    fn refresh_board(&mut self) {
        let contents = self.objects.zone_contents();
        let board: ZoneObjects = match self.session.current_phase() {
            Some(phase) => phase
                .zone_names()
                .map(|zone| (zone.to_string(), contents.get(zone).cloned()))
                .collect(),
            None => ZoneObjects::new(),
        };
        self.session.set_zone_objects(board);
    }

    fn publish(&self, now: Instant) {
        let mut progress = self.gestures.progress_all(now);
        progress.extend(self.objects.progress_all(now));

        self.publisher.publish(GameSnapshot {
            tick: self.ticks,
            state: self.session.state(),
            running: self.session.is_running(),
            tutorial_step: self.session.tutorial_step_name().map(String::from),
            zone_objects: self.session.zone_objects().clone(),
            verdict: self.session.last_verdict().cloned(),
            show_results: self.session.should_show_results(),
            progress,
            history: self.dispatcher.recognition_history(),
            opacity: self.session.opacity(),
            brightness_percentage: self.session.brightness_percentage(),
            volume: self.session.volume(),
            color_mode: self.session.color_mode(),
        });
    }

    /// Run the game loop until the player exits or `shutdown` fires.
    pub async fn run(&mut self, mut shutdown: tokio::sync::mpsc::Receiver<()>) -> anyhow::Result<()> {
        log::info!("Starting Cortex game loop...");

        if let Some(vision) = self.vision.as_mut() {
            vision.start().await?;
        }

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Instant::now());
                    if !self.session.is_running() {
                        log::info!("Player left the game");
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    log::info!("Shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Shutdown the Cortex system gracefully
    pub fn shutdown(mut self) {
        log::info!("Shutting down Cortex...");
        if let Some(vision) = self.vision.as_mut() {
            vision.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn catalog_includes_level_files() {
        let level = include_str!("../../kernel/levels/fase1.toml")
            .replace("id = 1", "id = 2")
            .replace("name = \"Fase 1\"", "name = \"Fase 2\"");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", level).unwrap();

        let config = CortexConfig {
            phase_files: vec![file.path().to_path_buf()],
            ..CortexConfig::default()
        };
        let catalog = load_catalog(&config).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(2).map(|p| p.name.as_str()), Some("Fase 2"));
    }

    #[test]
    fn missing_start_level_is_an_error() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let config = CortexConfig {
            start_phase: 42,
            ..CortexConfig::default()
        };
        assert!(Cortex::new(config, rx).is_err());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (_frames_tx, frames_rx) = crossbeam_channel::unbounded();
        let mut cortex = Cortex::new(CortexConfig::default(), frames_rx).unwrap();
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        tx.send(()).await.unwrap();
        cortex.run(rx).await.unwrap();
        cortex.shutdown();
    }
}
