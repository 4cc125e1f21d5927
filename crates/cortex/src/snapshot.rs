//! Read-only view of the game for the render loop
//!
//! The game loop builds a fresh [`GameSnapshot`] at the end of every tick and
//! swaps it in behind a lock; readers clone the `Arc` and never hold the lock
//! while drawing.

use crate::dispatch::RecognitionRecord;
use crate::managers::ColorMode;
use crate::recognition::TrackProgress;
use crate::session::GameState;
use circuitfarm_kernel::{PhaseVerdict, ZoneObjects};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub tick: u64,
    pub state: GameState,
    pub running: bool,
    pub tutorial_step: Option<String>,
    /// Debounced board (zone -> physical label)
    pub zone_objects: ZoneObjects,
    pub verdict: Option<PhaseVerdict>,
    pub show_results: bool,
    pub progress: Vec<TrackProgress>,
    pub history: Vec<RecognitionRecord>,
    pub opacity: u8,
    pub brightness_percentage: f32,
    pub volume: f32,
    pub color_mode: ColorMode,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            state: GameState::Menu,
            running: true,
            tutorial_step: None,
            zone_objects: ZoneObjects::new(),
            verdict: None,
            show_results: false,
            progress: Vec::new(),
            history: Vec::new(),
            opacity: 0,
            brightness_percentage: 100.0,
            volume: 1.0,
            color_mode: ColorMode::Color,
        }
    }
}

#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    latest: Arc<RwLock<Arc<GameSnapshot>>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: GameSnapshot) {
        *self.latest.write() = Arc::new(snapshot);
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            latest: Arc::clone(&self.latest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotReader {
    latest: Arc<RwLock<Arc<GameSnapshot>>>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<GameSnapshot> {
        Arc::clone(&self.latest.read())
    }
}
