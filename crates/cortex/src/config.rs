//! Cortex configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes.

use crate::managers::ColorMode;
use anyhow::{bail, Context, Result};
use circuitfarm_kernel::{default_object_mapping, GameElement, ObjectMapping};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the UDP detection listen address
pub const UDP_ADDR_ENV: &str = "CIRCUITFARM_DETECTIONS_UDP_ADDR";

/// Upper bound for the dwell and cooldown settings (one day)
const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexConfig {
    /// Camera frame size, used to scale normalised hand coordinates
    pub frame_width: u32,
    pub frame_height: u32,

    /// How long a recognition must hold still before it commits
    pub dwell_time_secs: f64,
    /// Re-fire interval of a recognition that is still held
    pub commit_cooldown_secs: f64,
    /// Minimum interval between actions for the same (name, zone)
    pub action_cooldown_secs: f64,
    /// Number of recent recognitions kept for display
    pub history_capacity: usize,

    pub min_object_confidence: f32,
    pub supported_gestures: Vec<String>,

    /// Physical label -> circuit element
    pub object_mapping: ObjectMapping,
    /// Physical label -> overlay opacity (0..255)
    pub brightness_levels: BTreeMap<String, i32>,
    /// Physical label -> volume (0.0..1.0)
    pub volume_levels: BTreeMap<String, f32>,
    /// Physical label -> color mode
    pub color_modes: BTreeMap<String, ColorMode>,
    pub default_brightness_object: String,
    pub default_volume_object: String,
    pub default_color_object: String,

    /// Game loop frequency
    pub tick_rate_hz: u32,
    /// Ordered tutorial cutscenes
    pub tutorial_steps: Vec<String>,

    /// Level started by START_GAME
    pub start_phase: u32,
    /// Extra level files loaded on top of the built-in catalog
    pub phase_files: Vec<PathBuf>,

    pub udp_addr: Option<SocketAddr>,
}

impl Default for CortexConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            frame_width: 1280,
            frame_height: 720,
            dwell_time_secs: 2.0,
            commit_cooldown_secs: 1.0,
            action_cooldown_secs: 1.0,
            history_capacity: 5,
            min_object_confidence: 0.5,
            supported_gestures: strings(&[
                "Closed_Fist",
                "Open_Palm",
                "Pointing_Up",
                "Thumb_Down",
                "Thumb_Up",
                "Victory",
                "ILoveYou",
            ]),
            object_mapping: default_object_mapping(),
            brightness_levels: [("cup", 0), ("bottle", 100), ("book", 180)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            volume_levels: [("apple", 1.0), ("mouse", 0.5), ("keyboard", 0.0)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            color_modes: [("teddy bear", ColorMode::Color), ("toothbrush", ColorMode::Grayscale)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            default_brightness_object: "cup".to_string(),
            default_volume_object: "apple".to_string(),
            default_color_object: "teddy bear".to_string(),
            tick_rate_hz: 30,
            tutorial_steps: strings(&[
                "cutscene1",
                "cutscene2",
                "cutscene3",
                "cutscene4_tutorial",
                "cutscene5_tutorial_pratico",
                "cutscene6_inicio_missoes",
            ]),
            start_phase: 1,
            phase_files: Vec::new(),
            udp_addr: None,
        }
    }
}

impl CortexConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: CortexConfig = toml::from_str(s).context("Failed to parse cortex config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded cortex config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("dwell_time_secs", self.dwell_time_secs),
            ("commit_cooldown_secs", self.commit_cooldown_secs),
            ("action_cooldown_secs", self.action_cooldown_secs),
        ] {
            let duration = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("{name} must be a non-negative number of seconds, got {secs}"))?;
            // Durations are added to frame timestamps
            if duration > MAX_DURATION {
                bail!("{name} must be at most {} seconds, got {secs}", MAX_DURATION.as_secs());
            }
        }
        for (label, element) in &self.object_mapping {
            if GameElement::parse(element).is_none() {
                bail!("object_mapping: '{label}' maps to unknown element '{element}'");
            }
        }
        if self.tick_rate_hz == 0 {
            bail!("tick_rate_hz must be at least 1");
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be at least 1");
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            bail!("frame size must be non-zero");
        }
        Ok(())
    }

    pub fn dwell_time(&self) -> Duration {
        Duration::from_secs_f64(self.dwell_time_secs)
    }

    pub fn commit_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.commit_cooldown_secs)
    }

    pub fn action_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.action_cooldown_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    /// Every physical label the game reacts to.
    pub fn supported_objects(&self) -> BTreeSet<String> {
        self.object_mapping
            .keys()
            .chain(self.brightness_levels.keys())
            .chain(self.volume_levels.keys())
            .chain(self.color_modes.keys())
            .cloned()
            .collect()
    }

    pub fn default_opacity(&self) -> i32 {
        self.brightness_levels
            .get(&self.default_brightness_object)
            .copied()
            .unwrap_or(0)
    }

    pub fn default_volume(&self) -> f32 {
        self.volume_levels
            .get(&self.default_volume_object)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn default_color_mode(&self) -> ColorMode {
        self.color_modes
            .get(&self.default_color_object)
            .copied()
            .unwrap_or(ColorMode::Color)
    }

    /// UDP address from the config, overridden by the environment.
    pub fn udp_addr_with_env(&self) -> Option<SocketAddr> {
        match std::env::var(UDP_ADDR_ENV) {
            Ok(raw) => match raw.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    log::warn!("Ignoring {UDP_ADDR_ENV}={raw}: {e}");
                    self.udp_addr
                }
            },
            Err(_) => self.udp_addr,
        }
    }
}
