//! Display and audio settings owned outside the core
//!
//! The renderer and the audio mixer own the real brightness overlay, volume
//! and color filter. The core only talks to them through these traits; the
//! in-memory implementations hold the values the render loop reads back from
//! the snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_OPACITY: i32 = 255;

/// Black overlay drawn over the whole screen. Opacity 0 is full brightness,
/// 255 is black.
pub trait BrightnessControl: Send {
    fn opacity(&self) -> u8;
    fn set_opacity(&mut self, opacity: i32);

    fn brightness_percentage(&self) -> f32 {
        (MAX_OPACITY - self.opacity() as i32) as f32 / MAX_OPACITY as f32 * 100.0
    }
}

pub trait VolumeControl: Send {
    /// Volume in 0.0..=1.0
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);

    fn volume_percentage(&self) -> f32 {
        self.volume() * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Color,
    Grayscale,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Color => f.write_str("color"),
            ColorMode::Grayscale => f.write_str("grayscale"),
        }
    }
}

pub trait ColorControl: Send {
    fn mode(&self) -> ColorMode;
    fn set_mode(&mut self, mode: ColorMode);
}

#[derive(Debug, Clone, Default)]
pub struct BrightnessOverlay {
    opacity: u8,
}

impl BrightnessOverlay {
    pub fn new(opacity: i32) -> Self {
        let mut overlay = Self::default();
        overlay.set_opacity(opacity);
        overlay
    }
}

impl BrightnessControl for BrightnessOverlay {
    fn opacity(&self) -> u8 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: i32) {
        self.opacity = opacity.clamp(0, MAX_OPACITY) as u8;
        log::info!("Overlay opacity set to {}/255", self.opacity);
    }
}

#[derive(Debug, Clone)]
pub struct AudioLevel {
    volume: f32,
}

impl AudioLevel {
    pub fn new(volume: f32) -> Self {
        let mut level = Self { volume: 1.0 };
        level.set_volume(volume);
        level
    }
}

impl Default for AudioLevel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl VolumeControl for AudioLevel {
    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        log::info!("Volume set to {:.0}%", self.volume * 100.0);
    }
}

#[derive(Debug, Clone)]
pub struct ColorFilter {
    mode: ColorMode,
}

impl ColorFilter {
    pub fn new(mode: ColorMode) -> Self {
        Self { mode }
    }
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self::new(ColorMode::Color)
    }
}

impl ColorControl for ColorFilter {
    fn mode(&self) -> ColorMode {
        self.mode
    }

    fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
        log::info!("Color mode set to {}", mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_clamped() {
        let mut overlay = BrightnessOverlay::new(300);
        assert_eq!(overlay.opacity(), 255);
        assert_eq!(overlay.brightness_percentage(), 0.0);
        overlay.set_opacity(-4);
        assert_eq!(overlay.opacity(), 0);
        assert_eq!(overlay.brightness_percentage(), 100.0);
    }

    #[test]
    fn volume_is_clamped() {
        let mut audio = AudioLevel::new(1.5);
        assert_eq!(audio.volume(), 1.0);
        audio.set_volume(-0.2);
        assert_eq!(audio.volume(), 0.0);
        audio.set_volume(0.5);
        assert_eq!(audio.volume_percentage(), 50.0);
    }

    #[test]
    fn color_mode_serde() {
        let mode: ColorMode = serde_json::from_str("\"grayscale\"").unwrap();
        assert_eq!(mode, ColorMode::Grayscale);
        let mut filter = ColorFilter::default();
        filter.set_mode(mode);
        assert_eq!(filter.mode(), ColorMode::Grayscale);
    }
}
