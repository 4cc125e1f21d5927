//! Core data types for the Cortex system

use circuitfarm_kernel::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Which hand a gesture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Left" | "left" | "L" => Some(Hand::Left),
            "Right" | "right" | "R" => Some(Hand::Right),
            _ => None,
        }
    }
}

/// Identity of a tracked entity. Hands and object instances live in
/// separate namespaces, so a hand can never collide with an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKey {
    Hand(Hand),
    /// An object instance: its label and its index in the detector frame
    Object { label: String, index: usize },
}

impl EntityKey {
    pub fn object(label: impl Into<String>, index: usize) -> Self {
        EntityKey::Object {
            label: label.into(),
            index,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Hand(hand) => write!(f, "{:?}_hand", hand),
            EntityKey::Object { label, index } => write!(f, "{}_{}", label, index),
        }
    }
}

/// What the detector recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionKind {
    Gesture,
    Object,
}

impl fmt::Display for RecognitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionKind::Gesture => f.write_str("gesture"),
            RecognitionKind::Object => f.write_str("object"),
        }
    }
}

/// Bounding box for detected objects, in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center(&self) -> Point {
        Point::new(
            (self.x + self.width / 2.0) as i32,
            (self.y + self.height / 2.0) as i32,
        )
    }
}

/// Where a detection is, as reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZoneHint {
    /// Frame pixels
    Point(Point),
    /// Normalised 0..1 coordinates, e.g. a hand landmark
    Normalized { x: f32, y: f32 },
    /// Object bounding box; resolved through its center
    Bbox(BoundingBox),
}

impl ZoneHint {
    /// Pixel position used for zone lookup.
    pub fn resolve(&self, frame_width: u32, frame_height: u32) -> Point {
        match *self {
            ZoneHint::Point(p) => p,
            ZoneHint::Normalized { x, y } => Point::new(
                (x * frame_width as f32) as i32,
                (y * frame_height as f32) as i32,
            ),
            ZoneHint::Bbox(bbox) => bbox.center(),
        }
    }
}

/// One recognised gesture or object in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub entity: EntityKey,
    pub name: String,
    /// Detection confidence (0.0-1.0)
    pub confidence: f32,
    pub hint: Option<ZoneHint>,
}

/// Everything one detector saw in one frame. A frame replaces the previous
/// frame of the same kind: entities missing from it are gone.
#[derive(Debug, Clone)]
pub struct DetectionFrame {
    pub kind: RecognitionKind,
    pub detections: Vec<Detection>,
    pub captured_at: Instant,
}

impl DetectionFrame {
    pub fn new(kind: RecognitionKind, detections: Vec<Detection>) -> Self {
        Self::at(kind, detections, Instant::now())
    }

    pub fn at(kind: RecognitionKind, detections: Vec<Detection>, captured_at: Instant) -> Self {
        Self {
            kind,
            detections,
            captured_at,
        }
    }

    /// A frame in which nothing of `kind` was seen.
    pub fn empty(kind: RecognitionKind, captured_at: Instant) -> Self {
        Self::at(kind, Vec::new(), captured_at)
    }
}
