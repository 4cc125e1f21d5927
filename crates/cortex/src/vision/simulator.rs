//! Scripted detector for running without a camera
//!
//! Plays one session of Fase 1: start the game from the menu, lay out the
//! winning board, hold an open palm to check it, then put the hands down.

use crate::types::{BoundingBox, Detection, DetectionFrame, EntityKey, Hand, RecognitionKind, ZoneHint};
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Center of the gesture zone, normalised
const GESTURE_SPOT: (f32, f32) = (0.15, 0.65);

/// (label, bbox center) of the winning Fase 1 board
const BOARD: &[(&str, (f32, f32))] = &[
    ("clock", (600.0, 200.0)),
    ("remote", (600.0, 800.0)),
    ("orange", (1000.0, 500.0)),
    ("scissors", (1400.0, 500.0)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptTimings {
    /// ILoveYou held from 0 until here
    pub start_gesture_until: Duration,
    /// Board objects present from here on
    pub board_from: Duration,
    /// Open palm held in this window
    pub check_from: Duration,
    pub check_until: Duration,
}

impl Default for ScriptTimings {
    fn default() -> Self {
        Self {
            start_gesture_until: Duration::from_secs(3),
            board_from: Duration::from_secs(3),
            check_from: Duration::from_secs(6),
            check_until: Duration::from_secs(9),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    started: Instant,
    timings: ScriptTimings,
}

impl ScriptedDetector {
    pub fn new(started: Instant) -> Self {
        Self::with_timings(started, ScriptTimings::default())
    }

    pub fn with_timings(started: Instant, timings: ScriptTimings) -> Self {
        Self { started, timings }
    }

    /// The gesture frame and the object frame seen `elapsed` into the script.
    pub fn frames_at(&self, elapsed: Duration) -> [DetectionFrame; 2] {
        let at = self.started + elapsed;
        let t = &self.timings;

        let gesture = if elapsed < t.start_gesture_until {
            Some("ILoveYou")
        } else if elapsed >= t.check_from && elapsed < t.check_until {
            Some("Open_Palm")
        } else {
            None
        };
        let hands = gesture
            .map(|name| Detection {
                entity: EntityKey::Hand(Hand::Left),
                name: name.to_string(),
                confidence: 0.9,
                hint: Some(ZoneHint::Normalized {
                    x: GESTURE_SPOT.0,
                    y: GESTURE_SPOT.1,
                }),
            })
            .into_iter()
            .collect();

        let objects = if elapsed >= t.board_from {
            BOARD
                .iter()
                .enumerate()
                .map(|(i, &(label, (cx, cy)))| Detection {
                    entity: EntityKey::object(label, i),
                    name: label.to_string(),
                    confidence: 0.8,
                    hint: Some(ZoneHint::Bbox(BoundingBox {
                        x: cx - 30.0,
                        y: cy - 30.0,
                        width: 60.0,
                        height: 60.0,
                    })),
                })
                .collect()
        } else {
            Vec::new()
        };

        [
            DetectionFrame::at(RecognitionKind::Gesture, hands, at),
            DetectionFrame::at(RecognitionKind::Object, objects, at),
        ]
    }
}

/// Feed the script into `frames` every `period` until the receiver goes away.
pub fn spawn_simulator_task(frames: Sender<DetectionFrame>, period: Duration) -> JoinHandle<()> {
    let detector = ScriptedDetector::new(Instant::now());
    log::info!("Scripted detector started");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let elapsed = detector.started.elapsed();
            for frame in detector.frames_at(elapsed) {
                if frames.send(frame).is_err() {
                    log::info!("Frame receiver dropped, stopping scripted detector");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_phases() {
        let t0 = Instant::now();
        let sim = ScriptedDetector::new(t0);

        let [hands, objects] = sim.frames_at(Duration::from_secs(1));
        assert_eq!(hands.detections[0].name, "ILoveYou");
        assert!(objects.detections.is_empty());
        assert_eq!(hands.captured_at, t0 + Duration::from_secs(1));

        let [hands, objects] = sim.frames_at(Duration::from_secs(4));
        assert!(hands.detections.is_empty());
        assert_eq!(objects.detections.len(), 4);

        let [hands, _] = sim.frames_at(Duration::from_secs(7));
        assert_eq!(hands.detections[0].name, "Open_Palm");

        let [hands, objects] = sim.frames_at(Duration::from_secs(20));
        assert!(hands.detections.is_empty());
        assert_eq!(objects.detections.len(), 4);
    }

    #[test]
    fn board_lands_in_the_circuit_zones() {
        let phase = circuitfarm_kernel::levels::fase1();
        let sim = ScriptedDetector::new(Instant::now());
        let [_, objects] = sim.frames_at(Duration::from_secs(5));
        let zones: Vec<_> = objects
            .detections
            .iter()
            .filter_map(|d| d.hint.map(|h| h.resolve(1280, 720)))
            .filter_map(|p| phase.zones.iter().find(|z| z.rect.contains(p)))
            .map(|z| z.name.as_str())
            .collect();
        assert_eq!(zones, vec!["INPUT1", "INPUT2", "GATE1", "GATE2"]);
    }
}
