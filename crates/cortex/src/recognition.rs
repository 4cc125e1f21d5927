//! Recognition temporal validator
//!
//! Vision detections flicker from frame to frame. A recognition only counts
//! once the same entity has shown the same name in the same zone for the
//! dwell time; after that it re-fires at most once per commit cooldown while
//! it is still held.
//!
//! Per entity the state is:
//!
//! ```text
//! none -> tracking(name, zone, since) -> committed(last) -> committed(last') ...
//! ```
//!
//! Any change of name or zone, leaving every zone, or disappearing from the
//! frame drops the entity back to `none`.

use crate::config::CortexConfig;
use crate::types::{DetectionFrame, EntityKey, RecognitionKind};
use crate::zones::ZoneManager;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

/// A committed recognition, ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub kind: RecognitionKind,
    pub name: String,
    pub zone: String,
    pub entity: EntityKey,
    pub confidence: f32,
    pub at: Instant,
}

/// Dwell progress of one tracked entity, for the "filling" indicator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackProgress {
    pub entity: EntityKey,
    pub name: String,
    pub zone: String,
    pub progress: f32,
}

#[derive(Debug, Clone)]
struct Track {
    name: String,
    zone: String,
    since: Instant,
}

/// Which detections are worth tracking at all
#[derive(Debug, Clone)]
pub struct IntakeFilter {
    pub supported_names: HashSet<String>,
    pub min_confidence: f32,
}

impl IntakeFilter {
    pub fn gestures(config: &CortexConfig) -> Self {
        Self {
            supported_names: config.supported_gestures.iter().cloned().collect(),
            min_confidence: 0.0,
        }
    }

    pub fn objects(config: &CortexConfig) -> Self {
        Self {
            supported_names: config.supported_objects().into_iter().collect(),
            min_confidence: config.min_object_confidence,
        }
    }

    pub fn accepts(&self, name: &str, confidence: f32) -> bool {
        self.supported_names.contains(name) && confidence >= self.min_confidence
    }
}

pub struct RecognitionValidator {
    kind: RecognitionKind,
    dwell: Duration,
    cooldown: Duration,
    filter: IntakeFilter,
    frame_size: (u32, u32),
    tracks: HashMap<EntityKey, Track>,
    commits: HashMap<(EntityKey, String, String), Instant>,
}

impl RecognitionValidator {
    pub fn new(kind: RecognitionKind, dwell: Duration, cooldown: Duration, filter: IntakeFilter) -> Self {
        Self {
            kind,
            dwell,
            cooldown,
            filter,
            frame_size: (1280, 720),
            tracks: HashMap::new(),
            commits: HashMap::new(),
        }
    }

    pub fn for_gestures(config: &CortexConfig) -> Self {
        Self::new(
            RecognitionKind::Gesture,
            config.dwell_time(),
            config.commit_cooldown(),
            IntakeFilter::gestures(config),
        )
        .with_frame_size(config.frame_width, config.frame_height)
    }

    pub fn for_objects(config: &CortexConfig) -> Self {
        Self::new(
            RecognitionKind::Object,
            config.dwell_time(),
            config.commit_cooldown(),
            IntakeFilter::objects(config),
        )
        .with_frame_size(config.frame_width, config.frame_height)
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    pub fn kind(&self) -> RecognitionKind {
        self.kind
    }

    /// Feed one detection of one entity. Returns the recognition when it
    /// commits (first time after the dwell, then once per cooldown).
    pub fn process(
        &mut self,
        name: &str,
        zone: Option<&str>,
        entity: &EntityKey,
        now: Instant,
        confidence: f32,
    ) -> Option<Recognition> {
        let Some(zone) = zone else {
            self.clear_entity(entity);
            return None;
        };

        let same = self
            .tracks
            .get(entity)
            .map(|t| t.name == name && t.zone == zone);

        match same {
            None | Some(false) => {
                if same.is_some() {
                    log::debug!("{} changed to {} in {}, restarting dwell", entity, name, zone);
                }
                self.clear_entity(entity);
                self.tracks.insert(
                    entity.clone(),
                    Track {
                        name: name.to_string(),
                        zone: zone.to_string(),
                        since: now,
                    },
                );
                return None;
            }
            Some(true) => {}
        }

        let since = self.tracks.get(entity)?.since;
        if now.saturating_duration_since(since) < self.dwell {
            return None;
        }

        let key = (entity.clone(), name.to_string(), zone.to_string());
        let fire = match self.commits.get(&key) {
            None => true,
            Some(&last) => now.saturating_duration_since(last) >= self.cooldown,
        };
        if !fire {
            return None;
        }

        self.commits.insert(key, now);
        log::info!(
            "Validated {} ({}): {} | {} | confidence {:.2}",
            self.kind,
            entity,
            name,
            zone,
            confidence
        );
        Some(Recognition {
            kind: self.kind,
            name: name.to_string(),
            zone: zone.to_string(),
            entity: entity.clone(),
            confidence,
            at: now,
        })
    }

    /// Feed a whole detector frame: filter, resolve zones, track, collect
    /// entities that disappeared. Commits that are not legal in their zone
    /// (any more) are dropped.
    pub fn process_frame(&mut self, frame: &DetectionFrame, zones: &ZoneManager) -> Vec<Recognition> {
        if frame.kind != self.kind {
            log::warn!("{} validator ignoring a {} frame", self.kind, frame.kind);
            return Vec::new();
        }

        let now = frame.captured_at;
        let (width, height) = self.frame_size;
        let mut live = HashSet::new();
        let mut committed = Vec::new();

        for detection in &frame.detections {
            if !self.filter.accepts(&detection.name, detection.confidence) {
                continue;
            }
            live.insert(detection.entity.clone());

            let zone = detection
                .hint
                .map(|hint| hint.resolve(width, height))
                .and_then(|p| zones.zone_for_point(p))
                .map(|z| z.name.clone());

            if let Some(recognition) = self.process(
                &detection.name,
                zone.as_deref(),
                &detection.entity,
                now,
                detection.confidence,
            ) {
                if zones.is_recognition_valid_for_zone(&recognition.name, &recognition.zone, self.kind) {
                    committed.push(recognition);
                } else {
                    log::debug!(
                        "{} '{}' is not valid in zone {}",
                        self.kind,
                        recognition.name,
                        recognition.zone
                    );
                }
            }
        }

        self.retain_live(&live);
        committed
    }

    /// Forget every entity not in `live`.
    pub fn retain_live(&mut self, live: &HashSet<EntityKey>) {
        self.tracks.retain(|entity, _| live.contains(entity));
        self.commits.retain(|(entity, _, _), _| live.contains(entity));
    }

    /// Fraction of the dwell time elapsed for `entity`, 0 when untracked.
    pub fn get_validation_progress(&self, entity: &EntityKey, now: Instant) -> f32 {
        self.tracks
            .get(entity)
            .map(|t| self.progress(t, now))
            .unwrap_or(0.0)
    }

    pub fn progress_all(&self, now: Instant) -> Vec<TrackProgress> {
        let mut all: Vec<_> = self
            .tracks
            .iter()
            .map(|(entity, t)| TrackProgress {
                entity: entity.clone(),
                name: t.name.clone(),
                zone: t.zone.clone(),
                progress: self.progress(t, now),
            })
            .collect();
        all.sort_by(|a, b| a.entity.cmp(&b.entity));
        all
    }

    fn progress(&self, track: &Track, now: Instant) -> f32 {
        if self.dwell.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(track.since);
        (elapsed.as_secs_f32() / self.dwell.as_secs_f32()).min(1.0)
    }

    /// Zone -> label of committed, still tracked entities. When several
    /// share a zone the one tracked longest wins.
    pub fn zone_contents(&self) -> BTreeMap<String, String> {
        let mut best: BTreeMap<String, (Instant, &EntityKey, &str)> = BTreeMap::new();
        for (entity, track) in &self.tracks {
            let key = (entity.clone(), track.name.clone(), track.zone.clone());
            if !self.commits.contains_key(&key) {
                continue;
            }
            let candidate = (track.since, entity, track.name.as_str());
            best.entry(track.zone.clone())
                .and_modify(|current| {
                    if (candidate.0, candidate.1) < (current.0, current.1) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
        best.into_iter()
            .map(|(zone, (_, _, name))| (zone, name.to_string()))
            .collect()
    }

    pub fn tracked_count(&self) -> usize {
        self.tracks.len()
    }

    /// Drop all tracking state.
    pub fn cleanup(&mut self) {
        self.tracks.clear();
        self.commits.clear();
    }

    fn clear_entity(&mut self, entity: &EntityKey) {
        self.tracks.remove(entity);
        self.commits.retain(|(e, _, _), _| e != entity);
    }
}
