//! Interaction zones per screen
//!
//! Each screen has an ordered list of rectangles. A point belongs to the
//! first zone containing it (bounds inclusive); zones are laid out so they do
//! not overlap. A zone also lists the gesture and object names that are legal
//! inside it.

use crate::actions::{ActionRegistry, RouteTable, BRIGHTNESS_ZONE, COLOR_ZONE, GESTURE_ZONE, VOLUME_ZONE};
use crate::types::RecognitionKind;
use circuitfarm_kernel::{PhaseConfig, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Side of the settings zones stacked on the right edge
const SETTINGS_ZONE_SIZE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Menu,
    Tutorial,
    Phase,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Menu, Screen::Tutorial, Screen::Phase];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub name: String,
    pub rect: Rect,
    pub gestures: BTreeSet<String>,
    pub objects: BTreeSet<String>,
}

impl Zone {
    pub fn new(name: &str, rect: Rect) -> Self {
        Self {
            name: name.to_string(),
            rect,
            gestures: BTreeSet::new(),
            objects: BTreeSet::new(),
        }
    }

    pub fn accepts(&self, name: &str, kind: RecognitionKind) -> bool {
        match kind {
            RecognitionKind::Gesture => self.gestures.contains(name),
            RecognitionKind::Object => self.objects.contains(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZoneManager {
    screen: Screen,
    screens: HashMap<Screen, Vec<Zone>>,
    /// Names of the installed phase zones
    circuit_zones: BTreeSet<String>,
}

impl ZoneManager {
    pub fn new(screens: HashMap<Screen, Vec<Zone>>) -> Self {
        Self {
            screen: Screen::Menu,
            screens,
            circuit_zones: BTreeSet::new(),
        }
    }

    /// The game layout: the gesture zone on the left, the settings zones on
    /// the right edge, legal names taken from the routes of each zone.
    pub fn standard(registry: &ActionRegistry, routes: &RouteTable, frame_width: u32) -> Self {
        let right = frame_width as i32;
        let left = right - SETTINGS_ZONE_SIZE;
        let fixed = [
            (GESTURE_ZONE, Rect::new(25, 300, 400, 650)),
            (VOLUME_ZONE, Rect::new(left, 0, right, SETTINGS_ZONE_SIZE)),
            (BRIGHTNESS_ZONE, Rect::new(left, SETTINGS_ZONE_SIZE, right, 2 * SETTINGS_ZONE_SIZE)),
            (COLOR_ZONE, Rect::new(left, 2 * SETTINGS_ZONE_SIZE, right, 3 * SETTINGS_ZONE_SIZE)),
        ];

        let screens = Screen::ALL
            .into_iter()
            .map(|screen| {
                let zones = fixed
                    .iter()
                    .map(|&(name, rect)| {
                        let ids = routes.actions_for(screen, name);
                        Zone {
                            gestures: registry.names_for(ids, RecognitionKind::Gesture),
                            objects: registry.names_for(ids, RecognitionKind::Object),
                            ..Zone::new(name, rect)
                        }
                    })
                    .collect();
                (screen, zones)
            })
            .collect();

        Self::new(screens)
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            log::info!("Zone screen changed: {:?} -> {:?}", self.screen, screen);
            self.screen = screen;
        }
    }

    /// Replace the circuit zones of the phase screen with those of `phase`.
    /// Any physical label in `objects` may be placed in them.
    pub fn set_phase_zones<'a>(&mut self, phase: &PhaseConfig, objects: impl IntoIterator<Item = &'a String>) {
        let objects: BTreeSet<String> = objects.into_iter().cloned().collect();
        let previous = std::mem::take(&mut self.circuit_zones);
        let zones = self.screens.entry(Screen::Phase).or_default();
        zones.retain(|z| !previous.contains(&z.name));
        zones.extend(phase.zones.iter().map(|spec| Zone {
            objects: objects.clone(),
            ..Zone::new(&spec.name, spec.rect)
        }));
        self.circuit_zones = phase.zone_names().map(String::from).collect();
        log::info!("Phase {} zones installed ({} circuit zones)", phase.id, phase.zones.len());
    }

    pub fn current_zones(&self) -> &[Zone] {
        self.screens
            .get(&self.screen)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn zone_for_point(&self, p: Point) -> Option<&Zone> {
        self.current_zones().iter().find(|z| z.rect.contains(p))
    }

    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.current_zones().iter().find(|z| z.name == name)
    }

    pub fn is_recognition_valid_for_zone(&self, name: &str, zone: &str, kind: RecognitionKind) -> bool {
        self.zone_by_name(zone)
            .map(|z| z.accepts(name, kind))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CortexConfig;
    use circuitfarm_kernel::levels::fase1;

    fn manager() -> ZoneManager {
        let config = CortexConfig::default();
        let registry = ActionRegistry::from_config(&config);
        let mut zones = ZoneManager::standard(&registry, &RouteTable::standard(), config.frame_width);
        zones.set_phase_zones(&fase1(), config.object_mapping.keys());
        zones
    }

    #[test]
    fn first_match_with_inclusive_bounds() {
        let zones = manager();
        assert_eq!(zones.zone_for_point(Point::new(25, 300)).map(|z| z.name.as_str()), Some("GESTOS"));
        assert_eq!(zones.zone_for_point(Point::new(400, 650)).map(|z| z.name.as_str()), Some("GESTOS"));
        assert!(zones.zone_for_point(Point::new(401, 650)).is_none());
        // The shared edge between SOM and BRILHO belongs to SOM
        assert_eq!(zones.zone_for_point(Point::new(1200, 100)).map(|z| z.name.as_str()), Some("SOM"));
        assert_eq!(zones.zone_for_point(Point::new(1200, 101)).map(|z| z.name.as_str()), Some("BRILHO"));
    }

    #[test]
    fn legal_names_follow_the_screen() {
        let mut zones = manager();
        assert!(zones.is_recognition_valid_for_zone("ILoveYou", "GESTOS", RecognitionKind::Gesture));
        assert!(!zones.is_recognition_valid_for_zone("Open_Palm", "GESTOS", RecognitionKind::Gesture));
        assert!(!zones.is_recognition_valid_for_zone("ILoveYou", "GESTOS", RecognitionKind::Object));
        assert!(zones.is_recognition_valid_for_zone("cup", "BRILHO", RecognitionKind::Object));
        assert!(!zones.is_recognition_valid_for_zone("cup", "SOM", RecognitionKind::Object));

        zones.set_screen(Screen::Phase);
        assert!(zones.is_recognition_valid_for_zone("Open_Palm", "GESTOS", RecognitionKind::Gesture));
        assert!(zones.is_recognition_valid_for_zone("orange", "GATE1", RecognitionKind::Object));
        assert!(!zones.is_recognition_valid_for_zone("cup", "GATE1", RecognitionKind::Object));
        assert_eq!(zones.zone_for_point(Point::new(1000, 500)).map(|z| z.name.as_str()), Some("GATE1"));
    }

    #[test]
    fn circuit_zones_only_on_phase_screen() {
        let mut zones = manager();
        assert!(zones.zone_by_name("GATE1").is_none());
        zones.set_screen(Screen::Phase);
        assert!(zones.zone_by_name("GATE1").is_some());
        assert!(!zones.is_recognition_valid_for_zone("x", "NOWHERE", RecognitionKind::Object));
    }

    #[test]
    fn reinstalling_a_phase_replaces_its_zones() {
        let mut zones = manager();
        zones.set_phase_zones(&fase1(), CortexConfig::default().object_mapping.keys());
        zones.set_screen(Screen::Phase);
        assert_eq!(zones.current_zones().len(), 8);
    }
}
