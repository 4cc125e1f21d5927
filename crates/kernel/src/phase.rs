//! Phase (level) configuration
//!
//! A phase is the authored description of one circuit: its zones, the input
//! context, the output zone, the expected value and the evaluation order.
//! The evaluation order is authored data. [`PhaseConfig::validate`] checks it
//! against every zone's declared inputs so a misordered or cyclic level is
//! rejected at load time instead of producing `None` chains at runtime.

use crate::element::GameElement;
use crate::types::{is_signal, Point, Rect, Signal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Offset of the default marker position from a zone's top-left corner
const MARKER_OFFSET: i32 = 20;

/// Configuration-time problems with a level. These indicate an authoring
/// bug, never a player action.
#[derive(Debug, Error)]
pub enum PhaseConfigError {
    #[error("failed to read phase file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse phase config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("zone '{0}' is declared more than once")]
    DuplicateZone(String),

    #[error("output zone '{0}' is not a configured zone")]
    UnknownOutputZone(String),

    #[error("evaluation order references unknown zone '{0}'")]
    UnknownOrderedZone(String),

    #[error("evaluation order lists zone '{0}' more than once")]
    DuplicateOrderedZone(String),

    #[error("zone '{0}' is missing from the evaluation order")]
    UnorderedZone(String),

    #[error("zone '{zone}' reads from unknown zone '{input}'")]
    UnknownInputZone { zone: String, input: String },

    #[error("zone '{zone}' is evaluated before its input '{input}'")]
    Misordered { zone: String, input: String },

    #[error("zone dependencies form a cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("zone '{zone}' has inverted corners {rect:?}")]
    InvertedRect { zone: String, rect: Rect },

    #[error("zone '{0}' accepts gates but declares no inputs")]
    GateWithoutInputs(String),

    #[error("zone '{zone}' allows unknown element '{element}'")]
    UnknownElement { zone: String, element: String },

    #[error("input '{name}' has value {value}, expected 0 or 1")]
    InvalidInputValue { name: String, value: Signal },

    #[error("expected value {0} is not 0 or 1")]
    InvalidExpectedValue(Signal),
}

/// One zone of a level's breadboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub rect: Rect,
    /// Element names permitted in this zone
    #[serde(default)]
    pub allowed_elements: Vec<String>,
    /// Upstream zones feeding this zone, in gate input order. Empty for sources.
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub marker_position: Option<Point>,
    #[serde(default)]
    pub result_position: Option<Point>,
}

impl ZoneSpec {
    pub fn allows(&self, element: &str) -> bool {
        self.allowed_elements.iter().any(|e| e == element)
    }

    /// Whether a gate may legally be placed here.
    pub fn accepts_gates(&self) -> bool {
        self.allowed_elements
            .iter()
            .filter_map(|e| GameElement::parse(e))
            .any(|e| e.is_gate())
    }

    /// Where the computed value is drawn: the configured position or the
    /// center of the zone.
    pub fn result_position(&self) -> Point {
        self.result_position.unwrap_or_else(|| self.rect.center())
    }

    /// Where the detection marker is drawn: the configured position or just
    /// inside the top-left corner.
    pub fn marker_position(&self) -> Point {
        self.marker_position.unwrap_or(Point::new(
            self.rect.x1.saturating_add(MARKER_OFFSET),
            self.rect.y1.saturating_add(MARKER_OFFSET),
        ))
    }
}

/// An authored level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Named external inputs ("solar", "eolico") -> 0/1
    pub inputs: HashMap<String, Signal>,
    pub expected_value: Signal,
    pub output_zone: String,
    pub evaluation_order: Vec<String>,
    pub zones: Vec<ZoneSpec>,
}

impl PhaseConfig {
    /// Parse and validate a level from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, PhaseConfigError> {
        let config: PhaseConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a level file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PhaseConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PhaseConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded phase {} ({}) from {}", config.id, config.name, path.display());
        Ok(config)
    }

    pub fn zone(&self, name: &str) -> Option<&ZoneSpec> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|z| z.name.as_str())
    }

    /// Check every documented invariant of the level.
    pub fn validate(&self) -> Result<(), PhaseConfigError> {
        let mut names = HashSet::new();
        for zone in &self.zones {
            if !names.insert(zone.name.as_str()) {
                return Err(PhaseConfigError::DuplicateZone(zone.name.clone()));
            }
        }

        for (name, &value) in &self.inputs {
            if !is_signal(value) {
                return Err(PhaseConfigError::InvalidInputValue {
                    name: name.clone(),
                    value,
                });
            }
        }
        if !is_signal(self.expected_value) {
            return Err(PhaseConfigError::InvalidExpectedValue(self.expected_value));
        }

        if !names.contains(self.output_zone.as_str()) {
            return Err(PhaseConfigError::UnknownOutputZone(self.output_zone.clone()));
        }

        for zone in &self.zones {
            if !zone.rect.is_ordered() {
                return Err(PhaseConfigError::InvertedRect {
                    zone: zone.name.clone(),
                    rect: zone.rect,
                });
            }
            if let Some(element) = zone
                .allowed_elements
                .iter()
                .find(|e| GameElement::parse(e).is_none())
            {
                return Err(PhaseConfigError::UnknownElement {
                    zone: zone.name.clone(),
                    element: element.clone(),
                });
            }
            if zone.accepts_gates() && zone.inputs.is_empty() {
                return Err(PhaseConfigError::GateWithoutInputs(zone.name.clone()));
            }
            if let Some(input) = zone.inputs.iter().find(|i| !names.contains(i.as_str())) {
                return Err(PhaseConfigError::UnknownInputZone {
                    zone: zone.name.clone(),
                    input: input.clone(),
                });
            }
        }

        // Cycles are reported as such before the order check, which would
        // otherwise flag them as a plain misorder.
        if let Some(cycle) = self.find_cycle() {
            return Err(PhaseConfigError::Cycle(cycle));
        }

        let mut position = HashMap::new();
        for (i, name) in self.evaluation_order.iter().enumerate() {
            if !names.contains(name.as_str()) {
                return Err(PhaseConfigError::UnknownOrderedZone(name.clone()));
            }
            if position.insert(name.as_str(), i).is_some() {
                return Err(PhaseConfigError::DuplicateOrderedZone(name.clone()));
            }
        }
        if let Some(zone) = self
            .zones
            .iter()
            .find(|z| !position.contains_key(z.name.as_str()))
        {
            return Err(PhaseConfigError::UnorderedZone(zone.name.clone()));
        }
        for zone in &self.zones {
            let at = position[zone.name.as_str()];
            for input in &zone.inputs {
                if position[input.as_str()] >= at {
                    return Err(PhaseConfigError::Misordered {
                        zone: zone.name.clone(),
                        input: input.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Depth-first search over the `inputs` edges. Returns the zones on the
    /// first cycle found, closing zone repeated at the end.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            config: &'a PhaseConfig,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            match marks.get(name) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|&n| n == name).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(name.to_string());
                    return Some(cycle);
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            stack.push(name);
            if let Some(zone) = config.zone(name) {
                for input in &zone.inputs {
                    if let Some(cycle) = visit(config, input, marks, stack) {
                        return Some(cycle);
                    }
                }
            }
            stack.pop();
            marks.insert(name, Mark::Done);
            None
        }

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        self.zones
            .iter()
            .find_map(|z| visit(self, &z.name, &mut marks, &mut stack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels;

    fn zone(name: &str, allowed: &[&str], inputs: &[&str]) -> ZoneSpec {
        ZoneSpec {
            name: name.to_string(),
            rect: Rect::new(0, 0, 100, 100),
            allowed_elements: allowed.iter().map(|s| s.to_string()).collect(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            marker_position: None,
            result_position: None,
        }
    }

    #[test]
    fn fase1_is_valid() {
        levels::fase1().validate().unwrap();
    }

    #[test]
    fn misordered_dependency_is_rejected() {
        let mut config = levels::fase1();
        config.evaluation_order = vec!["INPUT1", "GATE1", "INPUT2", "GATE2"]
            .into_iter()
            .map(String::from)
            .collect();
        match config.validate() {
            Err(PhaseConfigError::Misordered { zone, input }) => {
                assert_eq!(zone, "GATE1");
                assert_eq!(input, "INPUT2");
            }
            other => panic!("expected misorder, got {other:?}"),
        }
    }

    #[test]
    fn cycle_is_rejected() {
        let mut config = levels::fase1();
        config.zones[2].inputs = vec!["INPUT1".into(), "GATE2".into()];
        match config.validate() {
            Err(PhaseConfigError::Cycle(cycle)) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.contains(&"GATE1".to_string()));
                assert!(cycle.contains(&"GATE2".to_string()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn zone_missing_from_order_is_rejected() {
        let mut config = levels::fase1();
        config.evaluation_order.retain(|z| z != "INPUT2");
        assert!(matches!(
            config.validate(),
            Err(PhaseConfigError::UnorderedZone(z)) if z == "INPUT2"
        ));
    }

    #[test]
    fn gate_zone_without_inputs_is_rejected() {
        let mut config = levels::fase1();
        config.zones.push(zone("GATE3", &["or_gate"], &[]));
        config.evaluation_order.push("GATE3".into());
        assert!(matches!(
            config.validate(),
            Err(PhaseConfigError::GateWithoutInputs(z)) if z == "GATE3"
        ));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut config = levels::fase1();
        config.output_zone = "GATE9".into();
        assert!(matches!(config.validate(), Err(PhaseConfigError::UnknownOutputZone(_))));

        let mut config = levels::fase1();
        config.zones[3].inputs = vec!["NOWHERE".into()];
        assert!(matches!(config.validate(), Err(PhaseConfigError::UnknownInputZone { .. })));

        let mut config = levels::fase1();
        config.zones[0].allowed_elements.push("xor_gate".into());
        assert!(matches!(config.validate(), Err(PhaseConfigError::UnknownElement { .. })));
    }

    #[test]
    fn inverted_zone_rect_is_rejected() {
        let mut config = levels::fase1();
        config.zones[2].rect = Rect::new(1150, 350, 850, 650);
        assert!(matches!(
            config.validate(),
            Err(PhaseConfigError::InvertedRect { zone, .. }) if zone == "GATE1"
        ));
    }

    #[test]
    fn non_binary_values_are_rejected() {
        let mut config = levels::fase1();
        config.inputs.insert("solar".into(), 2);
        assert!(matches!(config.validate(), Err(PhaseConfigError::InvalidInputValue { .. })));

        let mut config = levels::fase1();
        config.expected_value = -1;
        assert!(matches!(config.validate(), Err(PhaseConfigError::InvalidExpectedValue(-1))));
    }

    #[test]
    fn display_positions_fall_back_to_rect() {
        let z = zone("Z", &[], &[]);
        assert_eq!(z.result_position(), Point::new(50, 50));
        assert_eq!(z.marker_position(), Point::new(20, 20));

        let config = levels::fase1();
        let gate1 = config.zone("GATE1").unwrap();
        assert_eq!(gate1.result_position(), Point::new(1000, 500));
        assert_eq!(gate1.marker_position(), Point::new(870, 370));
    }

    #[test]
    fn parse_error_surfaces() {
        assert!(matches!(
            PhaseConfig::from_toml_str("id = \"one\""),
            Err(PhaseConfigError::Parse(_))
        ));
    }
}
