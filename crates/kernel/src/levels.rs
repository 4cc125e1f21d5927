//! Built-in levels and the default object -> element mapping

use crate::element::{SOLAR_KEY, WIND_KEY};
use crate::phase::{PhaseConfig, PhaseConfigError, ZoneSpec};
use crate::types::{ObjectMapping, Point, Rect};
use std::collections::BTreeMap;

/// Physical objects standing in for each element. Swapping a prop only
/// means editing this table.
pub fn default_object_mapping() -> ObjectMapping {
    [
        ("remote", "solar_input"),
        ("clock", "wind_input"),
        ("orange", "and_gate"),
        ("cell phone", "or_gate"),
        ("scissors", "not_gate"),
    ]
    .into_iter()
    .map(|(object, element)| (object.to_string(), element.to_string()))
    .collect()
}

fn zone(name: &str, rect: Rect, allowed: &[&str], inputs: &[&str], marker: Point, result: Point) -> ZoneSpec {
    ZoneSpec {
        name: name.to_string(),
        rect,
        allowed_elements: allowed.iter().map(|s| s.to_string()).collect(),
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        marker_position: Some(marker),
        result_position: Some(result),
    }
}

/// Fase 1 - "windy night": no sun, wind blowing. The two sources feed an AND
/// whose output is inverted by a NOT; the farm needs a 1 at the end.
pub fn fase1() -> PhaseConfig {
    const SOURCES: &[&str] = &["solar_input", "wind_input"];

    PhaseConfig {
        id: 1,
        name: "Fase 1".to_string(),
        description: "Noite com vento".to_string(),
        inputs: [(SOLAR_KEY.to_string(), 0), (WIND_KEY.to_string(), 1)]
            .into_iter()
            .collect(),
        expected_value: 1,
        output_zone: "GATE2".to_string(),
        evaluation_order: ["INPUT1", "INPUT2", "GATE1", "GATE2"]
            .into_iter()
            .map(String::from)
            .collect(),
        zones: vec![
            zone(
                "INPUT1",
                Rect::new(450, 50, 750, 350),
                SOURCES,
                &[],
                Point::new(470, 70),
                Point::new(600, 200),
            ),
            zone(
                "INPUT2",
                Rect::new(450, 650, 750, 950),
                SOURCES,
                &[],
                Point::new(470, 670),
                Point::new(600, 800),
            ),
            zone(
                "GATE1",
                Rect::new(850, 350, 1150, 650),
                &["and_gate"],
                &["INPUT1", "INPUT2"],
                Point::new(870, 370),
                Point::new(1000, 500),
            ),
            zone(
                "GATE2",
                Rect::new(1250, 350, 1550, 650),
                &["not_gate"],
                &["GATE1"],
                Point::new(1270, 370),
                Point::new(1400, 500),
            ),
        ],
    }
}

/// Levels by id
#[derive(Debug, Clone, Default)]
pub struct PhaseCatalog {
    phases: BTreeMap<u32, PhaseConfig>,
}

impl PhaseCatalog {
    /// Catalog holding every built-in level.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        let fase1 = fase1();
        catalog.phases.insert(fase1.id, fase1);
        catalog
    }

    /// Add or replace a level after validating it.
    pub fn insert(&mut self, config: PhaseConfig) -> Result<(), PhaseConfigError> {
        config.validate()?;
        if let Some(old) = self.phases.insert(config.id, config) {
            log::info!("Replaced phase {} ({})", old.id, old.name);
        }
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&PhaseConfig> {
        self.phases.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &PhaseConfig> {
        self.phases.values()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_level_file_matches_builtin() {
        let from_file = PhaseConfig::from_toml_str(include_str!("../levels/fase1.toml")).unwrap();
        assert_eq!(from_file, fase1());
    }

    #[test]
    fn mapping_targets_known_elements() {
        for element in default_object_mapping().values() {
            assert!(crate::element::GameElement::parse(element).is_some(), "{element}");
        }
    }

    #[test]
    fn catalog_lookup() {
        let mut catalog = PhaseCatalog::builtin();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(1).map(|p| p.name.as_str()), Some("Fase 1"));
        assert!(catalog.get(2).is_none());

        let mut broken = fase1();
        broken.id = 2;
        broken.output_zone = "MISSING".into();
        assert!(catalog.insert(broken).is_err());
        assert_eq!(catalog.len(), 1);
    }
}
