//! Circuit evaluator
//!
//! Walks the zones of a breadboard in authored evaluation order and computes
//! one value per zone: sources read the phase input context, gates read the
//! values already computed for their upstream zones.
//!
//! Nothing here fails hard. Every problem becomes a [`ZoneError`] in the
//! returned list (at most one per zone) and the zone's value degrades to
//! `None`, so a half-built circuit still shows partial results.

use crate::element::GameElement;
use crate::phase::{PhaseConfig, ZoneSpec};
use crate::types::{ObjectMapping, Signal, ZoneObjects, ZoneValues};
use std::collections::HashMap;
use thiserror::Error;

/// Coarse category of a zone error, used to pick the user-facing failure
/// summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneErrorClass {
    /// Nothing placed in the zone
    EmptyZone,
    /// A physical object the game has no element for
    Unrecognized,
    /// A known element placed where it is not allowed
    NotPermitted,
    /// Gate inputs missing or invalid
    Wiring,
    /// Broken level data
    Configuration,
}

/// A single per-zone evaluation problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("zone {zone}: no configuration for this zone")]
    UnknownZone { zone: String },

    #[error("zone {zone}: zone is empty")]
    EmptyZone { zone: String },

    #[error("zone {zone}: object '{label}' is not recognized by the game")]
    UnrecognizedObject { zone: String, label: String },

    #[error("zone {zone}: {element} is not permitted in this zone")]
    NotPermitted { zone: String, element: GameElement },

    #[error("zone {zone}: input '{key}' has no value")]
    MissingInput { zone: String, key: String },

    #[error("zone {zone}: gate has no declared inputs")]
    NoDeclaredInputs { zone: String },

    #[error("zone {zone}: input zone {input} has not been evaluated")]
    UpstreamNotEvaluated { zone: String, input: String },

    #[error("zone {zone}: input zone {input} has no valid value")]
    UpstreamInvalid { zone: String, input: String },

    #[error("zone {zone}: {gate} gate could not be evaluated")]
    GateFailed {
        zone: String,
        gate: crate::gate::GateKind,
    },

    #[error("zone {zone}: '{element}' is neither a source nor a gate")]
    UnknownElement { zone: String, element: String },
}

impl ZoneError {
    pub fn zone(&self) -> &str {
        match self {
            ZoneError::UnknownZone { zone }
            | ZoneError::EmptyZone { zone }
            | ZoneError::UnrecognizedObject { zone, .. }
            | ZoneError::NotPermitted { zone, .. }
            | ZoneError::MissingInput { zone, .. }
            | ZoneError::NoDeclaredInputs { zone }
            | ZoneError::UpstreamNotEvaluated { zone, .. }
            | ZoneError::UpstreamInvalid { zone, .. }
            | ZoneError::GateFailed { zone, .. }
            | ZoneError::UnknownElement { zone, .. } => zone,
        }
    }

    pub fn class(&self) -> ZoneErrorClass {
        match self {
            ZoneError::EmptyZone { .. } => ZoneErrorClass::EmptyZone,
            ZoneError::UnrecognizedObject { .. } => ZoneErrorClass::Unrecognized,
            ZoneError::NotPermitted { .. } => ZoneErrorClass::NotPermitted,
            ZoneError::UpstreamInvalid { .. } | ZoneError::GateFailed { .. } => {
                ZoneErrorClass::Wiring
            }
            ZoneError::UnknownZone { .. }
            | ZoneError::MissingInput { .. }
            | ZoneError::NoDeclaredInputs { .. }
            | ZoneError::UpstreamNotEvaluated { .. }
            | ZoneError::UnknownElement { .. } => ZoneErrorClass::Configuration,
        }
    }
}

/// Result of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircuitEvaluation {
    /// One entry per visited zone, `None` where nothing could be computed
    pub zone_values: ZoneValues,
    /// Problems in evaluation order, at most one per zone
    pub errors: Vec<ZoneError>,
    /// Zones holding an element they do not allow. Their value is still
    /// computed.
    pub invalid_zones: Vec<String>,
}

impl CircuitEvaluation {
    pub fn value(&self, zone: &str) -> Option<Signal> {
        self.zone_values.get(zone).copied().flatten()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_error_class(&self, class: ZoneErrorClass) -> bool {
        self.errors.iter().any(|e| e.class() == class)
    }
}

/// Stateless zone-by-zone circuit solver
#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitEvaluator;

impl CircuitEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every zone listed in `order`.
    pub fn evaluate(
        &self,
        zones: &[ZoneSpec],
        detected: &ZoneObjects,
        inputs: &HashMap<String, Signal>,
        mapping: &ObjectMapping,
        order: &[String],
    ) -> CircuitEvaluation {
        let by_name: HashMap<&str, &ZoneSpec> =
            zones.iter().map(|z| (z.name.as_str(), z)).collect();
        let mut eval = CircuitEvaluation::default();

        for name in order {
            let (value, error) = match by_name.get(name.as_str()) {
                Some(zone) => self.evaluate_zone(zone, detected, inputs, mapping, &mut eval),
                None => (
                    None,
                    Some(ZoneError::UnknownZone { zone: name.clone() }),
                ),
            };
            if let Some(error) = error {
                log::debug!("{}", error);
                eval.errors.push(error);
            }
            eval.zone_values.insert(name.clone(), value);
        }

        eval
    }

    /// Evaluate a level's circuit with its own zones, inputs and order.
    pub fn evaluate_phase(
        &self,
        phase: &PhaseConfig,
        detected: &ZoneObjects,
        mapping: &ObjectMapping,
    ) -> CircuitEvaluation {
        self.evaluate(
            &phase.zones,
            detected,
            &phase.inputs,
            mapping,
            &phase.evaluation_order,
        )
    }

    /// Value of the output zone in a finished evaluation.
    pub fn final_output(eval: &CircuitEvaluation, output_zone: &str) -> Option<Signal> {
        eval.value(output_zone)
    }

    fn evaluate_zone(
        &self,
        zone: &ZoneSpec,
        detected: &ZoneObjects,
        inputs: &HashMap<String, Signal>,
        mapping: &ObjectMapping,
        eval: &mut CircuitEvaluation,
    ) -> (Option<Signal>, Option<ZoneError>) {
        let zone_name = zone.name.clone();

        let label = match detected.get(&zone.name) {
            Some(Some(label)) => label,
            _ => return (None, Some(ZoneError::EmptyZone { zone: zone_name })),
        };

        let element_name = match mapping.get(label) {
            Some(element) => element,
            None => {
                return (
                    None,
                    Some(ZoneError::UnrecognizedObject {
                        zone: zone_name,
                        label: label.clone(),
                    }),
                )
            }
        };

        let element = match GameElement::parse(element_name) {
            Some(element) => element,
            None => {
                return (
                    None,
                    Some(ZoneError::UnknownElement {
                        zone: zone_name,
                        element: element_name.clone(),
                    }),
                )
            }
        };

        // A misplaced element is still computed so the player sees what it
        // would produce; the placement error takes the zone's error slot.
        let placement = if zone.allows(element.as_str()) {
            None
        } else {
            eval.invalid_zones.push(zone.name.clone());
            Some(ZoneError::NotPermitted {
                zone: zone_name.clone(),
                element,
            })
        };

        let computed = if let Some(key) = element.input_key() {
            inputs
                .get(key)
                .copied()
                .ok_or_else(|| ZoneError::MissingInput {
                    zone: zone_name.clone(),
                    key: key.to_string(),
                })
        } else if let Some(gate) = element.gate_kind() {
            upstream_values(zone, &eval.zone_values).and_then(|values| {
                gate.evaluate(&values).ok_or(ZoneError::GateFailed {
                    zone: zone_name.clone(),
                    gate,
                })
            })
        } else {
            Err(ZoneError::UnknownElement {
                zone: zone_name,
                element: element.to_string(),
            })
        };

        match (computed, placement) {
            (Ok(value), placement) => (Some(value), placement),
            (Err(_), Some(placement)) => (None, Some(placement)),
            (Err(error), None) => (None, Some(error)),
        }
    }
}

/// Upstream values in declared input order.
fn upstream_values(zone: &ZoneSpec, values: &ZoneValues) -> Result<Vec<Option<Signal>>, ZoneError> {
    if zone.inputs.is_empty() {
        return Err(ZoneError::NoDeclaredInputs {
            zone: zone.name.clone(),
        });
    }
    zone.inputs
        .iter()
        .map(|input| match values.get(input) {
            None => Err(ZoneError::UpstreamNotEvaluated {
                zone: zone.name.clone(),
                input: input.clone(),
            }),
            Some(None) => Err(ZoneError::UpstreamInvalid {
                zone: zone.name.clone(),
                input: input.clone(),
            }),
            Some(value) => Ok(*value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{default_object_mapping, fase1};

    fn placed(pairs: &[(&str, &str)]) -> ZoneObjects {
        pairs
            .iter()
            .map(|(zone, label)| (zone.to_string(), Some(label.to_string())))
            .collect()
    }

    fn run(detected: &ZoneObjects) -> CircuitEvaluation {
        CircuitEvaluator::new().evaluate_phase(&fase1(), detected, &default_object_mapping())
    }

    #[test]
    fn fase1_solution() {
        // clock = wind (1), remote = solar (0), orange = AND, scissors = NOT
        let eval = run(&placed(&[
            ("INPUT1", "clock"),
            ("INPUT2", "remote"),
            ("GATE1", "orange"),
            ("GATE2", "scissors"),
        ]));
        assert!(eval.errors.is_empty(), "{:?}", eval.errors);
        assert_eq!(eval.value("INPUT1"), Some(1));
        assert_eq!(eval.value("INPUT2"), Some(0));
        assert_eq!(eval.value("GATE1"), Some(0));
        assert_eq!(eval.value("GATE2"), Some(1));
        assert_eq!(CircuitEvaluator::final_output(&eval, "GATE2"), Some(1));
    }

    #[test]
    fn inputs_may_be_swapped() {
        let eval = run(&placed(&[
            ("INPUT1", "remote"),
            ("INPUT2", "clock"),
            ("GATE1", "orange"),
            ("GATE2", "scissors"),
        ]));
        assert!(eval.errors.is_empty());
        assert_eq!(eval.value("GATE1"), Some(0));
        assert_eq!(eval.value("GATE2"), Some(1));
    }

    #[test]
    fn empty_input_propagates_none() {
        let eval = run(&placed(&[
            ("INPUT1", "clock"),
            ("GATE1", "orange"),
            ("GATE2", "scissors"),
        ]));
        assert_eq!(eval.value("INPUT1"), Some(1));
        assert_eq!(eval.zone_values.get("INPUT2"), Some(&None));
        assert_eq!(eval.zone_values.get("GATE1"), Some(&None));
        assert_eq!(eval.zone_values.get("GATE2"), Some(&None));

        let zones: Vec<&str> = eval.errors.iter().map(|e| e.zone()).collect();
        assert_eq!(zones, vec!["INPUT2", "GATE1", "GATE2"]);
        assert_eq!(eval.errors[0].class(), ZoneErrorClass::EmptyZone);
        assert_eq!(eval.errors[1].class(), ZoneErrorClass::Wiring);
    }

    #[test]
    fn misplaced_gate_is_computed_and_flagged() {
        // "cell phone" is an OR gate where AND is required
        let eval = run(&placed(&[
            ("INPUT1", "clock"),
            ("INPUT2", "remote"),
            ("GATE1", "cell phone"),
            ("GATE2", "scissors"),
        ]));
        assert_eq!(eval.value("GATE1"), Some(1));
        assert_eq!(eval.value("GATE2"), Some(0));
        assert_eq!(eval.invalid_zones, vec!["GATE1".to_string()]);
        assert_eq!(eval.errors.len(), 1);
        assert!(matches!(
            &eval.errors[0],
            ZoneError::NotPermitted { zone, element: GameElement::OrGate } if zone == "GATE1"
        ));
    }

    #[test]
    fn unrecognized_object() {
        let eval = run(&placed(&[("INPUT1", "banana")]));
        assert_eq!(eval.zone_values.get("INPUT1"), Some(&None));
        assert_eq!(eval.errors[0].class(), ZoneErrorClass::Unrecognized);
        assert!(eval.errors[0].to_string().contains("not recognized"));
    }

    #[test]
    fn one_error_per_zone() {
        // A source in a gate zone: not permitted, and not computable either
        // way, but only the placement error is reported.
        let eval = run(&placed(&[("GATE1", "remote")]));
        let gate1: Vec<_> = eval.errors.iter().filter(|e| e.zone() == "GATE1").collect();
        assert_eq!(gate1.len(), 1);
        assert_eq!(gate1[0].class(), ZoneErrorClass::NotPermitted);
        assert_eq!(eval.value("GATE1"), Some(0));

        let eval = run(&placed(&[("GATE2", "orange")]));
        let gate2: Vec<_> = eval.errors.iter().filter(|e| e.zone() == "GATE2").collect();
        assert_eq!(gate2.len(), 1);
        assert_eq!(gate2[0].class(), ZoneErrorClass::NotPermitted);
        assert_eq!(eval.zone_values.get("GATE2"), Some(&None));
    }

    #[test]
    fn unknown_zone_in_order() {
        let config = fase1();
        let order = vec!["INPUT1".to_string(), "GHOST".to_string()];
        let eval = CircuitEvaluator::new().evaluate(
            &config.zones,
            &placed(&[("INPUT1", "clock")]),
            &config.inputs,
            &default_object_mapping(),
            &order,
        );
        assert_eq!(eval.zone_values.get("GHOST"), Some(&None));
        assert!(matches!(&eval.errors[0], ZoneError::UnknownZone { zone } if zone == "GHOST"));
    }

    #[test]
    fn misordered_gate_reports_unevaluated_upstream() {
        let config = fase1();
        let order: Vec<String> = ["GATE1", "INPUT1", "INPUT2"].iter().map(|s| s.to_string()).collect();
        let eval = CircuitEvaluator::new().evaluate(
            &config.zones,
            &placed(&[("INPUT1", "clock"), ("INPUT2", "remote"), ("GATE1", "orange")]),
            &config.inputs,
            &default_object_mapping(),
            &order,
        );
        assert!(matches!(&eval.errors[0], ZoneError::UpstreamNotEvaluated { .. }));
        assert_eq!(eval.zone_values.get("GATE1"), Some(&None));
    }

    #[test]
    fn missing_input_context() {
        let mut config = fase1();
        config.inputs.remove("eolico");
        let eval = CircuitEvaluator::new().evaluate_phase(
            &config,
            &placed(&[("INPUT1", "clock")]),
            &default_object_mapping(),
        );
        assert!(matches!(&eval.errors[0], ZoneError::MissingInput { key, .. } if key == "eolico"));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let detected = placed(&[
            ("INPUT1", "clock"),
            ("GATE1", "cell phone"),
            ("GATE2", "banana"),
        ]);
        assert_eq!(run(&detected), run(&detected));
    }
}
