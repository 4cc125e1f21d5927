//! Phase validator
//!
//! Holds the active level and turns a circuit evaluation into a verdict the
//! player can read. The full zone table and error list are kept after every
//! pass, successful or not, so the display layer can always show the
//! player's work.

use crate::evaluator::{CircuitEvaluation, CircuitEvaluator, ZoneError, ZoneErrorClass};
use crate::phase::{PhaseConfig, PhaseConfigError};
use crate::types::{ObjectMapping, ZoneObjects, ZoneValues};
use serde::Serialize;

/// Why a validation pass ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    Success,
    NoPhase,
    Incomplete,
    UnrecognizedObject,
    NotPermitted,
    Wiring,
    NoOutput,
    Incorrect,
}

impl PhaseOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PhaseOutcome::Success => "You did it!",
            PhaseOutcome::NoPhase => "No phase configured",
            PhaseOutcome::Incomplete => "Not yet! The circuit is incomplete.",
            PhaseOutcome::UnrecognizedObject => "Not yet! An invalid object was detected.",
            PhaseOutcome::NotPermitted => "Not yet! An object is not permitted in its zone.",
            PhaseOutcome::Wiring => "Not yet! Check how the circuit is wired.",
            PhaseOutcome::NoOutput => "Not yet! The output could not be computed.",
            PhaseOutcome::Incorrect => "Not yet! The result is incorrect.",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PhaseOutcome::Success)
    }
}

/// Outcome of [`PhaseValidator::validate_phase`]
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseVerdict {
    pub success: bool,
    pub outcome: PhaseOutcome,
    pub message: String,
    pub zone_values: ZoneValues,
    pub errors: Vec<ZoneError>,
}

impl PhaseVerdict {
    fn new(outcome: PhaseOutcome, eval: CircuitEvaluation) -> Self {
        Self {
            success: outcome.is_success(),
            outcome,
            message: outcome.message().to_string(),
            zone_values: eval.zone_values,
            errors: eval.errors,
        }
    }
}

#[derive(Debug, Default)]
pub struct PhaseValidator {
    evaluator: CircuitEvaluator,
    phase: Option<PhaseConfig>,
    last: CircuitEvaluation,
    show_results: bool,
}

impl PhaseValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load or replace the active level. Broken levels are rejected and the
    /// previous level stays active.
    pub fn set_phase(&mut self, config: PhaseConfig) -> Result<(), PhaseConfigError> {
        config.validate()?;
        log::info!("Phase {} ({}) active", config.id, config.name);
        self.phase = Some(config);
        self.clear_validation();
        Ok(())
    }

    pub fn current_phase(&self) -> Option<&PhaseConfig> {
        self.phase.as_ref()
    }

    pub fn clear_validation(&mut self) {
        self.last = CircuitEvaluation::default();
        self.show_results = false;
    }

    /// Evaluate the placed objects against the active level.
    pub fn validate_phase(&mut self, detected: &ZoneObjects, mapping: &ObjectMapping) -> PhaseVerdict {
        self.clear_validation();
        let Some(phase) = &self.phase else {
            return PhaseVerdict::new(PhaseOutcome::NoPhase, CircuitEvaluation::default());
        };

        let eval = self.evaluator.evaluate_phase(phase, detected, mapping);
        let outcome = Self::classify(phase, detected, &eval);

        log::info!(
            "Phase {} validated: {:?} ({} zone errors)",
            phase.id,
            outcome,
            eval.errors.len()
        );

        self.last = eval.clone();
        self.show_results = true;
        PhaseVerdict::new(outcome, eval)
    }

    fn classify(phase: &PhaseConfig, detected: &ZoneObjects, eval: &CircuitEvaluation) -> PhaseOutcome {
        let complete = phase
            .zone_names()
            .all(|name| matches!(detected.get(name), Some(Some(_))));
        if !complete {
            return PhaseOutcome::Incomplete;
        }

        if eval.has_errors() {
            return if eval.has_error_class(ZoneErrorClass::Unrecognized) {
                PhaseOutcome::UnrecognizedObject
            } else if eval.has_error_class(ZoneErrorClass::NotPermitted) {
                PhaseOutcome::NotPermitted
            } else {
                PhaseOutcome::Wiring
            };
        }

        match CircuitEvaluator::final_output(eval, &phase.output_zone) {
            None => PhaseOutcome::NoOutput,
            Some(value) if value == phase.expected_value => PhaseOutcome::Success,
            Some(_) => PhaseOutcome::Incorrect,
        }
    }

    /// Zone values of the last pass
    pub fn results(&self) -> ZoneValues {
        self.last.zone_values.clone()
    }

    pub fn errors(&self) -> &[ZoneError] {
        &self.last.errors
    }

    pub fn invalid_zones(&self) -> &[String] {
        &self.last.invalid_zones
    }

    pub fn should_show_results(&self) -> bool {
        self.show_results
    }
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

    fn validator() -> PhaseValidator {
        let mut v = PhaseValidator::new();
        v.set_phase(fase1()).unwrap();
        v
    }

    #[test]
    fn no_phase_loaded() {
        let mut v = PhaseValidator::new();
        let verdict = v.validate_phase(&ZoneObjects::new(), &default_object_mapping());
        assert!(!verdict.success);
        assert_eq!(verdict.outcome, PhaseOutcome::NoPhase);
        assert!(verdict.zone_values.is_empty());
        assert!(!v.should_show_results());
    }

    #[test]
    fn correct_circuit_passes() {
        let mut v = validator();
        let verdict = v.validate_phase(
            &placed(&[
                ("INPUT1", "clock"),
                ("INPUT2", "remote"),
                ("GATE1", "orange"),
                ("GATE2", "scissors"),
            ]),
            &default_object_mapping(),
        );
        assert!(verdict.success, "{}", verdict.message);
        assert_eq!(verdict.outcome, PhaseOutcome::Success);
        assert_eq!(verdict.zone_values.get("GATE1"), Some(&Some(0)));
        assert_eq!(verdict.zone_values.get("GATE2"), Some(&Some(1)));
        assert!(v.should_show_results());
        assert_eq!(v.results(), verdict.zone_values);
    }

    #[test]
    fn incomplete_circuit_keeps_partial_values() {
        let mut v = validator();
        let mut detected = placed(&[("INPUT1", "clock"), ("GATE1", "orange"), ("GATE2", "scissors")]);
        detected.insert("INPUT2".into(), None);
        let verdict = v.validate_phase(&detected, &default_object_mapping());
        assert!(!verdict.success);
        assert_eq!(verdict.outcome, PhaseOutcome::Incomplete);
        assert!(verdict.message.contains("incomplete"));
        assert_eq!(verdict.zone_values.get("INPUT1"), Some(&Some(1)));
        assert_eq!(verdict.zone_values.get("GATE1"), Some(&None));
        assert_eq!(verdict.zone_values.get("GATE2"), Some(&None));
        assert!(v.should_show_results());
        assert!(!v.errors().is_empty());
    }

    #[test]
    fn wrong_gate_is_not_permitted() {
        let mut v = validator();
        let verdict = v.validate_phase(
            &placed(&[
                ("INPUT1", "clock"),
                ("INPUT2", "remote"),
                ("GATE1", "cell phone"),
                ("GATE2", "scissors"),
            ]),
            &default_object_mapping(),
        );
        assert!(!verdict.success);
        assert_eq!(verdict.outcome, PhaseOutcome::NotPermitted);
        assert_eq!(verdict.zone_values.get("GATE1"), Some(&Some(1)));
        assert_eq!(v.invalid_zones(), ["GATE1".to_string()]);
    }

    #[test]
    fn unrecognized_outranks_not_permitted() {
        let mut v = validator();
        let verdict = v.validate_phase(
            &placed(&[
                ("INPUT1", "banana"),
                ("INPUT2", "remote"),
                ("GATE1", "cell phone"),
                ("GATE2", "scissors"),
            ]),
            &default_object_mapping(),
        );
        assert_eq!(verdict.outcome, PhaseOutcome::UnrecognizedObject);
    }

    #[test]
    fn incorrect_result() {
        // Both sources see the wind: AND(1,1) = 1, NOT -> 0
        let mut v = validator();
        let verdict = v.validate_phase(
            &placed(&[
                ("INPUT1", "clock"),
                ("INPUT2", "clock"),
                ("GATE1", "orange"),
                ("GATE2", "scissors"),
            ]),
            &default_object_mapping(),
        );
        assert_eq!(verdict.outcome, PhaseOutcome::Incorrect);
        assert_eq!(verdict.zone_values.get("GATE2"), Some(&Some(0)));
    }

    #[test]
    fn fixing_the_board_replaces_stale_errors() {
        let mut v = validator();
        let mut board = placed(&[
            ("INPUT1", "clock"),
            ("INPUT2", "remote"),
            ("GATE1", "banana"),
            ("GATE2", "scissors"),
        ]);
        let failed = v.validate_phase(&board, &default_object_mapping());
        assert_eq!(failed.outcome, PhaseOutcome::UnrecognizedObject);
        assert!(!v.errors().is_empty());

        board.insert("GATE1".into(), Some("orange".into()));
        let fixed = v.validate_phase(&board, &default_object_mapping());
        assert!(fixed.success);
        assert!(v.errors().is_empty());
        assert!(v.invalid_zones().is_empty());
        assert!(v.should_show_results());
    }

    #[test]
    fn revalidation_and_phase_reload() {
        let mut v = validator();
        let detected = placed(&[("INPUT1", "clock")]);
        let first = v.validate_phase(&detected, &default_object_mapping());
        let second = v.validate_phase(&detected, &default_object_mapping());
        assert_eq!(first, second);

        v.set_phase(fase1()).unwrap();
        assert!(!v.should_show_results());
        assert!(v.results().is_empty());

        let mut broken = fase1();
        broken.evaluation_order.reverse();
        assert!(v.set_phase(broken).is_err());
        assert_eq!(v.current_phase(), Some(&fase1()));
    }
}
