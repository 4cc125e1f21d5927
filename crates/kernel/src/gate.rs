//! Gate model - AND / OR / NOT over 0/1 signals
//!
//! Gates are stateless. Invalid input (wrong arity, or any input that is not
//! exactly 0 or 1) yields `None`, never a panic; callers treat `None` as
//! "evaluation failed for this zone".

use crate::types::{is_signal, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three gate types a player can place on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    And,
    Or,
    Not,
}

impl GateKind {
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Not => "NOT",
        }
    }

    /// Evaluate the gate over `inputs`.
    ///
    /// - AND: at least one input; 1 iff every input is 1
    /// - OR: at least one input; 1 iff any input is 1
    /// - NOT: exactly one input; the complement
    pub fn evaluate(&self, inputs: &[Option<Signal>]) -> Option<Signal> {
        let values = valid_inputs(inputs)?;
        match self {
            GateKind::And => Some(values.iter().all(|&v| v == 1) as Signal),
            GateKind::Or => Some(values.iter().any(|&v| v == 1) as Signal),
            GateKind::Not => match values.as_slice() {
                [v] => Some(1 - v),
                _ => None,
            },
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unwraps the inputs if there is at least one and all are valid signals.
fn valid_inputs(inputs: &[Option<Signal>]) -> Option<Vec<Signal>> {
    if inputs.is_empty() {
        return None;
    }
    inputs
        .iter()
        .map(|&v| v.filter(|&s| is_signal(s)))
        .collect()
}
