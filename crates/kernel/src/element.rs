//! Game elements - the logical role a physical object plays on the board
//!
//! The vision side only knows labels like "orange" or "clock". A level's
//! object mapping turns those into elements; the evaluator only reasons about
//! elements.

use crate::gate::GateKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Context key holding the solar input value
pub const SOLAR_KEY: &str = "solar";
/// Context key holding the wind input value
pub const WIND_KEY: &str = "eolico";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameElement {
    SolarInput,
    WindInput,
    AndGate,
    OrGate,
    NotGate,
}

impl GameElement {
    pub const ALL: [GameElement; 5] = [
        GameElement::SolarInput,
        GameElement::WindInput,
        GameElement::AndGate,
        GameElement::OrGate,
        GameElement::NotGate,
    ];

    /// Parse an element name as used in level files and object mappings.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameElement::SolarInput => "solar_input",
            GameElement::WindInput => "wind_input",
            GameElement::AndGate => "and_gate",
            GameElement::OrGate => "or_gate",
            GameElement::NotGate => "not_gate",
        }
    }

    /// Input context key for energy sources, `None` for gates.
    pub fn input_key(&self) -> Option<&'static str> {
        match self {
            GameElement::SolarInput => Some(SOLAR_KEY),
            GameElement::WindInput => Some(WIND_KEY),
            _ => None,
        }
    }

    /// Gate type for gate elements, `None` for sources.
    pub fn gate_kind(&self) -> Option<GateKind> {
        match self {
            GameElement::AndGate => Some(GateKind::And),
            GameElement::OrGate => Some(GateKind::Or),
            GameElement::NotGate => Some(GateKind::Not),
            _ => None,
        }
    }

    pub fn is_source(&self) -> bool {
        self.input_key().is_some()
    }

    pub fn is_gate(&self) -> bool {
        self.gate_kind().is_some()
    }
}

impl fmt::Display for GameElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
