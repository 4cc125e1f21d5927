/// Circuit Farm Kernel Library
///
/// The pure side of the game: a boolean gate model, the zone-based circuit
/// evaluator, level configuration and the phase validator. Everything here is
/// synchronous and deterministic; clocks, threads and detections live in the
/// cortex crate.

pub mod types;
pub mod gate;
pub mod element;
pub mod phase;
pub mod levels;
pub mod evaluator;
pub mod validator;

pub use element::GameElement;
pub use evaluator::{CircuitEvaluation, CircuitEvaluator, ZoneError, ZoneErrorClass};
pub use gate::GateKind;
pub use levels::{default_object_mapping, PhaseCatalog};
pub use phase::{PhaseConfig, PhaseConfigError, ZoneSpec};
pub use types::{ObjectMapping, Point, Rect, Signal, ZoneObjects, ZoneValues};
pub use validator::{PhaseOutcome, PhaseValidator, PhaseVerdict};
