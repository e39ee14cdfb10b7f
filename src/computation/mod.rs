//! Executes parameter formulas in dependency order.
pub mod builtins;
pub mod context;
pub mod engine;
pub mod evaluator;

pub use context::{CalculationError, EvalError, EvaluationContext};
pub use engine::{run, Calculator};
pub use evaluator::Evaluator;
