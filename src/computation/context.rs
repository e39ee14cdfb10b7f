//! context.rs
//! Per-run value storage, keyed by parameter name.

use std::collections::HashMap;

pub use self::error::{CalculationError, EvalError};
mod error {
    use crate::graph::GraphError;
    use crate::type_system::ValidationError;
    use thiserror::Error;

    /// Failures raised while evaluating a single parameter.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum EvalError {
        #[error("Missing input for USER parameter '{name}'")]
        MissingInput { name: String },
        #[error("Variable '{name}' has not been resolved")]
        UnresolvedVariable { name: String },
        #[error("Unknown function '{name}'")]
        UnknownFunction { name: String },
        #[error("Function '{function}' expects {expected} argument(s), got {found}")]
        Arity { function: String, expected: &'static str, found: usize },
        #[error("Invalid argument to '{function}': {message}")]
        InvalidArgument { function: String, message: String },
        #[error("String literal '{text}' cannot be used as a number")]
        UnexpectedText { text: String },
        #[error("Math domain error in '{function}': {message}")]
        Domain { function: String, message: String },
    }

    /// Failures raised by a whole calculation run.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum CalculationError {
        #[error(transparent)]
        Graph(#[from] GraphError),
        #[error("Unit validation failed with {} error(s)", .0.len())]
        Units(Vec<ValidationError>),
        #[error("Failed to evaluate parameter '{parameter}': {source}")]
        Evaluation { parameter: String, source: EvalError },
        #[error("Target '{name}' was not resolved")]
        UnresolvedTarget { name: String },
    }
}

/// The mutable state of one calculation run.
///
/// Seeded with the caller's inputs and grown monotonically as parameters are
/// resolved. A context belongs to exactly one run and is never shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    values: HashMap<String, f64>,
}

impl EvaluationContext {
    pub fn new() -> Self { Self::default() }

    pub fn from_inputs(inputs: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self { values: inputs.into_iter().collect() }
    }

    #[inline(always)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[inline(always)]
    pub fn insert(&mut self, name: String, value: f64) {
        self.values.insert(name, value);
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}
