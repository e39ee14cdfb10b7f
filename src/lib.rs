//! A parameter dependency-resolution and formula-evaluation engine.
//!
//! Parameters are either fixed values (`GLOBAL`, `COMPANY`), caller-supplied
//! inputs (`USER`), or formulas over other parameters (`CALCULATION`). A
//! [`Calculator`] orders them by their dependencies, evaluates what a target
//! needs, and optionally checks that formulas combine units consistently.

pub mod computation;
pub mod config;
pub mod error;
pub mod formula;
pub mod graph;
pub mod store;
pub mod type_system;

pub use computation::{run, CalculationError, Calculator, EvalError, EvaluationContext, Evaluator};
pub use config::CalculatorConfig;
pub use error::{EngineError, Result};
pub use formula::{parse_formula, AstNode, ParseError, MAX_FORMULA_DEPTH};
pub use graph::{DependencyGraph, GraphError};
pub use store::{
    CalculationRequest, CalculationResponse, CalculationResult, DefinitionError, Parameter, ParameterDef,
    ParameterKind, Target, Unit,
};
pub use type_system::{validate_inputs, UnitChecker, ValidationError, ValidationErrorType};
