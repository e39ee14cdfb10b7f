//! Parameter definitions and the request/response shapes that carry them.
pub mod parameter;
pub mod types;

pub use parameter::{DefinitionError, Parameter};
pub use types::{
    CalculationRequest, CalculationResponse, CalculationResult, ParameterDef, ParameterKind, Target, Unit,
};
