//! Defines the error types for the type system module.
use thiserror::Error;

/// A failure while inferring the unit of a single formula.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Incompatible units for {op}: '{left}' and '{right}'")]
    Mismatch { op: &'static str, left: String, right: String },
    #[error("Exponent must be dimensionless, got '{unit}'")]
    InvalidExponent { unit: String },
    #[error("Square root of '{unit}' has no integral unit")]
    NonIntegralRoot { unit: String },
    #[error("Variable '{name}' has no known unit")]
    UnknownVariable { name: String },
    #[error("Unit rule not defined for function '{name}'")]
    UnknownFunction { name: String },
}

/// The category of a `ValidationError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorType {
    /// The formula combines incompatible units.
    UnitMismatch,
    /// The formula is consistent but disagrees with the declared unit.
    DeclarationMismatch,
    /// The parameter set itself could not be ordered.
    Structural,
    /// An input declares a unit the registry does not know.
    UnknownUnit,
    /// An input lies outside the plausible range of its unit.
    ValueOutOfRange,
    /// An input looks like it was entered at the wrong scale, e.g. kW as MW.
    PossibleScaleError,
    /// A percentage input looks like a whole number rather than a fraction.
    PercentageFormat,
}

/// One finding of the parameter-set-wide unit check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{parameter}: {message}")]
pub struct ValidationError {
    pub parameter: String,
    pub error_type: ValidationErrorType,
    pub message: String,
}

impl ValidationError {
    pub fn from_unit_error(parameter: &str, err: &UnitError) -> Self {
        Self {
            parameter: parameter.to_string(),
            error_type: ValidationErrorType::UnitMismatch,
            message: err.to_string(),
        }
    }

    pub fn structural(message: String) -> Self {
        Self {
            parameter: String::new(),
            error_type: ValidationErrorType::Structural,
            message,
        }
    }
}
