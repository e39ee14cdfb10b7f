//! Tunables for a `Calculator`.
use crate::computation::builtins::DEFAULT_GROWTH_EXPONENT_LIMIT;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    /// Run the unit pass before evaluating; any unit error aborts the run.
    pub check_units: bool,
    /// Only evaluate parameters the targets transitively depend on.
    pub prune_to_targets: bool,
    /// `growth` raises above this exponent and returns `0.0` below its negation.
    pub growth_exponent_limit: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            check_units: false,
            prune_to_targets: false,
            growth_exponent_limit: DEFAULT_GROWTH_EXPONENT_LIMIT,
        }
    }
}

impl CalculatorConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        if !(config.growth_exponent_limit.is_finite() && config.growth_exponent_limit > 0.0) {
            return Err(EngineError::Config(format!(
                "growth_exponent_limit must be a positive finite number, got {}",
                config.growth_exponent_limit
            )));
        }
        Ok(config)
    }
}
