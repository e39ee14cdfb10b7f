//! Runs unit inference across a whole parameter set in dependency order.
use super::error::{ValidationError, ValidationErrorType};
use super::registry::check_input;
use super::units::{infer_unit, same_unit};
use crate::graph::DependencyGraph;
use crate::store::{Parameter, ParameterKind, Unit};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Orchestrates unit inference and verification of declared units.
pub struct UnitChecker<'a> {
    parameters: &'a [Parameter],
    graph: &'a DependencyGraph,
    inputs: Option<&'a HashMap<String, f64>>,
    inferred: HashMap<&'a str, Unit>,
    errors: Vec<ValidationError>,
}

/// Checks supplied values for user parameters against the range of their declared unit.
///
/// Parameters without a declared unit, and user parameters with no supplied
/// value, are not checked. Findings come back in parameter order.
pub fn validate_inputs(parameters: &[Parameter], inputs: &HashMap<String, f64>) -> Vec<ValidationError> {
    parameters
        .iter()
        .filter(|p| p.kind() == ParameterKind::User)
        .filter_map(|p| {
            let unit = p.unit().filter(|u| !u.is_dimensionless())?;
            let value = inputs.get(p.name())?;
            check_input(p.name(), *value, &unit.0)
        })
        .collect()
}

impl<'a> UnitChecker<'a> {
    /// `graph` must have been built from `parameters`.
    pub fn new(parameters: &'a [Parameter], graph: &'a DependencyGraph) -> Self {
        Self {
            parameters,
            graph,
            inputs: None,
            inferred: HashMap::with_capacity(parameters.len()),
            errors: Vec::new(),
        }
    }

    /// Also validates these supplied values before inferring formula units.
    pub fn with_inputs(mut self, inputs: &'a HashMap<String, f64>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Checks every parameter, returning the inferred unit of each one, or every
    /// error found. A failing parameter does not stop the pass.
    pub fn check_and_infer(mut self) -> Result<HashMap<String, Unit>, Vec<ValidationError>> {
        let order = match self.graph.topological_order() {
            Ok(order) => order,
            Err(e) => return Err(vec![ValidationError::structural(e.to_string())]),
        };

        let parameters = self.parameters;
        if let Some(inputs) = self.inputs {
            for error in validate_inputs(parameters, inputs) {
                self.report(error);
            }
        }
        for id in order {
            self.check_parameter(&parameters[id.index()]);
        }

        debug!(parameters = self.inferred.len(), errors = self.errors.len(), "unit check finished");

        if self.errors.is_empty() {
            Ok(self.inferred.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
        } else {
            Err(self.errors)
        }
    }

    fn check_parameter(&mut self, param: &'a Parameter) {
        let declared = param.unit().cloned().unwrap_or_else(Unit::dimensionless);

        let ast = match (param.kind(), param.ast()) {
            (ParameterKind::Calculation, Some(ast)) => ast,
            _ => {
                self.inferred.insert(param.name(), declared);
                return;
            }
        };

        // --- PHASE 1: INFERENCE ---
        let inferred = {
            let known = &self.inferred;
            infer_unit(ast, &|name: &str| known.get(name).cloned())
        };

        let unit = match inferred {
            // --- PHASE 2: VERIFICATION ---
            // A dimensionless result carries no evidence against the declaration.
            Ok(unit) => {
                if !declared.is_dimensionless() && !unit.is_dimensionless() && !same_unit(&declared, &unit) {
                    self.report(ValidationError {
                        parameter: param.name().to_string(),
                        error_type: ValidationErrorType::DeclarationMismatch,
                        message: format!("Formula produces {} but parameter expects {}", unit, declared),
                    });
                }
                if unit.is_dimensionless() { declared } else { unit }
            }
            Err(e) => {
                self.report(ValidationError::from_unit_error(param.name(), &e));
                declared
            }
        };

        // --- PHASE 3: STORAGE ---
        // Downstream parameters build on what the formula produces, not on the declaration.
        self.inferred.insert(param.name(), unit);
    }

    fn report(&mut self, error: ValidationError) {
        warn!(parameter = %error.parameter, message = %error.message, "unit validation failed");
        self.errors.push(error);
    }
}
