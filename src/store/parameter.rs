//! The validated, immutable definition of one named quantity.

use super::types::{ParameterDef, ParameterKind, Unit};
use crate::computation::context::{EvalError, EvaluationContext};
use crate::computation::evaluator::Evaluator;
use crate::formula::{parse_formula, AstNode, ParseError};
use std::collections::BTreeSet;
use thiserror::Error;

static NO_DEPENDENCIES: BTreeSet<String> = BTreeSet::new();

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("Parameter name must not be empty")]
    EmptyName,
    #[error("{kind} parameter '{name}' requires a value")]
    MissingValue { name: String, kind: ParameterKind },
    #[error("{kind} parameter '{name}' must not carry a value")]
    UnexpectedValue { name: String, kind: ParameterKind },
    #[error("CALCULATION parameter '{name}' requires a formula")]
    MissingFormula { name: String },
    #[error("{kind} parameter '{name}' must not carry a formula")]
    UnexpectedFormula { name: String, kind: ParameterKind },
    #[error("Error parsing formula for parameter '{name}': {source}")]
    InvalidFormula { name: String, source: ParseError },
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Static(f64),
    External,
    Formula {
        text: String,
        ast: AstNode,
        dependencies: BTreeSet<String>,
    },
}

/// A parameter whose formula, if any, has been parsed exactly once.
///
/// Definitions hold no evaluation state; every run resolves them into its own
/// `EvaluationContext`, so one parameter set can back any number of runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    unit: Option<Unit>,
    source: Source,
}

impl Parameter {
    pub fn new(def: ParameterDef) -> Result<Self, DefinitionError> {
        let ParameterDef { name, kind, unit, value, formula } = def;
        if name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        let source = match kind {
            ParameterKind::Global | ParameterKind::Company => {
                if formula.is_some() {
                    return Err(DefinitionError::UnexpectedFormula { name, kind });
                }
                match value {
                    Some(v) => Source::Static(v),
                    None => return Err(DefinitionError::MissingValue { name, kind }),
                }
            }
            ParameterKind::User => {
                if value.is_some() {
                    return Err(DefinitionError::UnexpectedValue { name, kind });
                }
                if formula.is_some() {
                    return Err(DefinitionError::UnexpectedFormula { name, kind });
                }
                Source::External
            }
            ParameterKind::Calculation => {
                if value.is_some() {
                    return Err(DefinitionError::UnexpectedValue { name, kind });
                }
                let text = formula.ok_or_else(|| DefinitionError::MissingFormula { name: name.clone() })?;
                let (ast, dependencies) = match parse_formula(&text) {
                    Ok(parsed) => parsed,
                    Err(source) => return Err(DefinitionError::InvalidFormula { name, source }),
                };
                Source::Formula { text, ast, dependencies }
            }
        };

        Ok(Self {
            name,
            kind,
            unit: unit.map(Unit),
            source,
        })
    }

    /// Builds a whole parameter set, failing on the first invalid definition.
    pub fn from_defs(defs: impl IntoIterator<Item = ParameterDef>) -> Result<Vec<Self>, DefinitionError> {
        defs.into_iter().map(Self::new).collect()
    }

    pub fn global(name: &str, value: f64) -> Result<Self, DefinitionError> {
        Self::new(Self::def(name, ParameterKind::Global, Some(value), None))
    }

    pub fn company(name: &str, value: f64) -> Result<Self, DefinitionError> {
        Self::new(Self::def(name, ParameterKind::Company, Some(value), None))
    }

    pub fn user(name: &str) -> Result<Self, DefinitionError> {
        Self::new(Self::def(name, ParameterKind::User, None, None))
    }

    pub fn calculation(name: &str, formula: &str) -> Result<Self, DefinitionError> {
        Self::new(Self::def(name, ParameterKind::Calculation, None, Some(formula.to_string())))
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(Unit(unit.to_string()));
        self
    }

    fn def(name: &str, kind: ParameterKind, value: Option<f64>, formula: Option<String>) -> ParameterDef {
        ParameterDef { name: name.to_string(), kind, unit: None, value, formula }
    }

    // --- Accessors ---
    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> ParameterKind { self.kind }
    pub fn unit(&self) -> Option<&Unit> { self.unit.as_ref() }

    pub fn static_value(&self) -> Option<f64> {
        match self.source {
            Source::Static(v) => Some(v),
            _ => None,
        }
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.source {
            Source::Formula { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn ast(&self) -> Option<&AstNode> {
        match &self.source {
            Source::Formula { ast, .. } => Some(ast),
            _ => None,
        }
    }

    /// Names read by the formula. Always empty for non-CALCULATION kinds.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        match &self.source {
            Source::Formula { dependencies, .. } => dependencies,
            _ => &NO_DEPENDENCIES,
        }
    }

    /// Resolves this parameter into `context` with the default builtin limits.
    pub fn resolve(&self, context: &mut EvaluationContext) -> Result<f64, EvalError> {
        self.resolve_with(context, &Evaluator::default())
    }

    /// Resolves this parameter, recording the result under its name.
    ///
    /// A value already present in `context` is returned untouched, so resolving
    /// twice in one run never recomputes.
    pub fn resolve_with(&self, context: &mut EvaluationContext, evaluator: &Evaluator) -> Result<f64, EvalError> {
        if let Some(value) = context.get(&self.name) {
            return Ok(value);
        }

        let value = match &self.source {
            Source::Static(v) => *v,
            Source::External => return Err(EvalError::MissingInput { name: self.name.clone() }),
            Source::Formula { ast, .. } => evaluator.evaluate(ast, context)?,
        };

        context.insert(self.name.clone(), value);
        Ok(value)
    }
}

impl TryFrom<ParameterDef> for Parameter {
    type Error = DefinitionError;

    fn try_from(def: ParameterDef) -> Result<Self, Self::Error> {
        Self::new(def)
    }
}
