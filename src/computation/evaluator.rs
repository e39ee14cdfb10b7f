//! Recursive interpreter over a cached `AstNode`.
use super::builtins::{self, Arg, DEFAULT_GROWTH_EXPONENT_LIMIT};
use super::context::{EvalError, EvaluationContext};
use crate::config::CalculatorConfig;
use crate::formula::{AstNode, BinaryOperator};

/// Evaluates formula trees against a context.
///
/// Division and powers use native `f64` semantics: `x / 0` is an infinity or NaN,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    growth_exponent_limit: f64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self { growth_exponent_limit: DEFAULT_GROWTH_EXPONENT_LIMIT }
    }
}

impl Evaluator {
    pub fn new(growth_exponent_limit: f64) -> Self {
        Self { growth_exponent_limit }
    }

    pub fn from_config(config: &CalculatorConfig) -> Self {
        Self::new(config.growth_exponent_limit)
    }

    pub fn evaluate(&self, ast: &AstNode, context: &EvaluationContext) -> Result<f64, EvalError> {
        match ast {
            AstNode::Literal(n) => Ok(*n),
            AstNode::Text(text) => Err(EvalError::UnexpectedText { text: text.clone() }),
            AstNode::Variable(name) => context
                .get(name)
                .ok_or_else(|| EvalError::UnresolvedVariable { name: name.clone() }),
            AstNode::BinaryOp { op, left, right } => {
                let l = self.evaluate(left, context)?;
                let r = self.evaluate(right, context)?;
                Ok(match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Subtract => l - r,
                    BinaryOperator::Multiply => l * r,
                    BinaryOperator::Divide => l / r,
                    BinaryOperator::Power => l.powf(r),
                })
            }
            AstNode::UnaryNegate { operand } => Ok(-self.evaluate(operand, context)?),
            AstNode::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(match arg {
                        AstNode::Text(text) => Arg::Text(text),
                        other => Arg::Number(self.evaluate(other, context)?),
                    });
                }
                builtins::call(name, &values, self.growth_exponent_limit)
            }
        }
    }
}
