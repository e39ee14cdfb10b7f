//! Defines the `AstNode` tree produced by the formula parser.
//!
//! A single tree shape serves both numeric evaluation and the unit pass, so the
//! evaluator and the unit resolver each walk it with one exhaustive `match`.

use std::collections::BTreeSet;
use std::fmt;

/// The binary arithmetic operators supported by the formula grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Written `**` in formulas. Right-associative.
    Power,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "**",
        }
    }
}

/// A parsed formula.
///
/// Trees built by `parse_formula` are bounded by `MAX_FORMULA_DEPTH`.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// A numeric literal such as `0.2` or `1e6`.
    Literal(f64),
    /// A quoted string literal such as `'years'`.
    /// Only meaningful as a builtin argument and never a dependency.
    Text(String),
    /// A reference to another parameter by name.
    Variable(String),
    BinaryOp {
        op: BinaryOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    UnaryNegate { operand: Box<AstNode> },
    /// A builtin invocation. The `name` slot is not a variable reference.
    Call { name: String, args: Vec<AstNode> },
}

impl AstNode {
    pub fn binary(op: BinaryOperator, left: AstNode, right: AstNode) -> Self {
        AstNode::BinaryOp { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn negate(operand: AstNode) -> Self {
        AstNode::UnaryNegate { operand: Box::new(operand) }
    }

    /// Collects the free variable names referenced anywhere in the tree.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            AstNode::Literal(_) | AstNode::Text(_) => {}
            AstNode::Variable(name) => {
                vars.insert(name.clone());
            }
            AstNode::BinaryOp { left, right, .. } => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            AstNode::UnaryNegate { operand } => operand.collect_variables(vars),
            AstNode::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

/// Renders the tree fully parenthesised, which makes precedence visible in logs and tests.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Literal(n) => write!(f, "{}", n),
            AstNode::Text(s) => write!(f, "'{}'", s),
            AstNode::Variable(name) => write!(f, "{}", name),
            AstNode::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            AstNode::UnaryNegate { operand } => write!(f, "-{}", operand),
            AstNode::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
