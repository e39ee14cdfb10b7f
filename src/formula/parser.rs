//! Parser: formula string -> `AstNode` + dependency set.
//! Uses the LALRPOP grammar in `grammar.lalrpop`, fed by the hand-written lexer.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('**' unary)?
//! primary := NUMBER | STRING | IDENT | IDENT '(' args ')' | '(' expr ')'
//! args    := (expr (',' expr)* ','?)?
//! ```
//!
//! `**` binds tighter than a leading minus and is right-associative,
//! so `-2**2` is `-(2**2)` and `2**3**2` is `2**(3**2)`.
//!
//! Every tree is at most `MAX_FORMULA_DEPTH` levels deep, so the recursive
//! walks over it (evaluation, unit inference, display) stay within the stack.

use super::ast::{AstNode, BinaryOperator};
use super::error::ParseError;
use super::lexer::{Lexer, Tok};
use lalrpop_util::lalrpop_mod;
use std::collections::BTreeSet;

lalrpop_mod!(
    #[allow(clippy::ptr_arg)]
    #[allow(clippy::type_complexity)]
    #[allow(clippy::just_underscores_and_digits)]
    #[allow(unused_imports)]
    grammar,
    "/formula/grammar.rs"
);

/// Deepest nesting of parentheses, signs, operators and calls a formula may have.
pub const MAX_FORMULA_DEPTH: usize = 200;

type GrammarError = lalrpop_util::ParseError<usize, Tok, ParseError>;

/// Parses `formula` into its syntax tree and the set of parameter names it reads.
pub fn parse_formula(formula: &str) -> Result<(AstNode, BTreeSet<String>), ParseError> {
    if formula.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let root = grammar::FormulaParser::new()
        .parse(Lexer::new(formula))
        .map_err(from_grammar_error)?;
    let dependencies = root.ast.variables();
    Ok((root.ast, dependencies))
}

fn from_grammar_error(err: GrammarError) -> ParseError {
    // Terminal names arrive quoted, e.g. `"\")\""`.
    let unquote = |expected: Vec<String>| -> Vec<String> {
        expected.into_iter().map(|e| e.trim_matches('"').to_string()).collect()
    };

    match err {
        GrammarError::User { error } => error,
        GrammarError::InvalidToken { location } => ParseError::InvalidToken { offset: location },
        GrammarError::UnrecognizedEof { expected, .. } => ParseError::UnexpectedEnd { expected: unquote(expected) },
        GrammarError::UnrecognizedToken { token: (offset, tok, _), expected } => ParseError::UnexpectedToken {
            found: tok.to_string(),
            offset,
            expected: unquote(expected),
        },
        GrammarError::ExtraToken { token: (offset, tok, _) } => ParseError::UnexpectedToken {
            found: tok.to_string(),
            offset,
            expected: vec!["end of formula".to_string()],
        },
    }
}

/// A subtree under construction, tagged with how deeply it nests.
#[derive(Debug)]
pub struct Node {
    ast: AstNode,
    depth: usize,
}

impl Node {
    pub(crate) fn leaf(ast: AstNode) -> Self {
        Node { ast, depth: 0 }
    }

    pub(crate) fn binary(op: BinaryOperator, left: Node, right: Node) -> Result<Self, GrammarError> {
        let depth = left.depth.max(right.depth) + 1;
        Self::bounded(AstNode::binary(op, left.ast, right.ast), depth)
    }

    pub(crate) fn negate(operand: Node) -> Result<Self, GrammarError> {
        let depth = operand.depth + 1;
        Self::bounded(AstNode::negate(operand.ast), depth)
    }

    /// Parentheses and unary plus add a level without adding a node.
    pub(crate) fn nested(inner: Node) -> Result<Self, GrammarError> {
        let depth = inner.depth + 1;
        Self::bounded(inner.ast, depth)
    }

    pub(crate) fn call(name: String, args: Vec<Node>) -> Result<Self, GrammarError> {
        let depth = args.iter().map(|a| a.depth).max().unwrap_or(0) + 1;
        let args = args.into_iter().map(|a| a.ast).collect();
        Self::bounded(AstNode::Call { name, args }, depth)
    }

    fn bounded(ast: AstNode, depth: usize) -> Result<Self, GrammarError> {
        if depth > MAX_FORMULA_DEPTH {
            return Err(GrammarError::User { error: ParseError::TooDeep { limit: MAX_FORMULA_DEPTH } });
        }
        Ok(Node { ast, depth })
    }
}
