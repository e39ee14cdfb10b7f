//! Turns formula strings into syntax trees.
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{AstNode, BinaryOperator};
pub use error::ParseError;
pub use parser::{parse_formula, MAX_FORMULA_DEPTH};
