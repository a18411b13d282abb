//! # Selector Language
//!
//! dbt's model-selection mini-language, parsed into a clean AST.
//! Pure functions: no I/O, no state, no graph dependency.

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::Result;
use ast::SelectorExpr;

/// Parse a selection expression such as `tag:staging,+stg_orders`.
pub fn parse(input: &str) -> Result<SelectorExpr> {
    let tokens = lexer::tokenize(input)?;
    parser::parse_expression(&tokens)
}
