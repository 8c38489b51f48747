//! Template Syntax
//!
//! AST, builders, parser, printer and traversal for Handlebars-style
//! component templates.
//!
//! ```text
//! source → Parser::parse() → Template → traverse(visitor) → print() → source
//! ```

pub mod ast;
pub mod builders;
pub mod parser;
pub mod printer;
pub mod traverse;

pub use ast::{AttrNode, AttrValue, ElementNode, Expression, Statement, Template};
pub use parser::Parser;
pub use printer::print;
pub use traverse::{traverse, traverse_block, Action, Visitor};

use hbs_lexer::LexerError;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        Self {
            message: err.message,
            line: err.line,
            column: err.column,
        }
    }
}
