//! Template Lexer
//!
//! Tokenizes Handlebars-style component templates into a stream of tokens.
//! Handles literal text, HTML tags and attributes (quoted values may embed
//! mustaches), `{{ }}` / `{{{ }}}` mustaches, block open/close delimiters,
//! HTML and mustache comments, and the expression tokens found inside mustaches.
//!
//! # Example
//!
//! ```
//! use hbs_lexer::Scanner;
//!
//! let tokens = Scanner::tokenize("").unwrap();
//! assert_eq!(tokens.len(), 1); // Just EOF
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{is_void_element, Span, Token, TokenKind};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
