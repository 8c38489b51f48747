/// A position in source text, tracking line and column for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token classification for template source.
///
/// Data-carrying variants embed their value directly (no separate `value` field on Token).
/// The same `Equals` token is produced inside tags (`class=`) and inside mustaches (`key=`).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Content
    Text(String),
    Comment(String),
    MustacheComment(String),

    // HTML tags
    TagOpen(String),    // <div
    EndTagOpen(String), // </div
    TagClose,           // >
    SelfClose,          // />
    AttrName(String),
    Quote,
    AttrText(String),

    // Mustache delimiters
    Open,         // {{
    OpenTriple,   // {{{
    OpenBlock,    // {{#
    OpenEndBlock, // {{/
    Close,        // }}
    CloseTriple,  // }}}

    // Inside mustaches (carry data)
    Path(String),
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,

    // Punctuation
    Equals,
    LParen,
    RParen,
    Pipe,

    // End of input
    Eof,
}

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// HTML5 void elements (no closing tag, no children).
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Check if a tag name is an HTML5 void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}
