//! Abstract Syntax Tree for Handlebars-style templates.
//!
//! Contains statement-level nodes (text, mustaches, blocks, elements),
//! attribute-level nodes (attribute values and interpolations) and
//! expression-level nodes (paths, sub-expressions, literals).

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A complete template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub body: Vec<Statement>,
}

/// A block body: the program or inverse of a block statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub body: Vec<Statement>,
    pub block_params: Vec<String>,
}

/// A node that can appear in a template body or element children.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Literal text.
    Text(TextNode),

    /// `{{path params hash}}`
    Mustache(MustacheStatement),

    /// `{{#path params hash}}...{{else}}...{{/path}}`
    Block(BlockStatement),

    /// `<tag attrs>children</tag>`
    Element(ElementNode),

    /// `<!-- ... -->`
    Comment(CommentStatement),

    /// `{{! ... }}`
    MustacheComment(MustacheCommentStatement),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextNode {
    pub chars: String,
}

/// A mustache. `trusting` is set for `{{{ }}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MustacheStatement {
    pub path: Expression,
    pub params: Vec<Expression>,
    pub hash: Hash,
    pub trusting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub path: Expression,
    pub params: Vec<Expression>,
    pub hash: Hash,
    pub program: Block,
    pub inverse: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<AttrNode>,
    pub modifiers: Vec<ElementModifierStatement>,
    pub children: Vec<Statement>,
    pub self_closing: bool,
}

/// A mustache in tag position: `<div {{on "click" go}}>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementModifierStatement {
    pub path: Expression,
    pub params: Vec<Expression>,
    pub hash: Hash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentStatement {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MustacheCommentStatement {
    pub value: String,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AttrNode {
    pub name: String,
    pub value: AttrValue,
}

/// The value of an attribute.
///
/// `Text` is a fully static value, `Mustache` a single bound expression
/// (`name={{expr}}`), `Concat` an interpolation of text and expressions
/// (`name="a {{b}} c"`).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(TextNode),
    Mustache(MustacheStatement),
    Concat(ConcatStatement),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConcatStatement {
    pub parts: Vec<ConcatPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConcatPart {
    Text(TextNode),
    Mustache(MustacheStatement),
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Path(PathExpression),
    SubExpression(SubExpression),
    Literal(Literal),
}

/// A path reference: `foo`, `this.foo.bar`, `@arg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    pub original: String,
}

impl PathExpression {
    /// The dot-separated segments of the path.
    pub fn parts(&self) -> Vec<&str> {
        self.original.split('.').collect()
    }
}

/// A helper call nested in another expression: `(concat a b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubExpression {
    pub path: Box<Expression>,
    pub params: Vec<Expression>,
    pub hash: Hash,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hash {
    pub pairs: Vec<HashPair>,
}

impl Hash {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.pairs.iter().find(|p| p.key == key).map(|p| &p.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: String,
    pub value: Expression,
}

// ---------------------------------------------------------------------------
// Node type names
// ---------------------------------------------------------------------------

impl Expression {
    /// The node type name, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Expression::Path(_) => "PathExpression",
            Expression::SubExpression(_) => "SubExpression",
            Expression::Literal(lit) => lit.type_name(),
        }
    }

    /// The path's source text when this is a path expression.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Expression::Path(p) => Some(&p.original),
            _ => None,
        }
    }
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "StringLiteral",
            Literal::Number(_) => "NumberLiteral",
            Literal::Boolean(_) => "BooleanLiteral",
            Literal::Null => "NullLiteral",
            Literal::Undefined => "UndefinedLiteral",
        }
    }
}

impl MustacheStatement {
    /// True for `{{name}}` with no params or hash.
    pub fn is_bare_path(&self) -> bool {
        matches!(self.path, Expression::Path(_)) && self.params.is_empty() && self.hash.is_empty()
    }
}

impl BlockStatement {
    pub fn path_name(&self) -> Option<&str> {
        self.path.as_path()
    }
}
