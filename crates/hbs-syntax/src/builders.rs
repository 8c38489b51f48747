//! Node constructors.
//!
//! Thin functions for building AST nodes by hand, mirroring the builder
//! set template plugins usually reach for (`b.text`, `b.mustache`, ...).

use crate::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ConcatPart, ConcatStatement, ElementModifierStatement,
    ElementNode, Expression, Hash, HashPair, Literal, MustacheStatement, PathExpression, Statement,
    SubExpression, TextNode,
};

pub fn text(chars: impl Into<String>) -> TextNode {
    TextNode {
        chars: chars.into(),
    }
}

pub fn path(original: impl Into<String>) -> Expression {
    Expression::Path(PathExpression {
        original: original.into(),
    })
}

pub fn string(value: impl Into<String>) -> Expression {
    Expression::Literal(Literal::String(value.into()))
}

pub fn number(value: f64) -> Expression {
    Expression::Literal(Literal::Number(value))
}

pub fn boolean(value: bool) -> Expression {
    Expression::Literal(Literal::Boolean(value))
}

pub fn null() -> Expression {
    Expression::Literal(Literal::Null)
}

pub fn undefined() -> Expression {
    Expression::Literal(Literal::Undefined)
}

pub fn pair(key: impl Into<String>, value: Expression) -> HashPair {
    HashPair {
        key: key.into(),
        value,
    }
}

pub fn hash(pairs: Vec<HashPair>) -> Hash {
    Hash { pairs }
}

pub fn mustache(path: Expression, params: Vec<Expression>) -> MustacheStatement {
    mustache_with_hash(path, params, Hash::default())
}

pub fn mustache_with_hash(path: Expression, params: Vec<Expression>, hash: Hash) -> MustacheStatement {
    MustacheStatement {
        path,
        params,
        hash,
        trusting: false,
    }
}

pub fn sexpr(path: Expression, params: Vec<Expression>) -> Expression {
    sexpr_with_hash(path, params, Hash::default())
}

pub fn sexpr_with_hash(path: Expression, params: Vec<Expression>, hash: Hash) -> Expression {
    Expression::SubExpression(SubExpression {
        path: Box::new(path),
        params,
        hash,
    })
}

pub fn concat(parts: Vec<ConcatPart>) -> ConcatStatement {
    ConcatStatement { parts }
}

pub fn attr(name: impl Into<String>, value: AttrValue) -> AttrNode {
    AttrNode {
        name: name.into(),
        value,
    }
}

pub fn element(
    tag: impl Into<String>,
    attributes: Vec<AttrNode>,
    modifiers: Vec<ElementModifierStatement>,
    children: Vec<Statement>,
) -> ElementNode {
    ElementNode {
        tag: tag.into(),
        attributes,
        modifiers,
        children,
        self_closing: false,
    }
}

pub fn program(body: Vec<Statement>) -> Block {
    Block {
        body,
        block_params: Vec::new(),
    }
}

pub fn block(
    path: Expression,
    params: Vec<Expression>,
    program: Block,
    inverse: Option<Block>,
) -> BlockStatement {
    BlockStatement {
        path,
        params,
        hash: Hash::default(),
        program,
        inverse,
    }
}

// ---------------------------------------------------------------------------
// Conversions used when assembling statements and attribute values
// ---------------------------------------------------------------------------

impl From<TextNode> for Statement {
    fn from(node: TextNode) -> Self {
        Statement::Text(node)
    }
}

impl From<MustacheStatement> for Statement {
    fn from(node: MustacheStatement) -> Self {
        Statement::Mustache(node)
    }
}

impl From<ElementNode> for Statement {
    fn from(node: ElementNode) -> Self {
        Statement::Element(node)
    }
}

impl From<BlockStatement> for Statement {
    fn from(node: BlockStatement) -> Self {
        Statement::Block(node)
    }
}

impl From<TextNode> for ConcatPart {
    fn from(node: TextNode) -> Self {
        ConcatPart::Text(node)
    }
}

impl From<MustacheStatement> for ConcatPart {
    fn from(node: MustacheStatement) -> Self {
        ConcatPart::Mustache(node)
    }
}

impl From<TextNode> for AttrValue {
    fn from(node: TextNode) -> Self {
        AttrValue::Text(node)
    }
}

impl From<MustacheStatement> for AttrValue {
    fn from(node: MustacheStatement) -> Self {
        AttrValue::Mustache(node)
    }
}

impl From<ConcatStatement> for AttrValue {
    fn from(node: ConcatStatement) -> Self {
        AttrValue::Concat(node)
    }
}

impl From<ConcatPart> for AttrValue {
    fn from(part: ConcatPart) -> Self {
        match part {
            ConcatPart::Text(t) => AttrValue::Text(t),
            ConcatPart::Mustache(m) => AttrValue::Mustache(m),
        }
    }
}
