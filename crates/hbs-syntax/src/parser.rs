//! Template parser.
//!
//! Parses a stream of tokens (from `hbs-lexer`) into a `Template` AST.
//! Handles element nesting, attribute values (static, bound and
//! interpolated), element modifiers, block statements with `{{else}}`
//! and block params, and nested sub-expressions.
//!
//! Uses recursive descent; every nested body is parsed until a terminator
//! (`{{else}}`, `{{/name}}`, `</name>` or end of input) which the caller checks.

use crate::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ConcatPart, ConcatStatement, ElementModifierStatement,
    ElementNode, Expression, Hash, HashPair, Literal, MustacheCommentStatement, MustacheStatement,
    CommentStatement, PathExpression, Statement, SubExpression, Template, TextNode,
};
use crate::ParseError;
use hbs_lexer::{is_void_element, Span, Token, TokenKind};

/// What ended a run of statements.
#[derive(Debug, Clone, PartialEq)]
enum Terminator {
    Eof,
    Else,
    EndBlock(String),
    EndTag(String),
}

/// Template parser.
///
/// Converts a flat token stream into a hierarchical `Template` AST.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser for the given tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse source code into a template AST.
    pub fn parse(source: &str) -> Result<Template, ParseError> {
        let tokens = hbs_lexer::Scanner::tokenize(source)?;
        let mut parser = Parser::new(tokens);
        parser.parse_template()
    }

    fn parse_template(&mut self) -> Result<Template, ParseError> {
        let (body, end) = self.parse_statements()?;
        match end {
            Terminator::Eof => Ok(Template { body }),
            Terminator::Else => Err(self.error("Unexpected {{else}} outside of a block".into())),
            Terminator::EndBlock(name) => {
                Err(self.error(format!("Unexpected closing block {{{{/{name}}}}}")))
            }
            Terminator::EndTag(name) => {
                Err(self.error(format!("Unexpected closing tag </{name}>")))
            }
        }
    }

    /// Parse statements until a terminator, which is consumed and returned.
    fn parse_statements(&mut self) -> Result<(Vec<Statement>, Terminator), ParseError> {
        let mut body = Vec::new();

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => return Ok((body, Terminator::Eof)),
                TokenKind::Text(chars) => {
                    self.advance();
                    body.push(Statement::Text(TextNode { chars }));
                }
                TokenKind::Comment(value) => {
                    self.advance();
                    body.push(Statement::Comment(CommentStatement { value }));
                }
                TokenKind::MustacheComment(value) => {
                    self.advance();
                    body.push(Statement::MustacheComment(MustacheCommentStatement { value }));
                }
                TokenKind::Open if self.peek_is_else() => {
                    if self.peek_at(2).kind != TokenKind::Close {
                        return Err(self.error("Chained {{else ...}} is not supported".into()));
                    }
                    self.advance_by(3); // {{ else }}
                    return Ok((body, Terminator::Else));
                }
                TokenKind::Open | TokenKind::OpenTriple => {
                    body.push(Statement::Mustache(self.parse_mustache()?));
                }
                TokenKind::OpenBlock => {
                    body.push(Statement::Block(self.parse_block()?));
                }
                TokenKind::OpenEndBlock => {
                    self.advance();
                    let name = self.expect_path()?;
                    self.expect(TokenKind::Close, "'}}'")?;
                    return Ok((body, Terminator::EndBlock(name)));
                }
                TokenKind::TagOpen(tag) => {
                    body.push(Statement::Element(self.parse_element(tag)?));
                }
                TokenKind::EndTagOpen(tag) => {
                    self.advance();
                    self.expect(TokenKind::TagClose, "'>'")?;
                    return Ok((body, Terminator::EndTag(tag)));
                }
                other => return Err(self.error(format!("Unexpected token {other:?}"))),
            }
        }
    }

    // =========================================================================
    // Mustaches and blocks
    // =========================================================================

    fn parse_mustache(&mut self) -> Result<MustacheStatement, ParseError> {
        let trusting = self.peek().kind == TokenKind::OpenTriple;
        self.advance(); // {{ or {{{

        let (path, params, hash) = self.parse_call_body()?;

        if trusting {
            self.expect(TokenKind::CloseTriple, "'}}}'")?;
        } else {
            self.expect(TokenKind::Close, "'}}'")?;
        }

        Ok(MustacheStatement {
            path,
            params,
            hash,
            trusting,
        })
    }

    /// Parse a block:
    /// ```text
    /// {{#each items as |item|}}...{{else}}...{{/each}}
    /// ```
    fn parse_block(&mut self) -> Result<BlockStatement, ParseError> {
        let open_span = self.peek().span;
        self.advance(); // {{#

        let (path, params, hash) = self.parse_call_body()?;

        let mut block_params = Vec::new();
        if self.peek_is_block_params() {
            self.advance_by(2); // as |
            while let TokenKind::Path(name) = &self.peek().kind {
                block_params.push(name.clone());
                self.advance();
            }
            self.expect(TokenKind::Pipe, "'|'")?;
        }
        self.expect(TokenKind::Close, "'}}'")?;

        let name = match path.as_path() {
            Some(name) => name.to_string(),
            None => {
                return Err(Self::error_at(
                    open_span,
                    format!("Block helpers must be paths, found {}", path.type_name()),
                ))
            }
        };

        let (body, end) = self.parse_statements()?;
        let program = Block { body, block_params };

        let (inverse, end) = if end == Terminator::Else {
            let (body, end) = self.parse_statements()?;
            (
                Some(Block {
                    body,
                    block_params: Vec::new(),
                }),
                end,
            )
        } else {
            (None, end)
        };

        match end {
            Terminator::EndBlock(close) if close == name => Ok(BlockStatement {
                path,
                params,
                hash,
                program,
                inverse,
            }),
            Terminator::EndBlock(close) => Err(Self::error_at(
                open_span,
                format!("{{{{#{name}}}}} closed by {{{{/{close}}}}}"),
            )),
            Terminator::Else => Err(Self::error_at(
                open_span,
                format!("Block {{{{#{name}}}}} has more than one {{{{else}}}}"),
            )),
            _ => Err(Self::error_at(
                open_span,
                format!("Unclosed block {{{{#{name}}}}}"),
            )),
        }
    }

    /// Parse `path param* key=value*`, stopping at a closer or at block params.
    fn parse_call_body(&mut self) -> Result<(Expression, Vec<Expression>, Hash), ParseError> {
        let path = self.parse_expression()?;
        let mut params = Vec::new();
        let mut pairs = Vec::new();

        loop {
            if self.peek_is_block_params() {
                break;
            }
            let is_pair = matches!(self.peek().kind, TokenKind::Path(_))
                && self.peek_at(1).kind == TokenKind::Equals;

            if is_pair {
                let key = self.expect_path()?;
                self.advance(); // =
                let value = self.parse_expression()?;
                pairs.push(HashPair { key, value });
            } else if self.peek_starts_expression() {
                if !pairs.is_empty() {
                    return Err(self.error("Positional argument after named arguments".into()));
                }
                params.push(self.parse_expression()?);
            } else {
                break;
            }
        }

        Ok((path, params, Hash { pairs }))
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::Path(original) => Expression::Path(PathExpression { original }),
            TokenKind::String(s) => Expression::Literal(Literal::String(s)),
            TokenKind::Number(n) => Expression::Literal(Literal::Number(n)),
            TokenKind::Boolean(b) => Expression::Literal(Literal::Boolean(b)),
            TokenKind::Null => Expression::Literal(Literal::Null),
            TokenKind::Undefined => Expression::Literal(Literal::Undefined),
            TokenKind::LParen => {
                self.advance(); // (
                let (path, params, hash) = self.parse_call_body()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(Expression::SubExpression(SubExpression {
                    path: Box::new(path),
                    params,
                    hash,
                }));
            }
            other => return Err(self.error(format!("Expected expression, found {other:?}"))),
        };
        self.advance();
        Ok(expr)
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Parse an element:
    /// ```text
    /// <div class="a {{b}}" title={{t}} {{on "click" go}}>children</div>
    /// ```
    fn parse_element(&mut self, tag: String) -> Result<ElementNode, ParseError> {
        let open_span = self.peek().span;
        self.advance(); // <tag

        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();

        let self_closing = loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::AttrName(name) => {
                    self.advance();
                    let value = if self.peek().kind == TokenKind::Equals {
                        self.advance();
                        self.parse_attr_value()?
                    } else {
                        AttrValue::Text(TextNode::default())
                    };
                    attributes.push(AttrNode { name, value });
                }
                TokenKind::Open => {
                    let m = self.parse_mustache()?;
                    modifiers.push(ElementModifierStatement {
                        path: m.path,
                        params: m.params,
                        hash: m.hash,
                    });
                }
                TokenKind::TagClose => {
                    self.advance();
                    break false;
                }
                TokenKind::SelfClose => {
                    self.advance();
                    break true;
                }
                other => {
                    return Err(self.error(format!("Unexpected token in <{tag}>: {other:?}")))
                }
            }
        };

        let mut element = ElementNode {
            tag,
            attributes,
            modifiers,
            children: Vec::new(),
            self_closing,
        };

        if self_closing || is_void_element(&element.tag) {
            return Ok(element);
        }

        let (children, end) = self.parse_statements()?;
        match end {
            Terminator::EndTag(close) if close == element.tag => {
                element.children = children;
                Ok(element)
            }
            Terminator::EndTag(close) => Err(Self::error_at(
                open_span,
                format!("<{}> closed by </{close}>", element.tag),
            )),
            _ => Err(Self::error_at(
                open_span,
                format!("Unclosed element <{}>", element.tag),
            )),
        }
    }

    fn parse_attr_value(&mut self) -> Result<AttrValue, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Quote => {
                self.advance();
                let mut parts = Vec::new();
                loop {
                    let token = self.peek().clone();
                    match token.kind {
                        TokenKind::AttrText(chars) => {
                            self.advance();
                            parts.push(ConcatPart::Text(TextNode { chars }));
                        }
                        TokenKind::Open | TokenKind::OpenTriple => {
                            parts.push(ConcatPart::Mustache(self.parse_mustache()?));
                        }
                        TokenKind::Quote => {
                            self.advance();
                            break;
                        }
                        other => {
                            return Err(
                                self.error(format!("Unexpected token in attribute value: {other:?}"))
                            )
                        }
                    }
                }

                if parts.iter().any(|p| matches!(p, ConcatPart::Mustache(_))) {
                    Ok(AttrValue::Concat(ConcatStatement { parts }))
                } else {
                    let chars = parts
                        .into_iter()
                        .filter_map(|p| match p {
                            ConcatPart::Text(t) => Some(t.chars),
                            ConcatPart::Mustache(_) => None,
                        })
                        .collect();
                    Ok(AttrValue::Text(TextNode { chars }))
                }
            }
            TokenKind::Open | TokenKind::OpenTriple => Ok(AttrValue::Mustache(self.parse_mustache()?)),
            // Unquoted value: class=foo
            TokenKind::AttrName(chars) => {
                self.advance();
                Ok(AttrValue::Text(TextNode { chars }))
            }
            other => Err(self.error(format!("Expected attribute value, found {other:?}"))),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn peek_is_else(&self) -> bool {
        self.peek().kind == TokenKind::Open
            && self.peek_at(1).kind == TokenKind::Path("else".into())
    }

    fn peek_is_block_params(&self) -> bool {
        self.peek().kind == TokenKind::Path("as".into()) && self.peek_at(1).kind == TokenKind::Pipe
    }

    fn peek_starts_expression(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Path(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::Boolean(_)
                | TokenKind::Null
                | TokenKind::Undefined
                | TokenKind::LParen
        )
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected {what}, found {:?}", self.peek().kind)))
        }
    }

    fn expect_path(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Path(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!("Expected path, found {:?}", self.peek().kind)))
        }
    }

    fn error(&self, message: String) -> ParseError {
        Self::error_at(self.peek().span, message)
    }

    fn error_at(span: Span, message: String) -> ParseError {
        ParseError {
            message,
            line: span.line,
            column: span.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders as b;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Template {
        Parser::parse(source).unwrap()
    }

    fn first(source: &str) -> Statement {
        parse(source).body.into_iter().next().unwrap()
    }

    // =========================================================================
    // Content
    // =========================================================================

    #[test]
    fn test_empty_template() {
        assert_eq!(parse(""), Template { body: vec![] });
    }

    #[test]
    fn test_text_only() {
        assert_eq!(first("hello"), Statement::Text(b::text("hello")));
    }

    #[test]
    fn test_comments() {
        let tpl = parse("<!-- a -->{{! b }}");
        assert_eq!(
            tpl.body,
            vec![
                Statement::Comment(CommentStatement { value: " a ".into() }),
                Statement::MustacheComment(MustacheCommentStatement { value: " b ".into() }),
            ]
        );
    }

    // =========================================================================
    // Mustaches
    // =========================================================================

    #[test]
    fn test_bare_mustache() {
        assert_eq!(
            first("{{foo.bar}}"),
            Statement::Mustache(b::mustache(b::path("foo.bar"), vec![]))
        );
    }

    #[test]
    fn test_mustache_with_params_and_hash() {
        let Statement::Mustache(m) = first("{{my-comp title 1 tagName=\"span\" active=true}}") else {
            panic!("expected mustache");
        };
        assert_eq!(m.path, b::path("my-comp"));
        assert_eq!(m.params, vec![b::path("title"), b::number(1.0)]);
        assert_eq!(m.hash.get("tagName"), Some(&b::string("span")));
        assert_eq!(m.hash.get("active"), Some(&b::boolean(true)));
    }

    #[test]
    fn test_nested_sub_expression() {
        let Statement::Mustache(m) = first("{{if (eq a (b c)) \"y\"}}") else {
            panic!("expected mustache");
        };
        assert_eq!(
            m.params[0],
            b::sexpr(b::path("eq"), vec![b::path("a"), b::sexpr(b::path("b"), vec![b::path("c")])])
        );
    }

    #[test]
    fn test_trusting_mustache() {
        let Statement::Mustache(m) = first("{{{raw}}}") else {
            panic!("expected mustache");
        };
        assert!(m.trusting);
    }

    #[test]
    fn test_positional_after_named_is_error() {
        let err = Parser::parse("{{foo a=1 b}}").unwrap_err();
        assert_eq!(err.message, "Positional argument after named arguments");
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    #[test]
    fn test_block_with_inverse() {
        let Statement::Block(block) = first("{{#if hasBlock}}yes{{else}}no{{/if}}") else {
            panic!("expected block");
        };
        assert_eq!(block.path_name(), Some("if"));
        assert_eq!(block.params, vec![b::path("hasBlock")]);
        assert_eq!(block.program.body, vec![Statement::Text(b::text("yes"))]);
        assert_eq!(
            block.inverse.unwrap().body,
            vec![Statement::Text(b::text("no"))]
        );
    }

    #[test]
    fn test_block_params() {
        let Statement::Block(block) = first("{{#each items as |item i|}}{{item}}{{/each}}") else {
            panic!("expected block");
        };
        assert_eq!(block.program.block_params, vec!["item".to_string(), "i".to_string()]);
        assert_eq!(block.params, vec![b::path("items")]);
    }

    #[test]
    fn test_mismatched_block_close() {
        let err = Parser::parse("{{#if a}}x{{/each}}").unwrap_err();
        assert_eq!(err.message, "{{#if}} closed by {{/each}}");
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_unclosed_block() {
        let err = Parser::parse("{{#if a}}x").unwrap_err();
        assert_eq!(err.message, "Unclosed block {{#if}}");
    }

    #[test]
    fn test_else_outside_block() {
        let err = Parser::parse("a{{else}}b").unwrap_err();
        assert_eq!(err.message, "Unexpected {{else}} outside of a block");
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_element_attribute_kinds() {
        let Statement::Element(el) =
            first("<div class=\"a {{b}}\" title={{t}} id=\"x\" hidden role=main></div>")
        else {
            panic!("expected element");
        };
        assert_eq!(el.tag, "div");
        assert_eq!(
            el.attributes,
            vec![
                b::attr(
                    "class",
                    AttrValue::Concat(b::concat(vec![
                        b::text("a ").into(),
                        b::mustache(b::path("b"), vec![]).into(),
                    ]))
                ),
                b::attr("title", AttrValue::Mustache(b::mustache(b::path("t"), vec![]))),
                b::attr("id", AttrValue::Text(b::text("x"))),
                b::attr("hidden", AttrValue::Text(b::text(""))),
                b::attr("role", AttrValue::Text(b::text("main"))),
            ]
        );
    }

    #[test]
    fn test_element_modifier() {
        let Statement::Element(el) = first("<button {{on \"click\" save}}>Go</button>") else {
            panic!("expected element");
        };
        assert_eq!(el.modifiers.len(), 1);
        assert_eq!(el.modifiers[0].path, b::path("on"));
        assert_eq!(el.children, vec![Statement::Text(b::text("Go"))]);
    }

    #[test]
    fn test_nested_elements() {
        let Statement::Element(el) = first("<ul><li>{{item}}</li></ul>") else {
            panic!("expected element");
        };
        let Statement::Element(li) = &el.children[0] else {
            panic!("expected li");
        };
        assert_eq!(li.tag, "li");
        assert_eq!(
            li.children,
            vec![Statement::Mustache(b::mustache(b::path("item"), vec![]))]
        );
    }

    #[test]
    fn test_void_and_self_closing() {
        let tpl = parse("<input type=\"text\"><MyThing />");
        let Statement::Element(input) = &tpl.body[0] else {
            panic!("expected input");
        };
        assert!(input.children.is_empty());
        assert!(!input.self_closing);
        let Statement::Element(thing) = &tpl.body[1] else {
            panic!("expected component");
        };
        assert!(thing.self_closing);
    }

    #[test]
    fn test_mismatched_close_tag() {
        let err = Parser::parse("<div>\n  <span></div>").unwrap_err();
        assert_eq!(err.message, "<span> closed by </div>");
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn test_unclosed_element() {
        let err = Parser::parse("<p>text").unwrap_err();
        assert_eq!(err.message, "Unclosed element <p>");
    }

    #[test]
    fn test_lexer_error_is_parse_error() {
        let err = Parser::parse("{{foo").unwrap_err();
        assert_eq!(err.message, "Unterminated mustache");
    }
}
