use crate::token::{Span, Token, TokenKind};
use crate::LexerError;

/// Scanner mode determines how the next characters are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Top-level content and element children: text, tags, mustaches.
    Content,
    /// Inside `<tag ...>` or `</tag ...>`: attribute names, `=`, quotes.
    Tag,
    /// Inside a quoted attribute value; carries the opening quote.
    AttrValue(char),
    /// Inside `{{ ... }}`, or `{{{ ... }}}` when `triple`.
    Mustache { triple: bool },
}

/// Template source scanner.
///
/// Tokenizes template source into a flat stream of tokens.
/// Uses a mode stack so that a mustache opened inside a quoted attribute
/// value returns to that value once closed:
/// - `Vec<char>` source for index-based navigation
/// - Stack-based mode tracking
/// - Position tracking on every token
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    modes: Vec<ScannerMode>,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            modes: vec![ScannerMode::Content],
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    /// Scan all tokens from the source.
    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() {
            match self.mode() {
                ScannerMode::Content => self.scan_content()?,
                ScannerMode::Tag => self.scan_tag()?,
                ScannerMode::AttrValue(quote) => self.scan_attr_value(quote)?,
                ScannerMode::Mustache { triple } => self.scan_mustache(triple)?,
            }
        }

        match self.mode() {
            ScannerMode::Content => {}
            ScannerMode::Tag => return Err(self.error("Unterminated tag".into())),
            ScannerMode::AttrValue(_) => {
                return Err(self.error("Unterminated attribute value".into()))
            }
            ScannerMode::Mustache { .. } => {
                return Err(self.error("Unterminated mustache".into()))
            }
        }

        self.emit(TokenKind::Eof);
        Ok(())
    }

    // --- Content ---

    fn scan_content(&mut self) -> Result<(), LexerError> {
        if self.starts_with("{{") {
            return self.scan_mustache_open();
        }
        if self.starts_with("<!--") {
            return self.scan_html_comment();
        }
        if self.starts_with("</") {
            return self.scan_end_tag_open();
        }
        if self.peek() == '<' && self.peek_next().is_ascii_alphabetic() {
            return self.scan_tag_open();
        }

        let (start, line, column) = self.mark();
        let mut text = String::new();
        while !self.is_at_end() && !self.at_content_delimiter() {
            // `\{{` escapes a literal mustache opener
            if self.starts_with("\\{{") {
                text.push_str("{{");
                self.advance_by(3);
                continue;
            }
            text.push(self.peek());
            self.advance();
        }
        self.push_token(TokenKind::Text(text), start, line, column);
        Ok(())
    }

    /// Must match exactly the cases `scan_content` dispatches on.
    fn at_content_delimiter(&self) -> bool {
        self.starts_with("{{")
            || self.starts_with("<!--")
            || self.starts_with("</")
            || (self.peek() == '<' && self.peek_next().is_ascii_alphabetic())
    }

    fn scan_html_comment(&mut self) -> Result<(), LexerError> {
        let (start, line, column) = self.mark();
        self.advance_by(4); // <!--

        let mut content = String::new();
        while !self.is_at_end() && !self.starts_with("-->") {
            content.push(self.peek());
            self.advance();
        }

        if self.is_at_end() {
            return Err(LexerError {
                message: "Unterminated comment".into(),
                line,
                column,
            });
        }
        self.advance_by(3); // -->

        self.push_token(TokenKind::Comment(content), start, line, column);
        Ok(())
    }

    // --- Tags ---

    fn scan_tag_open(&mut self) -> Result<(), LexerError> {
        let (start, line, column) = self.mark();
        self.advance(); // <
        let name = self.scan_tag_name();
        self.push_token(TokenKind::TagOpen(name), start, line, column);
        self.modes.push(ScannerMode::Tag);
        Ok(())
    }

    fn scan_end_tag_open(&mut self) -> Result<(), LexerError> {
        let (start, line, column) = self.mark();
        self.advance_by(2); // </
        let name = self.scan_tag_name();
        if name.is_empty() {
            return Err(self.error("Expected tag name after '</'".into()));
        }
        self.push_token(TokenKind::EndTagOpen(name), start, line, column);
        self.modes.push(ScannerMode::Tag);
        Ok(())
    }

    fn scan_tag_name(&mut self) -> String {
        let mut name = String::new();
        while !self.is_at_end()
            && (self.peek().is_alphanumeric() || matches!(self.peek(), '-' | ':' | '.' | '_' | '@'))
        {
            name.push(self.peek());
            self.advance();
        }
        name
    }

    fn scan_tag(&mut self) -> Result<(), LexerError> {
        let ch = self.peek();

        match ch {
            c if c.is_whitespace() => {
                self.advance();
                Ok(())
            }
            '>' => {
                self.single(TokenKind::TagClose);
                self.pop_mode();
                Ok(())
            }
            '/' if self.peek_next() == '>' => {
                let (start, line, column) = self.mark();
                self.advance_by(2);
                self.push_token(TokenKind::SelfClose, start, line, column);
                self.pop_mode();
                Ok(())
            }
            '=' => {
                self.single(TokenKind::Equals);
                Ok(())
            }
            '"' | '\'' => {
                self.single(TokenKind::Quote);
                self.modes.push(ScannerMode::AttrValue(ch));
                Ok(())
            }
            '{' if self.starts_with("{{") => self.scan_mustache_open(),
            _ => {
                self.scan_attr_name();
                Ok(())
            }
        }
    }

    /// Attribute names (and unquoted values) run until whitespace, `=`, `>`,
    /// `/>`, a quote or a mustache opener.
    fn scan_attr_name(&mut self) {
        let (start, line, column) = self.mark();
        let mut name = String::new();
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace()
                || matches!(c, '=' | '>' | '"' | '\'')
                || self.starts_with("/>")
                || self.starts_with("{{")
            {
                break;
            }
            name.push(c);
            self.advance();
        }
        self.push_token(TokenKind::AttrName(name), start, line, column);
    }

    fn scan_attr_value(&mut self, quote: char) -> Result<(), LexerError> {
        if self.peek() == quote {
            self.single(TokenKind::Quote);
            self.pop_mode();
            return Ok(());
        }
        if self.starts_with("{{") {
            return self.scan_mustache_open();
        }

        let (start, line, column) = self.mark();
        let mut text = String::new();
        while !self.is_at_end() && self.peek() != quote && !self.starts_with("{{") {
            text.push(self.peek());
            self.advance();
        }
        self.push_token(TokenKind::AttrText(text), start, line, column);
        Ok(())
    }

    // --- Mustaches ---

    fn scan_mustache_open(&mut self) -> Result<(), LexerError> {
        if self.starts_with("{{!") {
            return self.scan_mustache_comment();
        }

        let (start, line, column) = self.mark();
        self.advance_by(2); // {{
        let kind = match self.peek() {
            '{' => {
                self.advance();
                TokenKind::OpenTriple
            }
            '#' => {
                self.advance();
                TokenKind::OpenBlock
            }
            '/' => {
                self.advance();
                TokenKind::OpenEndBlock
            }
            _ => TokenKind::Open,
        };
        let triple = kind == TokenKind::OpenTriple;
        self.push_token(kind, start, line, column);
        self.modes.push(ScannerMode::Mustache { triple });
        Ok(())
    }

    /// `{{! short }}` or `{{!-- long, may contain }} --}}`.
    fn scan_mustache_comment(&mut self) -> Result<(), LexerError> {
        let (start, line, column) = self.mark();
        self.advance_by(3); // {{!

        let long = self.starts_with("--");
        if long {
            self.advance_by(2);
        }
        let terminator = if long { "--}}" } else { "}}" };

        let mut content = String::new();
        while !self.is_at_end() && !self.starts_with(terminator) {
            content.push(self.peek());
            self.advance();
        }

        if self.is_at_end() {
            return Err(LexerError {
                message: "Unterminated mustache comment".into(),
                line,
                column,
            });
        }
        self.advance_by(terminator.len());

        self.push_token(TokenKind::MustacheComment(content), start, line, column);
        Ok(())
    }

    fn scan_mustache(&mut self, triple: bool) -> Result<(), LexerError> {
        let ch = self.peek();

        match ch {
            // Whitespace and whitespace-control markers are skipped
            c if c.is_whitespace() || c == '~' => {
                self.advance();
                Ok(())
            }
            '}' if triple && self.starts_with("}}}") => {
                let (start, line, column) = self.mark();
                self.advance_by(3);
                self.push_token(TokenKind::CloseTriple, start, line, column);
                self.pop_mode();
                Ok(())
            }
            '}' if !triple && self.starts_with("}}") => {
                let (start, line, column) = self.mark();
                self.advance_by(2);
                self.push_token(TokenKind::Close, start, line, column);
                self.pop_mode();
                Ok(())
            }
            '=' => {
                self.single(TokenKind::Equals);
                Ok(())
            }
            '(' => {
                self.single(TokenKind::LParen);
                Ok(())
            }
            ')' => {
                self.single(TokenKind::RParen);
                Ok(())
            }
            '|' => {
                self.single(TokenKind::Pipe);
                Ok(())
            }
            '"' | '\'' => self.scan_string(),
            c if c.is_ascii_digit() || (c == '-' && self.peek_next().is_ascii_digit()) => {
                self.scan_number()
            }
            c if is_path_char(c) => {
                self.scan_path();
                Ok(())
            }
            _ => Err(self.error(format!("Unexpected character in mustache: '{ch}'"))),
        }
    }

    /// Scan a string literal inside a mustache.
    fn scan_string(&mut self) -> Result<(), LexerError> {
        let quote = self.peek();
        let (start, line, column) = self.mark();
        self.advance(); // consume opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                self.advance(); // consume backslash
                if self.is_at_end() {
                    return Err(LexerError {
                        message: "Unterminated escape sequence".into(),
                        line: self.line,
                        column: self.column,
                    });
                }
                match self.peek() {
                    '\\' => value.push('\\'),
                    c if c == quote => value.push(c),
                    c => {
                        value.push('\\');
                        value.push(c);
                    }
                }
                self.advance();
            } else {
                value.push(self.peek());
                self.advance();
            }
        }

        if self.is_at_end() {
            return Err(LexerError {
                message: "Unterminated string".into(),
                line,
                column,
            });
        }

        self.advance(); // consume closing quote
        self.push_token(TokenKind::String(value), start, line, column);
        Ok(())
    }

    /// Scan a number literal (integer or float, optionally negative).
    fn scan_number(&mut self) -> Result<(), LexerError> {
        let (start, line, column) = self.mark();

        let mut text = String::new();
        if self.peek() == '-' {
            text.push('-');
            self.advance();
        }
        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            text.push(self.peek());
            self.advance();
        }

        let value: f64 = text.parse().map_err(|_| LexerError {
            message: format!("Invalid number: '{text}'"),
            line,
            column,
        })?;

        self.push_token(TokenKind::Number(value), start, line, column);
        Ok(())
    }

    /// Scan a path (`foo`, `this.bar`, `@baz`, `some-helper`) or a literal keyword.
    fn scan_path(&mut self) {
        let (start, line, column) = self.mark();

        let mut path = String::new();
        while !self.is_at_end() && is_path_char(self.peek()) {
            path.push(self.peek());
            self.advance();
        }

        let kind = match path.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            "undefined" => TokenKind::Undefined,
            _ => TokenKind::Path(path),
        };
        self.push_token(kind, start, line, column);
    }

    // --- Helpers ---

    fn mode(&self) -> ScannerMode {
        self.modes.last().copied().unwrap_or(ScannerMode::Content)
    }

    fn pop_mode(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.pos, self.line, self.column)
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) {
        let span = Span::new(start, self.pos, line, column);
        self.tokens.push(Token::new(kind, span));
    }

    /// Emit a one-character token and consume it.
    fn single(&mut self, kind: TokenKind) {
        let (start, line, column) = self.mark();
        self.advance();
        self.push_token(kind, start, line, column);
    }

    fn emit(&mut self, kind: TokenKind) {
        let span = Span::new(self.pos, self.pos, self.line, self.column);
        self.tokens.push(Token::new(kind, span));
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.pos + 1]
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        let mut idx = self.pos;
        for expected in pattern.chars() {
            if idx >= self.chars.len() || self.chars[idx] != expected {
                return false;
            }
            idx += 1;
        }
        true
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            if self.chars[self.pos] == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }
}

fn is_path_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '=' | '(' | ')' | '{' | '}' | '|' | '"' | '\'' | '~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn path(s: &str) -> TokenKind {
        TokenKind::Path(s.into())
    }

    // =========================================================================
    // Content
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            kinds("hello world\n"),
            vec![TokenKind::Text("hello world\n".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(
            kinds("a < b"),
            vec![TokenKind::Text("a < b".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_escaped_mustache_is_text() {
        assert_eq!(
            kinds("\\{{foo}}"),
            vec![TokenKind::Text("{{foo}}".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_html_comment() {
        assert_eq!(
            kinds("<!-- note -->"),
            vec![TokenKind::Comment(" note ".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_html_comment() {
        let err = Scanner::tokenize("<!-- oops").unwrap_err();
        assert_eq!(err.message, "Unterminated comment");
        assert_eq!((err.line, err.column), (1, 1));
    }

    // =========================================================================
    // Mustaches
    // =========================================================================

    #[test]
    fn test_simple_mustache() {
        assert_eq!(
            kinds("{{foo}}"),
            vec![TokenKind::Open, path("foo"), TokenKind::Close, TokenKind::Eof]
        );
    }

    #[test]
    fn test_mustache_with_params_and_hash() {
        assert_eq!(
            kinds("{{my-comp title \"x\" 2 flag=true other=null}}"),
            vec![
                TokenKind::Open,
                path("my-comp"),
                path("title"),
                TokenKind::String("x".into()),
                TokenKind::Number(2.0),
                path("flag"),
                TokenKind::Equals,
                TokenKind::Boolean(true),
                path("other"),
                TokenKind::Equals,
                TokenKind::Null,
                TokenKind::Close,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sub_expression() {
        assert_eq!(
            kinds("{{if (eq a 'b') -1}}"),
            vec![
                TokenKind::Open,
                path("if"),
                TokenKind::LParen,
                path("eq"),
                path("a"),
                TokenKind::String("b".into()),
                TokenKind::RParen,
                TokenKind::Number(-1.0),
                TokenKind::Close,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_undefined_keyword() {
        assert_eq!(
            kinds("{{undefined}}"),
            vec![TokenKind::Open, TokenKind::Undefined, TokenKind::Close, TokenKind::Eof]
        );
    }

    #[test]
    fn test_triple_mustache() {
        assert_eq!(
            kinds("{{{html}}}"),
            vec![
                TokenKind::OpenTriple,
                path("html"),
                TokenKind::CloseTriple,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_block_delimiters() {
        assert_eq!(
            kinds("{{#each items as |item|}}x{{/each}}"),
            vec![
                TokenKind::OpenBlock,
                path("each"),
                path("items"),
                path("as"),
                TokenKind::Pipe,
                path("item"),
                TokenKind::Pipe,
                TokenKind::Close,
                TokenKind::Text("x".into()),
                TokenKind::OpenEndBlock,
                path("each"),
                TokenKind::Close,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"{{t "say \"hi\""}}"#),
            vec![
                TokenKind::Open,
                path("t"),
                TokenKind::String("say \"hi\"".into()),
                TokenKind::Close,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_mustache_comments() {
        assert_eq!(
            kinds("{{! short }}{{!-- has }} inside --}}"),
            vec![
                TokenKind::MustacheComment(" short ".into()),
                TokenKind::MustacheComment(" has }} inside ".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_whitespace_control_ignored() {
        assert_eq!(
            kinds("{{~foo~}}"),
            vec![TokenKind::Open, path("foo"), TokenKind::Close, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_mustache() {
        let err = Scanner::tokenize("{{foo").unwrap_err();
        assert_eq!(err.message, "Unterminated mustache");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Scanner::tokenize("{{t \"abc}}").unwrap_err();
        assert_eq!(err.message, "Unterminated string");
        assert_eq!((err.line, err.column), (1, 5));
    }

    // =========================================================================
    // Tags and attributes
    // =========================================================================

    #[test]
    fn test_element_with_text_attribute() {
        assert_eq!(
            kinds("<div class=\"foo\"></div>"),
            vec![
                TokenKind::TagOpen("div".into()),
                TokenKind::AttrName("class".into()),
                TokenKind::Equals,
                TokenKind::Quote,
                TokenKind::AttrText("foo".into()),
                TokenKind::Quote,
                TokenKind::TagClose,
                TokenKind::EndTagOpen("div".into()),
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_attribute_with_interpolation() {
        assert_eq!(
            kinds("<i class='a {{b}}'>"),
            vec![
                TokenKind::TagOpen("i".into()),
                TokenKind::AttrName("class".into()),
                TokenKind::Equals,
                TokenKind::Quote,
                TokenKind::AttrText("a ".into()),
                TokenKind::Open,
                path("b"),
                TokenKind::Close,
                TokenKind::Quote,
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unquoted_mustache_attribute_and_modifier() {
        assert_eq!(
            kinds("<button disabled={{off}} {{on \"click\" go}} />"),
            vec![
                TokenKind::TagOpen("button".into()),
                TokenKind::AttrName("disabled".into()),
                TokenKind::Equals,
                TokenKind::Open,
                path("off"),
                TokenKind::Close,
                TokenKind::Open,
                path("on"),
                TokenKind::String("click".into()),
                path("go"),
                TokenKind::Close,
                TokenKind::SelfClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_valueless_attribute() {
        assert_eq!(
            kinds("<input disabled>"),
            vec![
                TokenKind::TagOpen("input".into()),
                TokenKind::AttrName("disabled".into()),
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_tag() {
        let err = Scanner::tokenize("<div class=\"x\"").unwrap_err();
        assert_eq!(err.message, "Unterminated tag");
    }

    #[test]
    fn test_empty_end_tag_is_error() {
        let err = Scanner::tokenize("</>").unwrap_err();
        assert_eq!(err.message, "Expected tag name after '</'");
    }

    // =========================================================================
    // Spans
    // =========================================================================

    #[test]
    fn test_spans_track_lines() {
        let toks = Scanner::tokenize("a\n{{b}}").unwrap();
        assert_eq!(toks[1].kind, TokenKind::Open);
        assert_eq!(toks[1].span.line, 2);
        assert_eq!(toks[1].span.column, 1);
        assert_eq!(toks[2].span, Span::new(4, 5, 2, 3));
    }
}
