//! Attribute content accumulation.
//!
//! Folds heterogeneous fragments into the smallest attribute value that can
//! represent them: a single `Text` while everything is static, a bare
//! `Mustache` for a lone expression, and a `Concat` otherwise. Adjacent
//! literal text is always merged into one part.

use hbs_syntax::ast::{
    AttrNode, AttrValue, ConcatPart, ConcatStatement, Expression, Literal, MustacheStatement,
    PathExpression, SubExpression, TextNode,
};
use hbs_syntax::builders as b;
use hbs_syntax::printer::format_number;

/// One unit of attribute content before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A raw string.
    Text(String),
    /// A raw number.
    Number(f64),
    Literal(Literal),
    Path(PathExpression),
    SubExpression(SubExpression),
    Mustache(MustacheStatement),
    Concat(ConcatStatement),
}

/// Whitespace policy when joining content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOptions {
    /// Separate the new content from existing content with a single space.
    pub prepend_space: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            prepend_space: true,
        }
    }
}

impl AppendOptions {
    pub const RAW: AppendOptions = AppendOptions {
        prepend_space: false,
    };
}

/// A fragment reduced to what accumulation cares about.
enum Piece {
    Nothing,
    Str(String),
    Expr(MustacheStatement),
    Parts(Vec<ConcatPart>),
}

impl Fragment {
    fn into_piece(self) -> Piece {
        match self {
            Fragment::Text(s) => Piece::Str(s),
            Fragment::Number(n) => Piece::Str(format_number(n)),
            Fragment::Literal(lit) => literal_piece(lit),
            Fragment::Path(path) => Piece::Expr(b::mustache(Expression::Path(path), vec![])),
            Fragment::SubExpression(sexpr) => {
                Piece::Expr(b::mustache_with_hash(*sexpr.path, sexpr.params, sexpr.hash))
            }
            Fragment::Mustache(m) => match m.path {
                // {{"bar"}} is just literal text
                Expression::Literal(lit) => literal_piece(lit),
                _ => Piece::Expr(m),
            },
            Fragment::Concat(concat) => Piece::Parts(concat.parts),
        }
    }
}

fn literal_piece(lit: Literal) -> Piece {
    match lit {
        Literal::String(s) => Piece::Str(s),
        Literal::Number(n) => Piece::Str(format_number(n)),
        Literal::Boolean(_) | Literal::Null | Literal::Undefined => Piece::Nothing,
    }
}

/// Append `fragment` to `content`.
///
/// Null, undefined and boolean fragments contribute nothing and return the
/// content unchanged (including an absent one). Composite fragments are
/// appended part by part; only the first part honors `options`.
pub fn append_to_attr_content(
    fragment: impl Into<Fragment>,
    content: Option<AttrValue>,
    options: AppendOptions,
) -> Option<AttrValue> {
    match fragment.into().into_piece() {
        Piece::Nothing => content,
        Piece::Str(s) => Some(append_str(s, content.unwrap_or_else(empty), options)),
        Piece::Expr(m) => Some(append_expr(m, content.unwrap_or_else(empty), options)),
        Piece::Parts(parts) => {
            let mut content = content;
            for (i, part) in parts.into_iter().enumerate() {
                let options = if i == 0 { options } else { AppendOptions::RAW };
                content = append_to_attr_content(part, content, options);
            }
            content
        }
    }
}

/// Fold fragments into attribute content without injecting spaces.
pub fn build_attr_content<I>(fragments: I) -> Option<AttrValue>
where
    I: IntoIterator,
    I::Item: Into<Fragment>,
{
    fragments.into_iter().fold(None, |content, fragment| {
        append_to_attr_content(fragment, content, AppendOptions::RAW)
    })
}

/// Build an attribute from content, or `None` when the attribute should be
/// omitted (no content, `false`, null or undefined).
pub fn build_attr(name: &str, content: Option<Fragment>) -> Option<AttrNode> {
    build_attr_value(content).map(|value| b::attr(name, value))
}

/// The attribute value `build_attr` would use, `true` becoming `""`.
pub fn build_attr_value(content: Option<Fragment>) -> Option<AttrValue> {
    let value = match content? {
        Fragment::Text(s) => AttrValue::Text(b::text(s)),
        Fragment::Number(n) => AttrValue::Text(b::text(format_number(n))),
        Fragment::Literal(Literal::String(s)) => AttrValue::Text(b::text(s)),
        Fragment::Literal(Literal::Number(n)) => AttrValue::Text(b::text(format_number(n))),
        Fragment::Literal(Literal::Boolean(true)) => AttrValue::Text(b::text("")),
        Fragment::Literal(Literal::Boolean(false) | Literal::Null | Literal::Undefined) => {
            return None
        }
        Fragment::Path(path) => AttrValue::Mustache(b::mustache(Expression::Path(path), vec![])),
        Fragment::SubExpression(sexpr) => {
            AttrValue::Mustache(b::mustache_with_hash(*sexpr.path, sexpr.params, sexpr.hash))
        }
        Fragment::Mustache(m) => AttrValue::Mustache(m),
        Fragment::Concat(mut concat) => match concat.parts.len() {
            0 => return None,
            1 => return build_attr_value(concat.parts.pop().map(Fragment::from)),
            _ => AttrValue::Concat(concat),
        },
    };
    Some(value)
}

fn empty() -> AttrValue {
    AttrValue::Text(TextNode::default())
}

fn as_concat(m: MustacheStatement) -> ConcatStatement {
    b::concat(vec![ConcatPart::Mustache(m)])
}

fn append_str(s: String, content: AttrValue, options: AppendOptions) -> AttrValue {
    match content {
        AttrValue::Text(mut text) => {
            if text.chars.is_empty() {
                text.chars = s;
            } else {
                if options.prepend_space {
                    text.chars.push(' ');
                }
                text.chars.push_str(&s);
            }
            AttrValue::Text(text)
        }
        AttrValue::Mustache(m) => append_str(s, AttrValue::Concat(as_concat(m)), options),
        AttrValue::Concat(mut concat) => {
            match concat.parts.last_mut() {
                Some(ConcatPart::Text(text)) => {
                    if options.prepend_space && !text.chars.is_empty() {
                        text.chars.push(' ');
                    }
                    text.chars.push_str(&s);
                }
                Some(ConcatPart::Mustache(_)) if options.prepend_space => {
                    concat.parts.push(ConcatPart::Text(b::text(format!(" {s}"))));
                }
                _ => concat.parts.push(ConcatPart::Text(b::text(s))),
            }
            AttrValue::Concat(concat)
        }
    }
}

fn append_expr(m: MustacheStatement, content: AttrValue, options: AppendOptions) -> AttrValue {
    match content {
        AttrValue::Text(mut text) => {
            if text.chars.is_empty() {
                return AttrValue::Mustache(m);
            }
            if options.prepend_space {
                text.chars.push(' ');
            }
            AttrValue::Concat(b::concat(vec![ConcatPart::Text(text), ConcatPart::Mustache(m)]))
        }
        AttrValue::Mustache(prev) => append_expr(m, AttrValue::Concat(as_concat(prev)), options),
        AttrValue::Concat(mut concat) => {
            if options.prepend_space {
                match concat.parts.last_mut() {
                    Some(ConcatPart::Text(text)) => {
                        if !text.chars.ends_with(char::is_whitespace) {
                            text.chars.push(' ');
                        }
                    }
                    Some(ConcatPart::Mustache(_)) => {
                        concat.parts.push(ConcatPart::Text(b::text(" ")));
                    }
                    None => {}
                }
            }
            concat.parts.push(ConcatPart::Mustache(m));
            AttrValue::Concat(concat)
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Fragment::Text(s.to_string())
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Fragment::Text(s)
    }
}

impl From<f64> for Fragment {
    fn from(n: f64) -> Self {
        Fragment::Number(n)
    }
}

impl From<i64> for Fragment {
    fn from(n: i64) -> Self {
        Fragment::Number(n as f64)
    }
}

impl From<Literal> for Fragment {
    fn from(lit: Literal) -> Self {
        Fragment::Literal(lit)
    }
}

impl From<PathExpression> for Fragment {
    fn from(path: PathExpression) -> Self {
        Fragment::Path(path)
    }
}

impl From<SubExpression> for Fragment {
    fn from(sexpr: SubExpression) -> Self {
        Fragment::SubExpression(sexpr)
    }
}

impl From<Expression> for Fragment {
    fn from(expr: Expression) -> Self {
        match expr {
            Expression::Path(path) => Fragment::Path(path),
            Expression::SubExpression(sexpr) => Fragment::SubExpression(sexpr),
            Expression::Literal(lit) => Fragment::Literal(lit),
        }
    }
}

impl From<TextNode> for Fragment {
    fn from(text: TextNode) -> Self {
        Fragment::Text(text.chars)
    }
}

impl From<MustacheStatement> for Fragment {
    fn from(m: MustacheStatement) -> Self {
        Fragment::Mustache(m)
    }
}

impl From<ConcatStatement> for Fragment {
    fn from(concat: ConcatStatement) -> Self {
        Fragment::Concat(concat)
    }
}

impl From<ConcatPart> for Fragment {
    fn from(part: ConcatPart) -> Self {
        match part {
            ConcatPart::Text(text) => Fragment::Text(text.chars),
            ConcatPart::Mustache(m) => Fragment::Mustache(m),
        }
    }
}

impl From<AttrValue> for Fragment {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Text(text) => Fragment::Text(text.chars),
            AttrValue::Mustache(m) => Fragment::Mustache(m),
            AttrValue::Concat(concat) => Fragment::Concat(concat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbs_syntax::printer::print_attr;
    use pretty_assertions::assert_eq;

    const SPACED: AppendOptions = AppendOptions {
        prepend_space: true,
    };

    fn class(value: Option<AttrValue>) -> String {
        build_attr("class", value.map(Fragment::from))
            .map(|attr| print_attr(&attr))
            .unwrap_or_default()
    }

    fn foo() -> Option<AttrValue> {
        Some(AttrValue::Text(b::text("foo")))
    }

    fn if_condition() -> MustacheStatement {
        b::mustache(b::path("if"), vec![b::path("condition"), b::string("yes"), b::string("no")])
    }

    fn no_adjacent_text(value: &AttrValue) -> bool {
        match value {
            AttrValue::Concat(concat) => concat
                .parts
                .windows(2)
                .all(|w| !matches!((&w[0], &w[1]), (ConcatPart::Text(_), ConcatPart::Text(_)))),
            _ => true,
        }
    }

    // =========================================================================
    // append_to_attr_content
    // =========================================================================

    #[test]
    fn test_append_missing_is_noop() {
        let mut content = foo();
        for missing in [Literal::Null, Literal::Undefined, Literal::Boolean(true)] {
            content = append_to_attr_content(missing, content, SPACED);
        }
        assert_eq!(content, foo());
        assert_eq!(append_to_attr_content(Literal::Null, None, SPACED), None);
    }

    #[test]
    fn test_append_strings() {
        let content = append_to_attr_content("bar", foo(), SPACED);
        let content = append_to_attr_content("baz", content, SPACED);
        assert_eq!(class(content), "class=\"foo bar baz\"");
    }

    #[test]
    fn test_append_string_and_number_literals() {
        let content = append_to_attr_content(Literal::String("bar".into()), foo(), SPACED);
        let content = append_to_attr_content(Literal::Number(1.0), content, SPACED);
        let content = append_to_attr_content(2.0, content, SPACED);
        assert_eq!(class(content), "class=\"foo bar 1 2\"");
    }

    #[test]
    fn test_append_text_nodes() {
        let content = append_to_attr_content(b::text("bar"), foo(), SPACED);
        let content = append_to_attr_content(b::text("baz"), content, SPACED);
        assert_eq!(class(content), "class=\"foo bar baz\"");
    }

    #[test]
    fn test_append_paths() {
        let content = append_to_attr_content(b::path("bar"), foo(), SPACED);
        let content = append_to_attr_content(b::path("baz"), content, SPACED);
        assert_eq!(class(content), "class=\"foo {{bar}} {{baz}}\"");
    }

    #[test]
    fn test_append_mustaches() {
        let content = append_to_attr_content(b::mustache(b::path("bar"), vec![]), foo(), SPACED);
        let content = append_to_attr_content(b::mustache(b::path("baz"), vec![]), content, SPACED);
        let content = append_to_attr_content(if_condition(), content, SPACED);
        assert_eq!(
            class(content),
            "class=\"foo {{bar}} {{baz}} {{if condition \"yes\" \"no\"}}\""
        );
    }

    #[test]
    fn test_append_mustaches_with_literal_paths() {
        let content = append_to_attr_content(b::mustache(b::string("bar"), vec![]), foo(), SPACED);
        let content = append_to_attr_content(b::mustache(b::string("baz"), vec![]), content, SPACED);
        let content = append_to_attr_content(if_condition(), content, SPACED);
        assert_eq!(class(content), "class=\"foo bar baz {{if condition \"yes\" \"no\"}}\"");
    }

    #[test]
    fn test_append_sub_expressions() {
        let helper = b::sexpr(b::path("some-helper"), vec![b::string("someArg")]);
        let content = append_to_attr_content(helper, foo(), SPACED);
        assert_eq!(class(content), "class=\"foo {{some-helper \"someArg\"}}\"");
    }

    #[test]
    fn test_append_concats() {
        let first = b::concat(vec![
            b::text("prefix").into(),
            b::mustache(b::path("boundVal"), vec![]).into(),
            b::text("suffix").into(),
        ]);
        let second = b::concat(vec![
            b::text("prefix2").into(),
            b::mustache(b::path("boundVal2"), vec![]).into(),
        ]);
        let content = append_to_attr_content(first, foo(), SPACED);
        let content = append_to_attr_content(second, content, SPACED);
        assert_eq!(
            class(content),
            "class=\"foo prefix{{boundVal}}suffix prefix2{{boundVal2}}\""
        );
    }

    #[test]
    fn test_single_expression_collapses() {
        let content = append_to_attr_content(b::path("bar"), None, SPACED);
        assert_eq!(content, Some(AttrValue::Mustache(b::mustache(b::path("bar"), vec![]))));
        assert_eq!(class(content), "class={{bar}}");
    }

    #[test]
    fn test_whitespace_policy() {
        let spaced = append_to_attr_content("baz", append_to_attr_content("bar", None, SPACED), SPACED);
        assert_eq!(spaced, Some(AttrValue::Text(b::text("bar baz"))));

        let raw = append_to_attr_content(
            "baz",
            append_to_attr_content("bar", None, AppendOptions::RAW),
            AppendOptions::RAW,
        );
        assert_eq!(raw, Some(AttrValue::Text(b::text("barbaz"))));
    }

    fn mixed_sequence() -> Vec<Fragment> {
        vec![
            b::mustache(b::path("one"), vec![]).into(),
            b::mustache(b::path("two"), vec![]).into(),
            b::text("three").into(),
            "four".into(),
            b::path("five").into(),
            if_condition().into(),
            b::path("six").into(),
            b::concat(vec![b::mustache(b::path("sev"), vec![]).into(), b::text("en").into()]).into(),
        ]
    }

    #[test]
    fn test_mixed_sequence_with_spaces() {
        let content = mixed_sequence()
            .into_iter()
            .fold(None, |content, fragment| append_to_attr_content(fragment, content, SPACED));
        assert!(no_adjacent_text(content.as_ref().unwrap()));
        assert_eq!(
            class(content),
            "class=\"{{one}} {{two}} three four {{five}} {{if condition \"yes\" \"no\"}} {{six}} {{sev}}en\""
        );
    }

    #[test]
    fn test_mixed_sequence_without_spaces() {
        let content = build_attr_content(mixed_sequence());
        assert!(no_adjacent_text(content.as_ref().unwrap()));
        assert_eq!(
            class(content),
            "class=\"{{one}}{{two}}threefour{{five}}{{if condition \"yes\" \"no\"}}{{six}}{{sev}}en\""
        );
    }

    #[test]
    fn test_every_three_fragment_sequence_is_normalized() {
        let samples: Vec<Fragment> = vec![
            "".into(),
            "a".into(),
            b::path("p").into(),
            Fragment::Literal(Literal::Null),
            b::concat(vec![b::text("").into(), b::mustache(b::path("x"), vec![]).into()]).into(),
            b::concat(vec![b::text("lead").into(), b::mustache(b::path("y"), vec![]).into()]).into(),
        ];

        for options in [SPACED, AppendOptions::RAW] {
            for first in &samples {
                for second in &samples {
                    for third in &samples {
                        let content = [first, second, third]
                            .into_iter()
                            .fold(None, |content, fragment| {
                                append_to_attr_content(fragment.clone(), content, options)
                            });
                        let Some(value) = content else { continue };
                        assert!(no_adjacent_text(&value), "{options:?}: {value:?}");
                        if let AttrValue::Concat(concat) = &value {
                            assert!(concat.parts.len() > 1, "{options:?}: {value:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_literal_run_merges_after_expressions() {
        let fragments: Vec<Fragment> = vec![
            b::path("one").into(),
            b::path("two").into(),
            "three".into(),
            "four".into(),
            b::path("five").into(),
        ];
        let content = fragments
            .into_iter()
            .fold(None, |content, fragment| append_to_attr_content(fragment, content, SPACED))
            .unwrap();
        let AttrValue::Concat(concat) = &content else {
            panic!("expected concat");
        };
        assert_eq!(
            concat.parts,
            vec![
                b::mustache(b::path("one"), vec![]).into(),
                b::text(" ").into(),
                b::mustache(b::path("two"), vec![]).into(),
                b::text(" three four ").into(),
                b::mustache(b::path("five"), vec![]).into(),
            ]
        );
    }

    // =========================================================================
    // build_attr_content
    // =========================================================================

    #[test]
    fn test_build_attr_content_mixed() {
        let fragments: Vec<Fragment> = vec![
            "rawstring".into(),
            1i64.into(),
            Literal::String("StringLiteral".into()).into(),
            Literal::Number(2.0).into(),
            Literal::Undefined.into(),
            Literal::Null.into(),
            b::path("Path").into(),
            b::text("TextNode").into(),
            b::sexpr(b::path("concat"), vec![b::path("firstName"), b::path("lastName")]).into(),
        ];
        let content = build_attr_content(fragments);
        assert!(matches!(content, Some(AttrValue::Concat(_))));
        assert_eq!(
            class(content),
            "class=\"rawstring1StringLiteral2{{Path}}TextNode{{concat firstName lastName}}\""
        );
    }

    #[test]
    fn test_build_attr_content_static_stays_text() {
        let fragments: Vec<Fragment> = vec![
            "rawstring".into(),
            1i64.into(),
            Literal::Undefined.into(),
            b::text("TextNode").into(),
            Literal::Null.into(),
            "LastString".into(),
        ];
        assert_eq!(
            build_attr_content(fragments),
            Some(AttrValue::Text(b::text("rawstring1TextNodeLastString")))
        );
    }

    #[test]
    fn test_build_attr_content_empty() {
        assert_eq!(build_attr_content(Vec::<Fragment>::new()), None);
    }

    // =========================================================================
    // build_attr
    // =========================================================================

    fn built(content: impl Into<Fragment>) -> String {
        build_attr("not-class", Some(content.into()))
            .map(|attr| print_attr(&attr))
            .unwrap_or_default()
    }

    #[test]
    fn test_build_attr_static_values() {
        assert_eq!(built("new content"), "not-class=\"new content\"");
        assert_eq!(built(b::text("new content")), "not-class=\"new content\"");
        assert_eq!(built(Literal::String("new content".into())), "not-class=\"new content\"");
        assert_eq!(built(Literal::Number(2.0)), "not-class=\"2\"");
    }

    #[test]
    fn test_build_attr_booleans() {
        assert_eq!(built(Literal::Boolean(true)), "not-class=\"\"");
        assert_eq!(build_attr("not-class", Some(Literal::Boolean(false).into())), None);
        assert_eq!(build_attr("not-class", Some(Literal::Null.into())), None);
        assert_eq!(build_attr("not-class", None), None);
    }

    #[test]
    fn test_build_attr_expressions() {
        assert_eq!(built(b::path("boundValue")), "not-class={{boundValue}}");
        let sexpr = b::sexpr_with_hash(
            b::path("concat"),
            vec![b::string("a"), b::string("b")],
            b::hash(vec![b::pair("foo", b::path("bar"))]),
        );
        assert_eq!(built(sexpr), "not-class={{concat \"a\" \"b\" foo=bar}}");
    }

    #[test]
    fn test_build_attr_unwraps_single_part_concat() {
        let condition = b::mustache(b::path("if"), vec![b::path("cond"), b::string("yes"), b::string("no")]);
        assert_eq!(
            built(b::concat(vec![condition.into()])),
            "not-class={{if cond \"yes\" \"no\"}}"
        );
    }
}
