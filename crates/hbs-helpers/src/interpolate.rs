//! `:prop:` interpolation.
//!
//! `interpolate_properties("Hello, :first: :last:", ..)` yields a computed
//! accessor. Static property values are spliced in as text; bound ones turn
//! the result into attribute content with an expression per placeholder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hbs_syntax::ast::{AttrValue, Expression};
use hbs_syntax::builders as b;
use hbs_syntax::printer::format_number;

use crate::binding::Value;
use crate::component::Component;
use crate::html::{build_attr_content, Fragment};
use crate::ComponentError;

/// Receives the component and the resolved value of every placeholder.
pub type InterpolateCallback =
    Arc<dyn Fn(&Component, &BTreeMap<String, Option<Value>>) + Send + Sync>;

#[derive(Clone)]
pub struct InterpolateOptions {
    /// Character delimiting placeholders.
    pub divisor: char,
    /// Omit the whole value when any placeholder is null, false or absent.
    /// Otherwise such placeholders interpolate as nothing.
    pub skip_if_missing: bool,
    /// With exactly one bound placeholder, wrap the result in
    /// `{{if <expr> (concat ..)}}` so it disappears when the expression is
    /// falsy at runtime.
    pub skip_if_missing_dynamic: bool,
    pub on_interpolate: Option<InterpolateCallback>,
}

impl Default for InterpolateOptions {
    fn default() -> Self {
        Self {
            divisor: ':',
            skip_if_missing: true,
            skip_if_missing_dynamic: false,
            on_interpolate: None,
        }
    }
}

impl fmt::Debug for InterpolateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolateOptions")
            .field("divisor", &self.divisor)
            .field("skip_if_missing", &self.skip_if_missing)
            .field("skip_if_missing_dynamic", &self.skip_if_missing_dynamic)
            .field("on_interpolate", &self.on_interpolate.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Build a computed accessor interpolating `pattern`.
pub fn interpolate_properties(
    pattern: &str,
    options: InterpolateOptions,
) -> impl Fn(&Component, &str) -> Result<Option<Value>, ComponentError> + Send + Sync + 'static {
    let interpolation = Interpolation {
        segments: split_pattern(pattern, options.divisor),
        options,
    };
    move |component: &Component, property: &str| interpolation.evaluate(component, property)
}

fn split_pattern(pattern: &str, divisor: char) -> Vec<Segment> {
    let mut pieces: Vec<&str> = pattern.split(divisor).collect();
    // An odd number of divisors leaves the last placeholder unterminated.
    let unterminated = if pieces.len() % 2 == 0 { pieces.pop() } else { None };

    let mut segments = Vec::new();
    for (i, piece) in pieces.into_iter().enumerate() {
        if i % 2 == 0 {
            if !piece.is_empty() {
                segments.push(Segment::Literal(piece.to_string()));
            }
        } else if piece.is_empty() {
            segments.push(Segment::Literal(divisor.to_string()));
        } else {
            segments.push(Segment::Placeholder(piece.to_string()));
        }
    }
    if let Some(rest) = unterminated {
        segments.push(Segment::Literal(format!("{divisor}{rest}")));
    }
    segments
}

struct Interpolation {
    segments: Vec<Segment>,
    options: InterpolateOptions,
}

impl Interpolation {
    fn evaluate(&self, component: &Component, property: &str) -> Result<Option<Value>, ComponentError> {
        let mut values = BTreeMap::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !values.contains_key(name) {
                    values.insert(name.clone(), component.property_value(name)?);
                }
            }
        }

        if let Some(callback) = &self.options.on_interpolate {
            callback(component, &values);
        }

        if self.options.skip_if_missing && values.values().any(|v| is_missing(v.as_ref())) {
            log::trace!(target: "hbs.binding", "{property}: interpolated value missing, skipping");
            return Ok(None);
        }

        if self.options.skip_if_missing_dynamic {
            let dynamic: Vec<&Value> = values.values().flatten().filter(|v| v.is_bound()).collect();
            match dynamic.as_slice() {
                [] => {}
                [value] => return Ok(Some(self.conditional(value.to_expression(), &values))),
                _ => {
                    return Err(ComponentError::AmbiguousInterpolation {
                        property: property.to_string(),
                        dynamic: dynamic.len(),
                    })
                }
            }
        }

        let content = build_attr_content(self.segments.iter().filter_map(|segment| match segment {
            Segment::Literal(text) => Some(Fragment::Text(text.clone())),
            Segment::Placeholder(name) => placeholder_fragment(lookup(&values, name)),
        }));
        Ok(content.map(Value::from))
    }

    /// `{{if <condition> (concat "lit" <expr> "lit")}}`
    fn conditional(&self, condition: Expression, values: &BTreeMap<String, Option<Value>>) -> Value {
        let mut params = Vec::new();
        let mut pending = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => pending.push_str(text),
                Segment::Placeholder(name) => match lookup(values, name) {
                    Some(value) if value.is_bound() => {
                        if !pending.is_empty() {
                            params.push(b::string(std::mem::take(&mut pending)));
                        }
                        params.push(value.to_expression());
                    }
                    other => pending.push_str(&static_text(other).unwrap_or_default()),
                },
            }
        }
        if !pending.is_empty() {
            params.push(b::string(pending));
        }

        let concat = b::sexpr(b::path("concat"), params);
        Value::Content(AttrValue::Mustache(b::mustache(b::path("if"), vec![condition, concat])))
    }
}

fn lookup<'a>(values: &'a BTreeMap<String, Option<Value>>, name: &str) -> Option<&'a Value> {
    values.get(name).and_then(Option::as_ref)
}

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

fn static_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => Some(format_number(*n)),
        Value::String(s) => Some(s.clone()),
        Value::Content(AttrValue::Text(text)) => Some(text.chars.clone()),
        Value::Expr(_) | Value::Content(_) => None,
    }
}

fn placeholder_fragment(value: Option<&Value>) -> Option<Fragment> {
    match value {
        Some(value) if value.is_bound() => value.clone().into_fragment(),
        other => static_text(other).map(Fragment::Text),
    }
}
