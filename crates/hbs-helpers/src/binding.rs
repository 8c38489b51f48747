//! Binding resolution.
//!
//! A binding declaration (`prop[:target][:truthy[:falsy]]` for attributes,
//! `prop[:truthy[:falsy]]` for classes) names a component property. The
//! resolver picks the property's value from the candidate sources and
//! decides whether the binding is boolean-flavored (presence maps to a class
//! name or attribute value) or a passthrough.

use hbs_syntax::ast::{AttrValue, ConcatPart, Expression, Literal, MustacheStatement};
use hbs_syntax::builders as b;

use crate::html::Fragment;

/// Which kind of declaration a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Attribute,
    Class,
}

/// A parsed binding declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    pub kind: BindingKind,
    pub property: String,
    /// Attribute name (attribute bindings only).
    pub target: Option<String>,
    pub truthy: Option<String>,
    pub falsy: Option<String>,
    segments: usize,
}

impl BindingSpec {
    /// Parse `prop[:attr-name[:truthy[:falsy]]]`.
    pub fn attribute(declaration: &str) -> Self {
        let mut parts = declaration.split(':');
        let property = parts.next().unwrap_or_default().to_string();
        let target = parts.next().and_then(non_empty);
        let truthy = parts.next().and_then(non_empty);
        let falsy = parts.next().and_then(non_empty);
        Self {
            kind: BindingKind::Attribute,
            property,
            target,
            truthy,
            falsy,
            segments: declaration.split(':').count(),
        }
    }

    /// Parse `prop[:truthy[:falsy]]`.
    pub fn class(declaration: &str) -> Self {
        let mut parts = declaration.split(':');
        let property = parts.next().unwrap_or_default().to_string();
        let truthy = parts.next().and_then(non_empty);
        let falsy = parts.next().and_then(non_empty);
        Self {
            kind: BindingKind::Class,
            property,
            target: None,
            truthy,
            falsy,
            segments: declaration.split(':').count(),
        }
    }

    /// The attribute an attribute binding writes to.
    pub fn target_name(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.property)
    }

    /// True when the declaration itself carries a truthy value slot.
    pub fn declares_truthy(&self) -> bool {
        match self.kind {
            BindingKind::Attribute => self.segments > 2,
            BindingKind::Class => self.segments > 1,
        }
    }

    /// The value emitted for a truthy boolean binding.
    pub fn truthy_value(&self) -> String {
        match (&self.truthy, self.kind) {
            (Some(truthy), _) => truthy.clone(),
            (None, BindingKind::Class) => dasherize(&self.property),
            (None, BindingKind::Attribute) => "true".to_string(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A property value, known statically or bound to an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A path or sub-expression resolved at runtime.
    Expr(Expression),
    /// Attribute content produced by a computed accessor.
    Content(AttrValue),
}

/// How a value behaves in a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Truthiness {
    Static(bool),
    Dynamic(Expression),
}

impl Value {
    /// Convert an expression passed at the call site. Literals become
    /// primitives; paths and sub-expressions stay bound.
    pub fn from_expression(expr: &Expression) -> Self {
        match expr {
            Expression::Literal(Literal::String(s)) => Value::String(s.clone()),
            Expression::Literal(Literal::Number(n)) => Value::Number(*n),
            Expression::Literal(Literal::Boolean(v)) => Value::Bool(*v),
            Expression::Literal(Literal::Null | Literal::Undefined) => Value::Null,
            other => Value::Expr(other.clone()),
        }
    }

    pub fn is_bound(&self) -> bool {
        match self {
            Value::Expr(_) => true,
            Value::Content(content) => !matches!(content, AttrValue::Text(_)),
            _ => false,
        }
    }

    pub fn truthiness(&self) -> Truthiness {
        match self {
            Value::Null => Truthiness::Static(false),
            Value::Bool(v) => Truthiness::Static(*v),
            Value::Number(n) => Truthiness::Static(*n != 0.0 && !n.is_nan()),
            Value::String(s) => Truthiness::Static(!s.is_empty()),
            Value::Content(AttrValue::Text(text)) => Truthiness::Static(!text.chars.is_empty()),
            _ => Truthiness::Dynamic(self.to_expression()),
        }
    }

    /// The value as a single expression, usable as a helper argument.
    pub fn to_expression(&self) -> Expression {
        match self {
            Value::Null => b::null(),
            Value::Bool(v) => b::boolean(*v),
            Value::Number(n) => b::number(*n),
            Value::String(s) => b::string(s.clone()),
            Value::Expr(expr) => expr.clone(),
            Value::Content(AttrValue::Text(text)) => b::string(text.chars.clone()),
            Value::Content(AttrValue::Mustache(m)) => mustache_expression(m),
            Value::Content(AttrValue::Concat(concat)) => {
                let params = concat
                    .parts
                    .iter()
                    .map(|part| match part {
                        ConcatPart::Text(text) => b::string(text.chars.clone()),
                        ConcatPart::Mustache(m) => mustache_expression(m),
                    })
                    .collect();
                b::sexpr(b::path("concat"), params)
            }
        }
    }

    /// The value as attribute content, `None` for null.
    pub fn into_fragment(self) -> Option<Fragment> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(Fragment::Literal(Literal::Boolean(v))),
            Value::Number(n) => Some(Fragment::Number(n)),
            Value::String(s) => Some(Fragment::Text(s)),
            Value::Expr(expr) => Some(expr.into()),
            Value::Content(content) => Some(content.into()),
        }
    }
}

/// `{{path}}` is `path`; `{{helper a b}}` is `(helper a b)`.
fn mustache_expression(m: &MustacheStatement) -> Expression {
    if m.params.is_empty() && m.hash.is_empty() {
        m.path.clone()
    } else {
        b::sexpr_with_hash(m.path.clone(), m.params.clone(), m.hash.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        Value::from_expression(&expr)
    }
}

impl From<AttrValue> for Value {
    fn from(content: AttrValue) -> Self {
        match content {
            AttrValue::Text(text) => Value::String(text.chars),
            other => Value::Content(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Candidate sources for one property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingSources {
    /// Result of a registered computed accessor. `Some(None)` means the
    /// accessor exists and produced nothing.
    pub computed: Option<Option<Value>>,
    /// The value passed at the call site.
    pub invocation: Option<Value>,
    /// The configured default.
    pub static_default: Option<Value>,
}

impl BindingSources {
    /// The winning value: computed, then invocation, then static default.
    pub fn value(&self) -> Option<&Value> {
        match &self.computed {
            Some(computed) => computed.as_ref(),
            None => self.invocation.as_ref().or(self.static_default.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Missing,
    Literal(Value),
    Bound(Value),
}

/// A resolved binding and its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding {
    pub resolution: Resolution,
    pub is_boolean: bool,
}

/// Resolve `spec` against its sources.
pub fn resolve(spec: &BindingSpec, sources: &BindingSources) -> ResolvedBinding {
    let is_boolean = spec.declares_truthy()
        || match &sources.computed {
            Some(computed) => matches!(computed, Some(Value::Bool(_))),
            None => {
                (sources.static_default.is_none()
                    && matches!(sources.invocation, Some(Value::Bool(_))))
                    || matches!(sources.static_default, Some(Value::Bool(_)))
            }
        };

    let resolution = match sources.value() {
        None => Resolution::Missing,
        Some(value) if value.is_bound() => Resolution::Bound(value.clone()),
        Some(value) => Resolution::Literal(value.clone()),
    };

    log::trace!(
        target: "hbs.binding",
        "{} resolved to {:?} (boolean: {})",
        spec.property,
        resolution,
        is_boolean
    );

    ResolvedBinding {
        resolution,
        is_boolean,
    }
}

impl ResolvedBinding {
    /// The content this binding contributes, or `None` when it is omitted.
    pub fn into_fragment(self, spec: &BindingSpec) -> Option<Fragment> {
        let value = match self.resolution {
            Resolution::Missing => return None,
            Resolution::Literal(value) | Resolution::Bound(value) => value,
        };

        if !self.is_boolean {
            return value.into_fragment();
        }

        let truthy = spec.truthy_value();
        match value.truthiness() {
            Truthiness::Static(true) => Some(Fragment::Text(truthy)),
            Truthiness::Static(false) => spec.falsy.clone().map(Fragment::Text),
            Truthiness::Dynamic(cond) => Some(Fragment::Mustache(build_conditional(
                cond,
                &truthy,
                spec.falsy.as_deref(),
            ))),
        }
    }
}

/// `{{if cond "truthy" "falsy"}}`, without the falsy branch when unset.
pub fn build_conditional(cond: Expression, truthy: &str, falsy: Option<&str>) -> MustacheStatement {
    let mut params = vec![cond, b::string(truthy)];
    if let Some(falsy) = falsy {
        params.push(b::string(falsy));
    }
    b::mustache(b::path("if"), params)
}

/// `isActive` → `is-active`. Runs of non-word characters become a single
/// hyphen; leading and trailing hyphens are dropped.
pub fn dasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            if (pending_hyphen || (prev_lower && c.is_uppercase())) && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(c.to_lowercase());
            prev_lower = c.is_lowercase();
        } else {
            pending_hyphen = true;
            prev_lower = false;
        }
    }
    out
}
