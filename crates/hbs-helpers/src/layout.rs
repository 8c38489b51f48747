//! Layout inlining.
//!
//! A layout is a sub-template emitted as the component's children. It is
//! rewritten in two passes:
//!
//! 1. `substitute` replaces bare `{{prop}}` mustaches (in statement,
//!    attribute and concat position) and path arguments of helpers with the
//!    component's resolved property values.
//! 2. `splice` resolves `{{#if hasBlock}}` against the invocation and
//!    replaces `{{yield}}` with the caller's block.

use hbs_syntax::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ConcatPart, ConcatStatement, Expression, Hash,
    MustacheStatement, Statement, Template,
};
use hbs_syntax::builders as b;
use hbs_syntax::{traverse, Action, Visitor};

use crate::binding::Value;
use crate::component::Component;
use crate::html::{build_attr_content, build_attr_value, Fragment};
use crate::ComponentError;

const YIELD: &str = "yield";
const HAS_BLOCK: &str = "hasBlock";

/// Inline `layout` for `component`, returning the resulting statements.
pub(crate) fn inline(
    component: &Component,
    mut layout: Template,
    block: Option<&Block>,
) -> Result<Vec<Statement>, ComponentError> {
    substitute(&mut layout, component)?;
    splice(&mut layout, block);
    Ok(layout.body)
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Replace property references in `layout` with the component's values.
///
/// Paths are only substituted when they name a plain property: no dots, no
/// `@` or `this` prefix, and not a block parameter in scope. Missing values
/// remove the mustache (or the attribute it makes up).
pub fn substitute(layout: &mut Template, component: &Component) -> Result<(), ComponentError> {
    Substitution {
        component,
        locals: Vec::new(),
    }
    .body(&mut layout.body)
}

struct Substitution<'a> {
    component: &'a Component,
    /// Block parameters of enclosing blocks.
    locals: Vec<String>,
}

impl Substitution<'_> {
    fn body(&mut self, body: &mut Vec<Statement>) -> Result<(), ComponentError> {
        let mut out = Vec::with_capacity(body.len());
        for mut statement in std::mem::take(body) {
            match &mut statement {
                Statement::Mustache(m) if m.is_bare_path() => {
                    if let Some(property) = self.property(&m.path) {
                        let value = self.component.property_value(property)?;
                        log::trace!(target: "hbs.layout", "{{{{{property}}}}} -> {value:?}");
                        let trusting = m.trusting;
                        out.extend(statements(inline_fragment(value)).into_iter().map(
                            |mut statement| {
                                if let Statement::Mustache(m) = &mut statement {
                                    m.trusting = trusting;
                                }
                                statement
                            },
                        ));
                        continue;
                    }
                }
                Statement::Mustache(m) => self.arguments(&mut m.params, &mut m.hash)?,
                Statement::Block(block) => self.block(block)?,
                Statement::Element(el) => {
                    for modifier in &mut el.modifiers {
                        self.arguments(&mut modifier.params, &mut modifier.hash)?;
                    }
                    el.attributes = self.attributes(std::mem::take(&mut el.attributes))?;
                    self.body(&mut el.children)?;
                }
                _ => {}
            }
            out.push(statement);
        }
        *body = merge_text(out);
        Ok(())
    }

    fn block(&mut self, block: &mut BlockStatement) -> Result<(), ComponentError> {
        self.arguments(&mut block.params, &mut block.hash)?;

        let depth = self.locals.len();
        self.locals.extend(block.program.block_params.iter().cloned());
        let result = self.body(&mut block.program.body);
        self.locals.truncate(depth);
        result?;

        if let Some(inverse) = &mut block.inverse {
            self.body(&mut inverse.body)?;
        }
        Ok(())
    }

    fn attributes(&self, attributes: Vec<AttrNode>) -> Result<Vec<AttrNode>, ComponentError> {
        let mut out = Vec::with_capacity(attributes.len());
        for AttrNode { name, value } in attributes {
            let value = match value {
                AttrValue::Text(text) => Some(AttrValue::Text(text)),
                AttrValue::Mustache(m) => self.attr_mustache(m)?,
                AttrValue::Concat(concat) => self.attr_concat(concat)?,
            };
            match value {
                Some(value) => out.push(b::attr(name, value)),
                None => log::trace!(target: "hbs.layout", "dropping attribute {name}"),
            }
        }
        Ok(out)
    }

    /// `name={{prop}}` takes the value as a whole attribute would.
    fn attr_mustache(&self, mut m: MustacheStatement) -> Result<Option<AttrValue>, ComponentError> {
        if m.is_bare_path() {
            if let Some(property) = self.property(&m.path) {
                let value = self.component.property_value(property)?;
                return Ok(build_attr_value(value.and_then(Value::into_fragment)));
            }
        }
        self.arguments(&mut m.params, &mut m.hash)?;
        Ok(Some(AttrValue::Mustache(m)))
    }

    fn attr_concat(&self, concat: ConcatStatement) -> Result<Option<AttrValue>, ComponentError> {
        let mut fragments = Vec::with_capacity(concat.parts.len());
        for part in concat.parts {
            match part {
                ConcatPart::Text(text) => fragments.push(Fragment::Text(text.chars)),
                ConcatPart::Mustache(mut m) => {
                    if m.is_bare_path() {
                        if let Some(property) = self.property(&m.path) {
                            let value = self.component.property_value(property)?;
                            fragments.extend(inline_fragment(value));
                            continue;
                        }
                    }
                    self.arguments(&mut m.params, &mut m.hash)?;
                    fragments.push(Fragment::Mustache(m));
                }
            }
        }
        Ok(build_attr_value(build_attr_content(fragments).map(Fragment::from)))
    }

    fn arguments(&self, params: &mut [Expression], hash: &mut Hash) -> Result<(), ComponentError> {
        for param in params.iter_mut() {
            self.expression(param)?;
        }
        for pair in &mut hash.pairs {
            self.expression(&mut pair.value)?;
        }
        Ok(())
    }

    fn expression(&self, expr: &mut Expression) -> Result<(), ComponentError> {
        if let Expression::SubExpression(sexpr) = expr {
            return self.arguments(&mut sexpr.params, &mut sexpr.hash);
        }
        if let Some(property) = self.property(expr) {
            let value = self.component.property_value(property)?;
            *expr = value.map_or_else(b::undefined, |value| value.to_expression());
        }
        Ok(())
    }

    fn property<'e>(&self, expr: &'e Expression) -> Option<&'e str> {
        let name = expr.as_path()?;
        let plain = !name.contains('.')
            && !name.starts_with('@')
            && name != "this"
            && name != YIELD
            && name != HAS_BLOCK;
        (plain && !self.locals.iter().any(|local| local == name)).then_some(name)
    }
}

/// A substituted value as content. `false` and null contribute nothing;
/// `true` renders as text.
fn inline_fragment(value: Option<Value>) -> Option<Fragment> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(Fragment::Text("true".to_string())),
        other => other.into_fragment(),
    }
}

fn statements(fragment: Option<Fragment>) -> Vec<Statement> {
    match build_attr_content(fragment) {
        None => Vec::new(),
        Some(AttrValue::Text(text)) if text.chars.is_empty() => Vec::new(),
        Some(AttrValue::Text(text)) => vec![text.into()],
        Some(AttrValue::Mustache(m)) => vec![m.into()],
        Some(AttrValue::Concat(concat)) => concat
            .parts
            .into_iter()
            .map(|part| match part {
                ConcatPart::Text(text) => text.into(),
                ConcatPart::Mustache(m) => m.into(),
            })
            .collect(),
    }
}

fn merge_text(body: Vec<Statement>) -> Vec<Statement> {
    let mut out: Vec<Statement> = Vec::with_capacity(body.len());
    for statement in body {
        if let (Some(Statement::Text(prev)), Statement::Text(next)) = (out.last_mut(), &statement) {
            prev.chars.push_str(&next.chars);
            continue;
        }
        out.push(statement);
    }
    out
}

// ---------------------------------------------------------------------------
// Splicing
// ---------------------------------------------------------------------------

/// Resolve `hasBlock` conditionals and replace `{{yield}}` with `block`'s
/// body, or drop it when there is no block.
pub fn splice(layout: &mut Template, block: Option<&Block>) {
    let mut has_block = HasBlock(block.is_some());
    match traverse(layout, &mut has_block) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    splice_yield(&mut layout.body, block);
}

/// Collapses `{{#if hasBlock}}` and `{{#unless hasBlock}}`.
struct HasBlock(bool);

impl Visitor for HasBlock {
    type Error = std::convert::Infallible;

    fn block_statement(&mut self, node: &mut BlockStatement) -> Result<Action<Statement>, Self::Error> {
        let negate = match node.path_name() {
            Some("if") => false,
            Some("unless") => true,
            _ => return Ok(Action::Keep),
        };
        if node.params.first().and_then(Expression::as_path) != Some(HAS_BLOCK) {
            return Ok(Action::Keep);
        }

        let branch = if self.0 != negate {
            Some(std::mem::take(&mut node.program.body))
        } else {
            node.inverse.take().map(|inverse| inverse.body)
        };
        log::trace!(target: "hbs.layout", "hasBlock={} in {{{{#{}}}}}", self.0, node.path_name().unwrap_or_default());
        Ok(match branch {
            Some(body) => Action::Replace(body),
            None => Action::Remove,
        })
    }
}

/// Caller content is inserted as-is and never searched for further yields.
fn splice_yield(body: &mut Vec<Statement>, block: Option<&Block>) {
    for mut statement in std::mem::take(body) {
        match &mut statement {
            Statement::Mustache(m) if m.path.as_path() == Some(YIELD) => {
                if let Some(block) = block {
                    body.extend(block.body.iter().cloned());
                }
                continue;
            }
            Statement::Element(el) => splice_yield(&mut el.children, block),
            Statement::Block(inner) => {
                splice_yield(&mut inner.program.body, block);
                if let Some(inverse) = &mut inner.inverse {
                    splice_yield(&mut inverse.body, block);
                }
            }
            _ => {}
        }
        body.push(statement);
    }
}
