//! Template-wide component expansion.

use hbs_syntax::ast::{BlockStatement, MustacheStatement, Statement, Template};
use hbs_syntax::{traverse, Action, Visitor};

use crate::component::{ComponentDefinition, ComponentOptions, Invocation};
use crate::ComponentError;

/// Replaces every invocation of one component name with its output.
pub struct ComponentExpander<'a> {
    name: &'a str,
    definition: &'a ComponentDefinition,
    options: &'a ComponentOptions,
    expanded: usize,
}

impl<'a> ComponentExpander<'a> {
    pub fn new(name: &'a str, definition: &'a ComponentDefinition, options: &'a ComponentOptions) -> Self {
        Self {
            name,
            definition,
            options,
            expanded: 0,
        }
    }

    /// Number of invocations expanded so far.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    fn expand(&mut self, invocation: Invocation) -> Result<Action<Statement>, ComponentError> {
        let component = self.definition.build(invocation, self.options.clone());
        let statements = component.to_element()?.into_statements();
        self.expanded += 1;
        Ok(Action::Replace(statements))
    }
}

impl Visitor for ComponentExpander<'_> {
    type Error = ComponentError;

    fn mustache_statement(
        &mut self,
        node: &mut MustacheStatement,
    ) -> Result<Action<Statement>, ComponentError> {
        if node.path.as_path() != Some(self.name) {
            return Ok(Action::Keep);
        }
        self.expand(Invocation::Mustache(node.clone()))
    }

    fn block_statement(
        &mut self,
        node: &mut BlockStatement,
    ) -> Result<Action<Statement>, ComponentError> {
        if node.path.as_path() != Some(self.name) {
            return Ok(Action::Keep);
        }
        self.expand(Invocation::Block(node.clone()))
    }
}

/// Expand every `name` invocation in `template`, returning how many were
/// replaced. On error `template` is left as it was.
pub fn expand_template(
    template: &mut Template,
    name: &str,
    definition: &ComponentDefinition,
    options: &ComponentOptions,
) -> Result<usize, ComponentError> {
    let mut expander = ComponentExpander::new(name, definition, options);
    let mut expanded = template.clone();
    traverse(&mut expanded, &mut expander)?;
    *template = expanded;
    log::debug!(target: "hbs.component", "expanded {} invocation(s) of {}", expander.expanded(), name);
    Ok(expander.expanded())
}

/// Parse, expand and print in one go.
#[cfg(test)]
pub(crate) fn process_template(
    source: &str,
    name: &str,
    definition: &ComponentDefinition,
    options: &ComponentOptions,
) -> Result<String, ComponentError> {
    let mut template = hbs_syntax::Parser::parse(source)?;
    expand_template(&mut template, name, definition, options)?;
    Ok(hbs_syntax::print(&template))
}
