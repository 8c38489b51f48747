//! Tree traversal.
//!
//! A `Visitor` gets a callback per matched node type and answers with an
//! `Action`. Hooks may edit the node in place and keep it; kept nodes have
//! their children visited afterwards. Replacement nodes are visited in
//! turn, so a visitor must not replace a node with one it would match again.

use crate::ast::{AttrNode, Block, BlockStatement, ElementNode, MustacheStatement, Statement, Template};

/// What to do with a visited node.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
    Keep,
    Remove,
    Replace(Vec<T>),
}

/// Per-node callbacks. Every hook defaults to a no-op.
pub trait Visitor {
    type Error;

    fn mustache_statement(
        &mut self,
        _node: &mut MustacheStatement,
    ) -> Result<Action<Statement>, Self::Error> {
        Ok(Action::Keep)
    }

    fn block_statement(
        &mut self,
        _node: &mut BlockStatement,
    ) -> Result<Action<Statement>, Self::Error> {
        Ok(Action::Keep)
    }

    /// Called before the element's attributes and children are visited.
    fn element_node(&mut self, _node: &mut ElementNode) -> Result<(), Self::Error> {
        Ok(())
    }

    fn attr_node(&mut self, _node: &mut AttrNode) -> Result<Action<AttrNode>, Self::Error> {
        Ok(Action::Keep)
    }
}

/// Visit every statement of a template. A visitor error stops the walk and
/// leaves the template partially visited.
pub fn traverse<V: Visitor>(template: &mut Template, visitor: &mut V) -> Result<(), V::Error> {
    visit_body(&mut template.body, visitor)
}

/// Visit every statement of a block body.
pub fn traverse_block<V: Visitor>(block: &mut Block, visitor: &mut V) -> Result<(), V::Error> {
    visit_body(&mut block.body, visitor)
}

fn visit_body<V: Visitor>(body: &mut Vec<Statement>, visitor: &mut V) -> Result<(), V::Error> {
    let statements = std::mem::take(body);
    for statement in statements {
        visit_statement(statement, visitor, body)?;
    }
    Ok(())
}

fn visit_statement<V: Visitor>(
    mut statement: Statement,
    visitor: &mut V,
    out: &mut Vec<Statement>,
) -> Result<(), V::Error> {
    let action = match &mut statement {
        Statement::Mustache(m) => visitor.mustache_statement(m)?,
        Statement::Block(block) => visitor.block_statement(block)?,
        Statement::Element(el) => {
            visitor.element_node(el)?;
            Action::Keep
        }
        _ => Action::Keep,
    };

    match action {
        Action::Keep => {
            visit_children(&mut statement, visitor)?;
            out.push(statement);
        }
        Action::Remove => {}
        Action::Replace(replacements) => {
            for replacement in replacements {
                visit_statement(replacement, visitor, out)?;
            }
        }
    }
    Ok(())
}

fn visit_children<V: Visitor>(statement: &mut Statement, visitor: &mut V) -> Result<(), V::Error> {
    match statement {
        Statement::Block(block) => {
            visit_body(&mut block.program.body, visitor)?;
            if let Some(inverse) = &mut block.inverse {
                visit_body(&mut inverse.body, visitor)?;
            }
        }
        Statement::Element(el) => {
            visit_attributes(&mut el.attributes, visitor)?;
            visit_body(&mut el.children, visitor)?;
        }
        _ => {}
    }
    Ok(())
}

fn visit_attributes<V: Visitor>(attributes: &mut Vec<AttrNode>, visitor: &mut V) -> Result<(), V::Error> {
    for mut attr in std::mem::take(attributes) {
        match visitor.attr_node(&mut attr)? {
            Action::Keep => attributes.push(attr),
            Action::Remove => {}
            Action::Replace(replacements) => attributes.extend(replacements),
        }
    }
    Ok(())
}
