//! Template printer.
//!
//! Walks a `Template` and prints it back to template source. Output is
//! normalized: strings are double-quoted, whole numbers print without a
//! fraction, and attribute text escapes `"` as `&quot;`.

use crate::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ConcatPart, ElementModifierStatement, ElementNode,
    Expression, Hash, Literal, MustacheStatement, Statement, Template,
};
use hbs_lexer::is_void_element;

/// Print a template back to source.
pub fn print(template: &Template) -> String {
    let mut out = String::new();
    print_body(&template.body, &mut out);
    out
}

/// Print a single statement.
pub fn print_statement(statement: &Statement) -> String {
    let mut out = String::new();
    print_node(statement, &mut out);
    out
}

/// Print an attribute as it appears inside a start tag: `name="value"`.
pub fn print_attr(attr: &AttrNode) -> String {
    let mut out = String::new();
    write_attr(attr, &mut out);
    out
}

/// Print an expression as it appears inside a mustache.
pub fn print_expression(expr: &Expression) -> String {
    let mut out = String::new();
    write_expression(expr, &mut out);
    out
}

fn print_body(body: &[Statement], out: &mut String) {
    for statement in body {
        print_node(statement, out);
    }
}

fn print_node(statement: &Statement, out: &mut String) {
    match statement {
        Statement::Text(text) => out.push_str(&text.chars.replace("{{", "\\{{")),
        Statement::Mustache(m) => write_mustache(m, out),
        Statement::Block(block) => write_block(block, out),
        Statement::Element(el) => write_element(el, out),
        Statement::Comment(c) => {
            out.push_str("<!--");
            out.push_str(&c.value);
            out.push_str("-->");
        }
        Statement::MustacheComment(c) => {
            if c.value.contains("}}") {
                out.push_str(&format!("{{{{!--{}--}}}}", c.value));
            } else {
                out.push_str(&format!("{{{{!{}}}}}", c.value));
            }
        }
    }
}

fn write_element(el: &ElementNode, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);

    for attr in &el.attributes {
        out.push(' ');
        write_attr(attr, out);
    }

    for modifier in &el.modifiers {
        out.push(' ');
        write_modifier(modifier, out);
    }

    if el.self_closing {
        out.push_str(" />");
        return;
    }
    out.push('>');

    if is_void_element(&el.tag) {
        return;
    }

    print_body(&el.children, out);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn write_attr(attr: &AttrNode, out: &mut String) {
    out.push_str(&attr.name);
    out.push('=');
    match &attr.value {
        AttrValue::Text(text) => {
            out.push('"');
            out.push_str(&escape_attr(&text.chars));
            out.push('"');
        }
        AttrValue::Mustache(m) => write_mustache(m, out),
        AttrValue::Concat(concat) => {
            out.push('"');
            for part in &concat.parts {
                match part {
                    ConcatPart::Text(text) => out.push_str(&escape_attr(&text.chars)),
                    ConcatPart::Mustache(m) => write_mustache(m, out),
                }
            }
            out.push('"');
        }
    }
}

fn write_modifier(modifier: &ElementModifierStatement, out: &mut String) {
    out.push_str("{{");
    write_call(&modifier.path, &modifier.params, &modifier.hash, out);
    out.push_str("}}");
}

fn write_mustache(m: &MustacheStatement, out: &mut String) {
    let (open, close) = if m.trusting { ("{{{", "}}}") } else { ("{{", "}}") };
    out.push_str(open);
    write_call(&m.path, &m.params, &m.hash, out);
    out.push_str(close);
}

fn write_block(block: &BlockStatement, out: &mut String) {
    out.push_str("{{#");
    write_call(&block.path, &block.params, &block.hash, out);
    write_block_params(&block.program, out);
    out.push_str("}}");

    print_body(&block.program.body, out);

    if let Some(inverse) = &block.inverse {
        out.push_str("{{else}}");
        print_body(&inverse.body, out);
    }

    out.push_str("{{/");
    write_expression(&block.path, out);
    out.push_str("}}");
}

fn write_block_params(program: &Block, out: &mut String) {
    if program.block_params.is_empty() {
        return;
    }
    out.push_str(" as |");
    out.push_str(&program.block_params.join(" "));
    out.push('|');
}

/// `path param1 param2 key=value`
fn write_call(path: &Expression, params: &[Expression], hash: &Hash, out: &mut String) {
    write_expression(path, out);
    for param in params {
        out.push(' ');
        write_expression(param, out);
    }
    for pair in &hash.pairs {
        out.push(' ');
        out.push_str(&pair.key);
        out.push('=');
        write_expression(&pair.value, out);
    }
}

fn write_expression(expr: &Expression, out: &mut String) {
    match expr {
        Expression::Path(p) => out.push_str(&p.original),
        Expression::SubExpression(sexpr) => {
            out.push('(');
            write_call(&sexpr.path, &sexpr.params, &sexpr.hash, out);
            out.push(')');
        }
        Expression::Literal(lit) => write_literal(lit, out),
    }
}

fn write_literal(lit: &Literal, out: &mut String) {
    match lit {
        Literal::String(s) => {
            out.push('"');
            out.push_str(&s.replace('\\', "\\\\").replace('"', "\\\""));
            out.push('"');
        }
        Literal::Number(n) => out.push_str(&format_number(*n)),
        Literal::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Null => out.push_str("null"),
        Literal::Undefined => out.push_str("undefined"),
    }
}

/// Format a number the way it reads in source: `1`, `-2`, `0.5`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('"', "&quot;")
}
