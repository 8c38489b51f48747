//! WASM bindings for the component helpers.
//!
//! Exposes `transform()` and `print()` to JavaScript via wasm-bindgen.
//! `transform()` returns a JS object `{ template, expanded }` or throws.

use std::collections::BTreeMap;

use hbs_helpers::{expand_template, ComponentDefinition, ComponentError, ComponentOptions, Value};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Component configuration as passed from JavaScript.
///
/// ```js
/// transform(src, "my-button", {
///   tagName: "button",
///   classNames: ["btn"],
///   attributeBindings: ["disabled"],
///   properties: { disabled: false },
/// })
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    pub tag_name: Option<String>,
    pub class_names: Vec<String>,
    pub class_name_bindings: Vec<String>,
    pub attribute_bindings: Vec<String>,
    pub positional_params: Vec<String>,
    pub properties: BTreeMap<String, Option<Scalar>>,
    pub layout: Option<String>,
}

/// A JSON-representable property default. `null` maps to `Value::Null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
}

fn scalar_value(scalar: Option<Scalar>) -> Value {
    match scalar {
        None => Value::Null,
        Some(Scalar::Bool(v)) => Value::Bool(v),
        Some(Scalar::Number(n)) => Value::Number(n),
        Some(Scalar::String(s)) => Value::String(s),
    }
}

impl TransformOptions {
    fn into_component(self) -> Result<(ComponentDefinition, ComponentOptions), ComponentError> {
        let definition = match &self.layout {
            Some(layout) => ComponentDefinition::new().layout(layout)?,
            None => ComponentDefinition::new(),
        };
        let options = ComponentOptions {
            tag_name: self.tag_name,
            class_names: self.class_names,
            class_name_bindings: self.class_name_bindings,
            attribute_bindings: self.attribute_bindings,
            positional_params: self.positional_params,
            properties: self
                .properties
                .into_iter()
                .map(|(key, value)| (key, scalar_value(value)))
                .collect(),
        };
        Ok((definition, options))
    }
}

/// Result of expanding a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub template: String,
    pub expanded: usize,
}

/// The pipeline behind `transform()`, usable without a JS host.
pub fn transform_template(
    source: &str,
    component: &str,
    options: TransformOptions,
) -> Result<TransformOutput, String> {
    let mut template = hbs_syntax::Parser::parse(source).map_err(|e| e.to_string())?;
    let (definition, options) = options.into_component().map_err(|e| e.to_string())?;
    let expanded =
        expand_template(&mut template, component, &definition, &options).map_err(|e| e.to_string())?;
    Ok(TransformOutput {
        template: hbs_syntax::print(&template),
        expanded,
    })
}

/// Expand every invocation of `component` in `source`.
///
/// Returns a JS object with `{ template: string, expanded: number }`.
/// Throws a JS error if parsing, option decoding or expansion fails.
#[wasm_bindgen]
pub fn transform(source: &str, component: &str, options: JsValue) -> Result<JsValue, JsError> {
    let options: TransformOptions = if options.is_undefined() || options.is_null() {
        TransformOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsError::new(&e.to_string()))?
    };

    let output = transform_template(source, component, options).map_err(|e| JsError::new(&e))?;

    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"template".into(), &output.template.into())
        .map_err(|_| JsError::new("Failed to set template property"))?;
    js_sys::Reflect::set(&js_obj, &"expanded".into(), &(output.expanded as f64).into())
        .map_err(|_| JsError::new("Failed to set expanded property"))?;

    Ok(js_obj.into())
}

/// Parse and print a template in normalized form.
#[wasm_bindgen]
pub fn print(source: &str) -> Result<String, JsError> {
    let template = hbs_syntax::Parser::parse(source).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(hbs_syntax::print(&template))
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
