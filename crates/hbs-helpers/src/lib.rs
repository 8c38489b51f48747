//! Build-time component helpers
//!
//! Rewrites component invocations (`{{my-comp class="x" isActive=flag}}`)
//! into plain elements, merging statically known configuration with the
//! expressions bound at the call site.
//!
//! ```text
//! invocation → ComponentDefinition::build() → Component → to_element() → ElementNode
//!                                                 │
//!                   binding specs → resolve() → Fragment → append_to_attr_content() → AttrValue
//! ```

pub mod binding;
pub mod component;
pub mod expand;
pub mod html;
pub mod interpolate;
pub mod layout;

pub use binding::{
    build_conditional, dasherize, resolve, BindingKind, BindingSources, BindingSpec, Resolution,
    ResolvedBinding, Value,
};
pub use component::{Component, ComponentDefinition, ComponentOptions, ComponentOutput, Invocation};
pub use expand::{expand_template, ComponentExpander};
pub use html::{
    append_to_attr_content, build_attr, build_attr_content, build_attr_value, AppendOptions, Fragment,
};
pub use interpolate::{interpolate_properties, InterpolateOptions};

use hbs_syntax::ParseError;

/// Errors raised while building a component.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    #[error("Components cannot receive tagName hash properties of type {node_type}")]
    InvalidTagName { node_type: String },

    #[error("No attribute binding is declared for property '{property}'")]
    UndeclaredBinding { property: String },

    #[error("Cannot make '{property}' conditional: it interpolates {dynamic} dynamic values, at most 1 is supported")]
    AmbiguousInterpolation { property: String, dynamic: usize },

    #[error("Invalid layout: {0}")]
    Layout(#[from] ParseError),
}
