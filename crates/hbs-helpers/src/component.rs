//! Build-time components.
//!
//! A `ComponentDefinition` describes how an invocation becomes an element:
//! its tag, static class names, class and attribute bindings, positional
//! parameter names, defaults, computed accessors, and an optional layout.
//! `build()` pairs it with one invocation node and per-invocation options,
//! producing a `Component` that derives the element on demand.
//!
//! ```text
//! {{my-comp class="extra" isActive=flag}}
//!   → <div class="foo bar {{if flag "is-active"}} extra"></div>
//! ```

use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hbs_syntax::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ElementModifierStatement, ElementNode, Expression,
    Hash, Literal, MustacheStatement, Statement, Template,
};
use hbs_syntax::builders as b;
use hbs_syntax::Parser;

use crate::binding::{resolve, BindingSources, BindingSpec, Value};
use crate::html::{append_to_attr_content, build_attr, AppendOptions};
use crate::{layout, ComponentError};

/// A computed accessor: receives the component and the property name.
pub type Computed =
    Arc<dyn Fn(&Component, &str) -> Result<Option<Value>, ComponentError> + Send + Sync>;

/// Runs over a copy of the invocation's block before it becomes children.
pub type ContentTransform = Arc<dyn Fn(&mut Block) -> Result<(), ComponentError> + Send + Sync>;

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Reusable component configuration.
#[derive(Clone)]
pub struct ComponentDefinition {
    tag_name: String,
    class_names: Vec<String>,
    class_name_bindings: Vec<String>,
    attribute_bindings: Vec<String>,
    positional_params: Vec<String>,
    properties: BTreeMap<String, Value>,
    computed: BTreeMap<String, Computed>,
    content_transform: Option<ContentTransform>,
    layout: Option<Template>,
}

impl Default for ComponentDefinition {
    fn default() -> Self {
        let mut computed: BTreeMap<String, Computed> = BTreeMap::new();
        computed.insert("class".to_string(), Arc::new(class_accessor));

        Self {
            tag_name: "div".to_string(),
            class_names: Vec::new(),
            class_name_bindings: Vec::new(),
            attribute_bindings: vec!["id".to_string(), "class".to_string()],
            positional_params: Vec::new(),
            properties: BTreeMap::new(),
            computed,
            content_transform: None,
            layout: None,
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("tag_name", &self.tag_name)
            .field("class_names", &self.class_names)
            .field("class_name_bindings", &self.class_name_bindings)
            .field("attribute_bindings", &self.attribute_bindings)
            .field("positional_params", &self.positional_params)
            .field("properties", &self.properties)
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field("layout", &self.layout.is_some())
            .finish()
    }
}

impl ComponentDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a parent definition. List settings added afterwards are
    /// appended to the parent's lists.
    pub fn extend(parent: &ComponentDefinition) -> Self {
        parent.clone()
    }

    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn class_name_bindings<I, S>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_name_bindings.extend(bindings.into_iter().map(Into::into));
        self
    }

    pub fn attribute_bindings<I, S>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_bindings.extend(bindings.into_iter().map(Into::into));
        self
    }

    pub fn positional_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positional_params.extend(names.into_iter().map(Into::into));
        self
    }

    /// A default value for a property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Register a computed accessor. It overrides every other source for
    /// `name`, except while it is itself being evaluated.
    pub fn computed<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Component, &str) -> Result<Option<Value>, ComponentError> + Send + Sync + 'static,
    {
        self.computed.insert(name.into(), Arc::new(accessor));
        self
    }

    pub fn content_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&mut Block) -> Result<(), ComponentError> + Send + Sync + 'static,
    {
        self.content_transform = Some(Arc::new(transform));
        self
    }

    /// Inline a sub-template as the element's children.
    pub fn layout(mut self, source: &str) -> Result<Self, ComponentError> {
        self.layout = Some(Parser::parse(source)?);
        Ok(self)
    }

    /// Pair this definition with an invocation.
    pub fn build(&self, node: impl Into<Invocation>, options: ComponentOptions) -> Component {
        Component {
            definition: self.clone(),
            node: node.into(),
            options,
            attrs: OnceCell::new(),
            computing: RefCell::new(Vec::new()),
        }
    }
}

/// Per-invocation overrides. Lists are appended to the definition's lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentOptions {
    pub tag_name: Option<String>,
    pub class_names: Vec<String>,
    pub class_name_bindings: Vec<String>,
    pub attribute_bindings: Vec<String>,
    pub positional_params: Vec<String>,
    /// Property defaults, taking precedence over the definition's.
    pub properties: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// The node a component is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// `{{my-comp a b=c}}`
    Mustache(MustacheStatement),
    /// `{{#my-comp a b=c}}...{{/my-comp}}`
    Block(BlockStatement),
}

impl Invocation {
    pub fn params(&self) -> &[Expression] {
        match self {
            Invocation::Mustache(m) => &m.params,
            Invocation::Block(block) => &block.params,
        }
    }

    pub fn hash(&self) -> &Hash {
        match self {
            Invocation::Mustache(m) => &m.hash,
            Invocation::Block(block) => &block.hash,
        }
    }

    /// The caller's block, for block invocations.
    pub fn program(&self) -> Option<&Block> {
        match self {
            Invocation::Mustache(_) => None,
            Invocation::Block(block) => Some(&block.program),
        }
    }
}

impl From<MustacheStatement> for Invocation {
    fn from(node: MustacheStatement) -> Self {
        Invocation::Mustache(node)
    }
}

impl From<BlockStatement> for Invocation {
    fn from(node: BlockStatement) -> Self {
        Invocation::Block(node)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// What a component expands to.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentOutput {
    Element(ElementNode),
    /// A tagless component: the children alone.
    Children(Vec<Statement>),
}

impl ComponentOutput {
    pub fn into_statements(self) -> Vec<Statement> {
        match self {
            ComponentOutput::Element(element) => vec![Statement::Element(element)],
            ComponentOutput::Children(children) => children,
        }
    }
}

/// A definition bound to one invocation.
pub struct Component {
    definition: ComponentDefinition,
    node: Invocation,
    options: ComponentOptions,
    attrs: OnceCell<BTreeMap<String, Expression>>,
    /// Computed accessors currently being evaluated.
    computing: RefCell<Vec<String>>,
}

impl Component {
    pub fn node(&self) -> &Invocation {
        &self.node
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.options
    }

    /// The invocation's `tagName`, else the options', else the definition's.
    pub fn tag_name(&self) -> Result<String, ComponentError> {
        match self.invocation_attrs().get("tagName") {
            None => Ok(self
                .options
                .tag_name
                .clone()
                .unwrap_or_else(|| self.definition.tag_name.clone())),
            Some(Expression::Literal(Literal::String(tag))) => Ok(tag.clone()),
            Some(other) => Err(ComponentError::InvalidTagName {
                node_type: other.type_name().to_string(),
            }),
        }
    }

    /// Arguments passed at the call site, keyed by property name.
    /// Positional parameters are named by `positional_params`; named
    /// arguments win over them.
    pub fn invocation_attrs(&self) -> &BTreeMap<String, Expression> {
        self.attrs.get_or_init(|| {
            let mut attrs = BTreeMap::new();
            for (name, param) in self.positional_params().into_iter().zip(self.node.params()) {
                attrs.insert(name, param.clone());
            }
            for pair in &self.node.hash().pairs {
                attrs.insert(pair.key.clone(), pair.value.clone());
            }
            attrs
        })
    }

    pub fn class_names(&self) -> Vec<String> {
        joined(&self.definition.class_names, &self.options.class_names)
    }

    pub fn class_name_bindings(&self) -> Vec<String> {
        joined(&self.definition.class_name_bindings, &self.options.class_name_bindings)
    }

    pub fn attribute_bindings(&self) -> Vec<String> {
        joined(&self.definition.attribute_bindings, &self.options.attribute_bindings)
    }

    pub fn positional_params(&self) -> Vec<String> {
        joined(&self.definition.positional_params, &self.options.positional_params)
    }

    /// Collect every candidate source for `property`.
    pub fn binding_sources(&self, property: &str) -> Result<BindingSources, ComponentError> {
        let computed = match self.definition.computed.get(property) {
            Some(accessor) if !self.is_computing(property) => {
                self.computing.borrow_mut().push(property.to_string());
                let result = accessor(self, property);
                self.computing.borrow_mut().pop();
                Some(result?)
            }
            _ => None,
        };

        let static_default = self
            .options
            .properties
            .get(property)
            .or_else(|| self.definition.properties.get(property))
            .cloned();

        Ok(BindingSources {
            computed,
            invocation: self.invocation_attrs().get(property).map(Value::from_expression),
            static_default,
        })
    }

    fn is_computing(&self, property: &str) -> bool {
        self.computing.borrow().iter().any(|p| p == property)
    }

    /// The winning value for `property`, if any.
    pub fn property_value(&self, property: &str) -> Result<Option<Value>, ComponentError> {
        Ok(self.binding_sources(property)?.value().cloned())
    }

    /// Static class names, then class-name bindings, then the invocation's
    /// `class` argument, space separated.
    pub fn class_content(&self) -> Result<Option<AttrValue>, ComponentError> {
        let mut content = None;

        let class_names = self.class_names();
        if !class_names.is_empty() {
            content = append_to_attr_content(class_names.join(" "), content, AppendOptions::default());
        }

        for declaration in self.class_name_bindings() {
            let spec = BindingSpec::class(&declaration);
            let resolved = resolve(&spec, &self.binding_sources(&spec.property)?);
            if let Some(fragment) = resolved.into_fragment(&spec) {
                content = append_to_attr_content(fragment, content, AppendOptions::default());
            }
        }

        if let Some(class) = self.invocation_attrs().get("class") {
            content = append_to_attr_content(class.clone(), content, AppendOptions::default());
        }

        Ok(content)
    }

    /// One attribute per attribute binding; omitted bindings are skipped.
    pub fn element_attrs(&self) -> Result<Vec<AttrNode>, ComponentError> {
        let mut attrs = Vec::new();
        for declaration in self.attribute_bindings() {
            let spec = BindingSpec::attribute(&declaration);
            if let Some(attr) = self.binding_attr(&spec)? {
                attrs.push(attr);
            }
        }
        Ok(attrs)
    }

    /// Build the attribute for the binding declared for `property`.
    pub fn attribute_binding(&self, property: &str) -> Result<Option<AttrNode>, ComponentError> {
        let spec = self
            .attribute_bindings()
            .iter()
            .map(|declaration| BindingSpec::attribute(declaration))
            .find(|spec| spec.property == property)
            .ok_or_else(|| ComponentError::UndeclaredBinding {
                property: property.to_string(),
            })?;
        self.binding_attr(&spec)
    }

    fn binding_attr(&self, spec: &BindingSpec) -> Result<Option<AttrNode>, ComponentError> {
        let resolved = resolve(spec, &self.binding_sources(&spec.property)?);
        let attr = build_attr(spec.target_name(), resolved.into_fragment(spec));
        if attr.is_none() {
            log::trace!(target: "hbs.binding", "omitting attribute {}", spec.target_name());
        }
        Ok(attr)
    }

    /// Mustache and block invocations carry no element modifiers.
    pub fn element_modifiers(&self) -> Vec<ElementModifierStatement> {
        Vec::new()
    }

    /// The caller's block (after the content transform) or, with a layout,
    /// the inlined layout.
    pub fn element_children(&self) -> Result<Vec<Statement>, ComponentError> {
        let block = match self.node.program() {
            Some(program) => {
                let mut program = program.clone();
                if let Some(transform) = &self.definition.content_transform {
                    transform(&mut program)?;
                }
                Some(program)
            }
            None => None,
        };

        match &self.definition.layout {
            Some(template) => layout::inline(self, template.clone(), block.as_ref()),
            None => Ok(block.map(|block| block.body).unwrap_or_default()),
        }
    }

    pub fn to_element(&self) -> Result<ComponentOutput, ComponentError> {
        let tag_name = self.tag_name()?;
        if tag_name.is_empty() {
            log::debug!(target: "hbs.component", "tagless component, emitting children");
            return Ok(ComponentOutput::Children(self.element_children()?));
        }

        let element = b::element(
            tag_name,
            self.element_attrs()?,
            self.element_modifiers(),
            self.element_children()?,
        );
        log::debug!(
            target: "hbs.component",
            "built <{}> with {} attributes",
            element.tag,
            element.attributes.len()
        );
        Ok(ComponentOutput::Element(element))
    }
}

fn class_accessor(component: &Component, _: &str) -> Result<Option<Value>, ComponentError> {
    Ok(component.class_content()?.map(Value::from))
}

fn joined(defaults: &[String], extra: &[String]) -> Vec<String> {
    defaults.iter().chain(extra).cloned().collect()
}
