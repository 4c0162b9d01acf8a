//! Parsed configuration document model.
//!
//! A [`ConfigurationDocument`] is the output of the
//! [`ConfigParser`](crate::parser::ConfigParser): resource blocks with their
//! raw attribute trees plus the variable, local and data-source declarations
//! needed by the [`Resolver`](crate::resolver::Resolver).

use serde::Serialize;

/// Resource type of conditional access policies in the configuration dialect.
pub const POLICY_RESOURCE_TYPE: &str = "azuread_conditional_access_policy";

/// A raw attribute value, before reference resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Quoted string literal.
    String(String),
    /// Numeric literal.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
    /// `null` literal.
    Null,
    /// Whole-value symbolic reference such as `var.name`, `local.name` or
    /// `data.kind.name.attr`, kept as its dotted text.
    Reference(String),
    /// Bracketed list.
    List(Vec<AttributeValue>),
    /// Object literal `{ key = value }`.
    Object(Body),
}

impl AttributeValue {
    /// Returns the reference text if this value is a symbolic reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Renders a scalar value as text; references render as their dotted path.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(s) | Self::Reference(s) => Some(s.clone()),
            Self::Number(n) => Some(concord_core::Value::Number(*n).to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null | Self::List(_) | Self::Object(_) => None,
        }
    }

    /// Visits every reference in this value, depth first.
    pub fn for_each_reference(&self, visit: &mut impl FnMut(&str)) {
        match self {
            Self::Reference(r) => visit(r),
            Self::List(items) => items.iter().for_each(|item| item.for_each_reference(visit)),
            Self::Object(body) => body.for_each_reference(visit),
            _ => {}
        }
    }
}

/// One `key = value` assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Attribute key.
    pub name: String,
    /// Attribute value.
    pub value: AttributeValue,
}

/// A nested block such as `conditions { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Block type keyword.
    pub block_type: String,
    /// Optional quoted labels after the keyword.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Block contents.
    pub body: Body,
}

/// Contents of a block or object literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Body {
    /// Assignments in source order; keys are unique (last assignment wins).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Nested blocks in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl Body {
    /// Sets an attribute; a repeated key replaces the earlier value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name) {
            existing.value = value;
        } else {
            self.attributes.push(Attribute { name, value });
        }
    }

    /// Looks up an attribute value by key.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Returns the first nested block of the given type.
    #[must_use]
    pub fn block(&self, block_type: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.block_type == block_type)
    }

    /// Returns a nested group written either as a block (`users { }`) or as
    /// an object-valued attribute (`users = { }`).
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Self> {
        if let Some(block) = self.block(name) {
            return Some(&block.body);
        }
        match self.attribute(name) {
            Some(AttributeValue::Object(body)) => Some(body),
            Some(AttributeValue::List(items)) => items.iter().find_map(|item| match item {
                AttributeValue::Object(body) => Some(body),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Visits every reference in this body, depth first.
    pub fn for_each_reference(&self, visit: &mut impl FnMut(&str)) {
        for attribute in &self.attributes {
            attribute.value.for_each_reference(visit);
        }
        for block in &self.blocks {
            block.body.for_each_reference(visit);
        }
    }

    /// Applies `f` to every attribute value, depth first through nested blocks.
    pub fn for_each_value_mut(&mut self, f: &mut impl FnMut(&mut AttributeValue)) {
        for attribute in &mut self.attributes {
            f(&mut attribute.value);
        }
        for block in &mut self.blocks {
            block.body.for_each_value_mut(f);
        }
    }
}

/// A `resource "<type>" "<name>" { }` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceBlock {
    /// Resource type (first label).
    pub resource_type: String,
    /// Resource name (second label).
    pub name: String,
    /// Raw attribute tree.
    pub body: Body,
    /// Line the block starts on (1-based).
    pub line: usize,
}

impl ResourceBlock {
    /// Returns the `<type>.<name>` address of the resource.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// A `variable "<name>" { default = ... }` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDefinition {
    /// Variable name.
    pub name: String,
    /// Default value, if declared.
    pub default_value: Option<AttributeValue>,
}

/// One key of a `locals { }` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalDefinition {
    /// Local name.
    pub name: String,
    /// Local value.
    pub value: AttributeValue,
}

/// A `data "<kind>" "<name>" { }` declaration or an access to one.
///
/// Data sources are never resolved; the paths through which resources
/// access them are recorded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceReference {
    /// Data source kind (first label).
    pub kind: String,
    /// Data source name (second label).
    pub name: String,
    /// Dotted paths (`data.<kind>.<name>.<attr>...`) used by resources.
    pub accessed_paths: Vec<String>,
    /// Whether a matching `data` block was declared in the document.
    pub declared: bool,
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigurationDocument {
    /// Policy resources in source order.
    pub resources: Vec<ResourceBlock>,
    /// Variable declarations in source order.
    pub variables: Vec<VariableDefinition>,
    /// Local values in source order.
    pub locals: Vec<LocalDefinition>,
    /// Data-source declarations and accesses in source order.
    pub data_sources: Vec<DataSourceReference>,
}

impl ConfigurationDocument {
    /// Adds a resource; a repeated address replaces the earlier block in place.
    pub fn upsert_resource(&mut self, resource: ResourceBlock) {
        if let Some(existing) = self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    /// Adds a variable; a repeated name replaces the earlier declaration in place.
    pub fn upsert_variable(&mut self, variable: VariableDefinition) {
        if let Some(existing) = self.variables.iter_mut().find(|v| v.name == variable.name) {
            *existing = variable;
        } else {
            self.variables.push(variable);
        }
    }

    /// Adds a local; a repeated name replaces the earlier value in place.
    pub fn upsert_local(&mut self, local: LocalDefinition) {
        if let Some(existing) = self.locals.iter_mut().find(|l| l.name == local.name) {
            *existing = local;
        } else {
            self.locals.push(local);
        }
    }

    /// Records a data block declaration.
    pub fn declare_data_source(&mut self, kind: &str, name: &str) {
        let entry = self.data_source_entry(kind, name);
        entry.declared = true;
    }

    /// Records a `data.<kind>.<name>...` access path.
    ///
    /// Paths with fewer than three segments are ignored.
    pub fn record_data_access(&mut self, path: &str) {
        let mut segments = path.split('.');
        let (Some("data"), Some(kind), Some(name)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return;
        };
        let entry = self.data_source_entry(kind, name);
        if !entry.accessed_paths.iter().any(|p| p == path) {
            entry.accessed_paths.push(path.to_string());
        }
    }

    fn data_source_entry(&mut self, kind: &str, name: &str) -> &mut DataSourceReference {
        let index = match self
            .data_sources
            .iter()
            .position(|d| d.kind == kind && d.name == name)
        {
            Some(index) => index,
            None => {
                self.data_sources.push(DataSourceReference {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    accessed_paths: Vec::new(),
                    declared: false,
                });
                self.data_sources.len() - 1
            }
        };
        &mut self.data_sources[index]
    }

    /// Looks up a variable declaration by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Looks up a local value by name.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&LocalDefinition> {
        self.locals.iter().find(|l| l.name == name)
    }

    /// Returns the resources of the given type.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a ResourceBlock> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }
}
