//! Namespace-aware XML element tree.
//!
//! A small element-tree model used to render protocol messages and SOAP
//! envelopes, and to read them back. Serialization declares every namespace
//! on the root element and allocates prefixes itself, and the chosen prefix is
//! visible in the output text.

mod reader;
mod writer;

use std::fmt;

use crate::error::SamlResult;

/// Qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI, `None` for unqualified names.
    pub namespace: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Creates a namespace-qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Creates a name without a namespace.
    #[must_use]
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Returns true if this name has the given namespace and local part.
    #[must_use]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Character data.
    Text(String),
}

/// XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag.
    pub name: QName,
    /// Attributes in document order.
    pub attributes: Vec<(QName, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with the given qualified tag.
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an empty element in the given namespace.
    #[must_use]
    pub fn ns(namespace: &str, local: &str) -> Self {
        Self::new(QName::new(namespace, local))
    }

    /// Sets an unqualified attribute, replacing any previous value.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(QName::unqualified(name), value);
        self
    }

    /// Sets an unqualified attribute when a value is present.
    #[must_use]
    pub fn with_optional_attribute(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with_attribute(name, v),
            None => self,
        }
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.append(child);
        self
    }

    /// Appends character data.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Sets an attribute, replacing any previous value with the same name.
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Appends a child element.
    pub fn append(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Returns the value of an unqualified attribute.
    #[must_use]
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.namespace.is_none() && n.local == local)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of a namespace-qualified attribute.
    #[must_use]
    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.is(namespace, local))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Returns the first child element with the given qualified name.
    #[must_use]
    pub fn find(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name.is(namespace, local))
    }

    /// Returns all child elements with the given qualified name.
    pub fn find_all<'a, 'n>(
        &'a self,
        namespace: &'n str,
        local: &'n str,
    ) -> impl Iterator<Item = &'a Element> + 'n
    where
        'a: 'n,
    {
        self.child_elements()
            .filter(move |e| e.name.is(namespace, local))
    }

    /// Returns the concatenated direct text content, trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
            }
        }
        out.trim().to_string()
    }

    /// Serializes the tree, preceded by a UTF-8 XML declaration.
    #[must_use]
    pub fn to_xml(&self) -> String {
        writer::serialize(self)
    }

    /// Parses a document into its root element.
    pub fn parse(text: &str) -> SamlResult<Self> {
        reader::parse(text)
    }
}
