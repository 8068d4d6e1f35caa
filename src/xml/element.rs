//! Owned, mutable XML element tree.
//!
//! Elements keep their qualified name exactly as written (`dc:title`) next to
//! the namespace URI that name resolved to when the document was parsed, so
//! lookups can match on namespace while serialization reproduces the source
//! prefixes. Attribute order and whitespace-only text nodes are preserved.

use std::borrow::Cow;

/// A single attribute. `name` is the raw qualified name; `value` is unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether this attribute is a namespace declaration (`xmlns` or `xmlns:*`).
    #[inline]
    pub fn is_namespace_decl(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// Child node of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    /// Raw comment body
    Comment(String),
    /// Raw CDATA body
    CData(String),
}

impl XmlNode {
    #[inline]
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with a raw qualified name and its resolved namespace.
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_element(child);
        self
    }

    /// Raw qualified name, e.g. `dc:title`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix part of the qualified name, if any.
    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Local part of the qualified name.
    #[inline]
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Namespace URI the element name resolved to.
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Match on namespace URI and local name.
    #[inline]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local_name() == local && self.namespace() == Some(namespace)
    }

    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute by raw qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing one of the same name in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Replace every non-declaration attribute with `attrs`.
    ///
    /// Namespace declarations stay, since the element's own name (and those of
    /// its children) may depend on them.
    pub fn replace_attributes(&mut self, attrs: impl IntoIterator<Item = Attribute>) {
        self.attributes.retain(Attribute::is_namespace_decl);
        for attr in attrs {
            if attr.is_namespace_decl() {
                continue;
            }
            self.set_attr(&attr.name, attr.value);
        }
    }

    /// Namespace URI declared on this element for `prefix` (`None` = default).
    pub fn declared_namespace(&self, prefix: Option<&str>) -> Option<&str> {
        let key: Cow<'_, str> = match prefix {
            Some(p) => Cow::Owned(format!("xmlns:{}", p)),
            None => Cow::Borrowed("xmlns"),
        };
        self.attr(&key)
    }

    /// Concatenated text of the direct text and CDATA children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Replace the direct text content, keeping element and comment children.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children
            .retain(|c| !matches!(c, XmlNode::Text(_) | XmlNode::CData(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.insert(0, XmlNode::Text(text));
        }
    }

    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Iterate over direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Iterate mutably over direct element children.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// Number of direct element children.
    pub fn element_count(&self) -> usize {
        self.elements().count()
    }

    /// First direct child element matching namespace and local name.
    pub fn find(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(namespace, local))
    }

    /// Append a child element.
    #[inline]
    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert an element before the raw child `before` (or after the last
    /// element when `None`), copying the indentation of existing children.
    ///
    /// Returns the raw index the element landed at.
    pub fn insert_element_indented(&mut self, before: Option<usize>, child: XmlElement) -> usize {
        let indent = self.child_indent();

        match before {
            Some(index) if index < self.children.len() => {
                self.children.insert(index, XmlNode::Element(child));
                if let Some(indent) = indent {
                    self.children.insert(index + 1, XmlNode::Text(indent));
                }
                index
            },
            _ => {
                // Keep the closing tag's own indentation last.
                let mut index = self.children.len();
                if let Some(XmlNode::Text(t)) = self.children.last()
                    && t.trim().is_empty()
                    && self.element_count() > 0
                {
                    index -= 1;
                }
                if let Some(indent) = indent {
                    self.children.insert(index, XmlNode::Text(indent));
                    index += 1;
                }
                self.children.insert(index, XmlNode::Element(child));
                index
            },
        }
    }

    /// Remove the element at raw child `index` together with the whitespace
    /// text that indents it.
    pub fn remove_element_trimmed(&mut self, index: usize) -> Option<XmlElement> {
        if !matches!(self.children.get(index), Some(XmlNode::Element(_))) {
            return None;
        }
        let removed = match self.children.remove(index) {
            XmlNode::Element(el) => el,
            _ => return None,
        };
        if index > 0
            && let Some(XmlNode::Text(t)) = self.children.get(index - 1)
            && t.trim().is_empty()
        {
            self.children.remove(index - 1);
        }
        Some(removed)
    }

    /// Whitespace text that precedes the first child element, if any.
    fn child_indent(&self) -> Option<String> {
        let first = self.children.iter().position(|c| matches!(c, XmlNode::Element(_)))?;
        match first.checked_sub(1).and_then(|i| self.children.get(i)) {
            Some(XmlNode::Text(t)) if t.trim().is_empty() => Some(t.clone()),
            _ => None,
        }
    }

    /// Raw child indices of the direct element children accepted by `pred`,
    /// in document order.
    pub fn element_positions<F>(&self, mut pred: F) -> Vec<usize>
    where
        F: FnMut(&XmlElement) -> bool,
    {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                XmlNode::Element(el) if pred(el) => Some(i),
                _ => None,
            })
            .collect()
    }
}
