//! Namespace-aware access to the package `<metadata>` section.
//!
//! Keys are resolved through the owning book's [`NamespaceRegistry`]:
//! `dc:title`, `meta` (default OPF namespace), or Clark notation
//! `{http://purl.org/dc/elements/1.1/}title`. Repeated elements are kept as
//! an ordered sequence: [`Metadata::get`] returns the first match and
//! [`Metadata::get_all`] every match in document order.

use super::package::PackageDocument;
use crate::common::{Error, Result};
use crate::xml::namespace::{DC_NS, OPF_NS};
use crate::xml::{Attribute, NamespaceRegistry, QualifiedKey, XmlElement, XmlNode};

/// Value written by [`MetadataMut::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    /// Replace the element text, keeping its attributes
    Text(String),
    /// Replace the element attributes, keeping its text
    Attributes(Vec<Attribute>),
}

impl From<&str> for MetadataValue {
    fn from(text: &str) -> Self {
        MetadataValue::Text(text.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(text: String) -> Self {
        MetadataValue::Text(text)
    }
}

impl From<Vec<Attribute>> for MetadataValue {
    fn from(attrs: Vec<Attribute>) -> Self {
        MetadataValue::Attributes(attrs)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for MetadataValue {
    fn from(attrs: [(K, V); N]) -> Self {
        MetadataValue::Attributes(attrs.into_iter().map(|(k, v)| Attribute::new(k, v)).collect())
    }
}

fn key_matches(element: &XmlElement, key: &QualifiedKey) -> bool {
    element.local_name() == key.local
        && match element.namespace() {
            Some(ns) => ns == key.namespace,
            None => key.namespace == OPF_NS,
        }
}

/// Read-only metadata view.
#[derive(Clone, Copy)]
pub struct Metadata<'a> {
    section: Option<&'a XmlElement>,
    registry: &'a NamespaceRegistry,
}

impl<'a> Metadata<'a> {
    pub(crate) fn new(package: &'a PackageDocument, registry: &'a NamespaceRegistry) -> Self {
        Self {
            section: package.metadata_section(),
            registry,
        }
    }

    /// First element matching `key`.
    pub fn get(&self, key: &str) -> Result<&'a XmlElement> {
        let qualified = self.registry.resolve(key)?;
        self.iter()
            .find(|el| key_matches(el, &qualified))
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Every element matching `key`, in document order.
    pub fn get_all(&self, key: &str) -> Result<Vec<&'a XmlElement>> {
        let qualified = self.registry.resolve(key)?;
        Ok(self.iter().filter(|el| key_matches(el, &qualified)).collect())
    }

    /// Text of the first element matching `key`.
    pub fn text(&self, key: &str) -> Result<String> {
        self.get(key).map(XmlElement::text)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// All metadata elements in document order.
    pub fn iter(&self) -> impl Iterator<Item = &'a XmlElement> + use<'a> {
        self.section.into_iter().flat_map(|section| section.elements())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Mutable metadata view, obtained from [`crate::Epub::metadata_mut`].
pub struct MetadataMut<'a> {
    package: &'a mut PackageDocument,
    registry: &'a mut NamespaceRegistry,
}

impl<'a> MetadataMut<'a> {
    pub(crate) fn new(package: &'a mut PackageDocument, registry: &'a mut NamespaceRegistry) -> Self {
        Self { package, registry }
    }

    /// Read-only view of the current state.
    pub fn view(&self) -> Metadata<'_> {
        Metadata::new(&*self.package, &*self.registry)
    }

    pub fn get(&self, key: &str) -> Result<&XmlElement> {
        self.view().get(key)
    }

    pub fn get_all(&self, key: &str) -> Result<Vec<&XmlElement>> {
        self.view().get_all(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &XmlElement> + '_ {
        self.view().iter()
    }

    /// Bind a prefix so keys using it become resolvable.
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) {
        self.registry.register(prefix, uri);
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &*self.registry
    }

    /// Set text or attributes of the first element matching `key`, creating
    /// the element if needed.
    pub fn set(&mut self, key: &str, value: impl Into<MetadataValue>) -> Result<()> {
        match value.into() {
            MetadataValue::Text(text) => self.set_text(key, text),
            MetadataValue::Attributes(attrs) => self.set_attributes(key, attrs),
        }
    }

    /// Overwrite the text of the first match, keeping its attributes.
    pub fn set_text(&mut self, key: &str, text: impl Into<String>) -> Result<()> {
        let qualified = self.registry.resolve(key)?;
        let fresh = self.new_element(&qualified);
        let text = text.into();

        let section = self.section_mut()?;
        if let Some(element) = section.elements_mut().find(|el| key_matches(el, &qualified)) {
            element.set_text(text);
        } else {
            section.insert_element_indented(None, fresh.with_text(text));
        }
        self.package.mark_dirty();
        Ok(())
    }

    /// Replace every attribute of the first match (namespace declarations
    /// stay), keeping its text.
    ///
    /// The unique `dc:identifier` always keeps the `id` the package's
    /// `unique-identifier` names.
    pub fn set_attributes(&mut self, key: &str, attrs: impl IntoIterator<Item = Attribute>) -> Result<()> {
        let qualified = self.registry.resolve(key)?;
        let mut fresh = self.new_element(&qualified);
        let unique = self.package.unique_identifier_ref().map(str::to_string);

        let section = self.section_mut()?;
        if let Some(element) = section.elements_mut().find(|el| key_matches(el, &qualified)) {
            let unique_id = unique
                .filter(|id| element.is(DC_NS, "identifier") && element.attr("id") == Some(id.as_str()));
            element.replace_attributes(attrs);
            if let Some(id) = unique_id {
                element.set_attr("id", id);
            }
        } else {
            for attr in attrs.into_iter().filter(|a| !a.is_namespace_decl()) {
                fresh.set_attr(&attr.name, attr.value);
            }
            section.insert_element_indented(None, fresh);
        }
        self.package.mark_dirty();
        Ok(())
    }

    /// Append a new element even when `key` already has one.
    pub fn add(&mut self, key: &str, text: impl Into<String>) -> Result<()> {
        let qualified = self.registry.resolve(key)?;
        let fresh = self.new_element(&qualified).with_text(text);

        self.section_mut()?.insert_element_indented(None, fresh);
        self.package.mark_dirty();
        Ok(())
    }

    /// Remove the first element matching `key`.
    ///
    /// The `dc:identifier` named by the package's `unique-identifier` can't be
    /// removed.
    pub fn delete(&mut self, key: &str) -> Result<XmlElement> {
        let qualified = self.registry.resolve(key)?;
        let unique = self.package.unique_identifier_ref().map(str::to_string);

        let section = self.section_mut()?;
        let raw = section
            .element_positions(|el| key_matches(el, &qualified))
            .first()
            .copied()
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;

        if let Some(XmlNode::Element(element)) = section.children().get(raw)
            && element.is(DC_NS, "identifier")
            && unique.is_some()
            && element.attr("id") == unique.as_deref()
        {
            return Err(Error::InvalidPackage("cannot delete the unique identifier".to_string()));
        }

        let removed = section
            .remove_element_trimmed(raw)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        self.package.mark_dirty();
        Ok(removed)
    }

    fn section_mut(&mut self) -> Result<&mut XmlElement> {
        self.package
            .section_mut("metadata")
            .ok_or_else(|| Error::InvalidPackage("missing <metadata> section".to_string()))
    }

    /// Empty element for `key`, declaring its namespace when the prefix is
    /// not already bound in scope of `<metadata>`.
    fn new_element(&self, key: &QualifiedKey) -> XmlElement {
        let prefix = key.prefix.as_deref();
        let in_scope = self
            .package
            .metadata_section()
            .and_then(|section| section.declared_namespace(prefix))
            .or_else(|| self.package.root().declared_namespace(prefix));

        let mut element = XmlElement::new(key.element_name(), Some(&key.namespace));
        if in_scope != Some(key.namespace.as_str()) {
            let declaration = match prefix {
                Some(p) => format!("xmlns:{}", p),
                None => "xmlns".to_string(),
            };
            element.set_attr(&declaration, key.namespace.as_str());
        }
        element
    }
}
