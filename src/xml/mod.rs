//! Mutable XML document trees for the container, package, and navigation
//! documents.
//!
//! quick-xml gives us a fast event stream but no tree; the views in this
//! crate need to insert and remove elements in place and write the result
//! back out, so the events are folded into a small owned tree
//! ([`XmlElement`]) that keeps prefixes, attribute order, and whitespace.

mod element;
pub mod namespace;
mod reader;
mod writer;

pub use element::{Attribute, XmlElement, XmlNode};
pub use namespace::{NamespaceRegistry, QualifiedKey};
pub use reader::parse_document;
pub use writer::{write_document, write_element};

use crate::common::Result;

/// Top-level node that precedes the root element.
#[derive(Debug, Clone, PartialEq)]
pub enum PrologNode {
    /// Body of a `<!DOCTYPE ...>` declaration
    DocType(String),
    /// Body of a comment
    Comment(String),
}

/// An XML document: optional DOCTYPE/comments followed by one root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: Vec<PrologNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Wrap a root element with an empty prolog.
    pub fn new(root: XmlElement) -> Self {
        Self {
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse from raw bytes.
    #[inline]
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parse_document(bytes)
    }

    /// Serialize to UTF-8 bytes.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        write_document(self)
    }
}
