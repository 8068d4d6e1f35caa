//! The NCX navigation document and its table of contents.

use crate::common::xml::{escape_attr, escape_text};
use crate::common::{Error, Result};
use crate::opf::package::join_path;
use crate::xml::namespace::NCX_NS;
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use log::debug;
use std::borrow::Cow;

/// Label reported for navigation points without one
pub const MISSING_LABEL: &str = "None";

/// One navigation point of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    /// Archive path of the target (the `content@src`, joined with the
    /// package folder; fragments are kept)
    pub source: String,
    pub id: Option<String>,
}

fn child<'e>(element: &'e XmlElement, local: &str) -> Option<&'e XmlElement> {
    element.elements().find(|el| el.local_name() == local)
}

fn child_mut<'e>(element: &'e mut XmlElement, local: &str) -> Option<&'e mut XmlElement> {
    element.elements_mut().find(|el| el.local_name() == local)
}

/// Parsed NCX document.
#[derive(Debug, Clone)]
pub struct NavigationDocument {
    path: String,
    document: XmlDocument,
    original: Option<Vec<u8>>,
    dirty: bool,
}

impl NavigationDocument {
    /// Parse the navigation document found at archive `path`.
    pub fn parse(path: &str, bytes: Vec<u8>) -> Result<Self> {
        let document = XmlDocument::parse(&bytes).map_err(Error::in_navigation)?;
        if document.root.local_name() != "ncx" {
            return Err(Error::InvalidNavigation(format!(
                "root element is <{}>, expected <ncx>",
                document.root.name()
            )));
        }

        let navigation = Self {
            path: path.to_string(),
            document,
            original: Some(bytes),
            dirty: false,
        };
        debug!("loaded navigation {} ({} nav points)", navigation.path, navigation.nav_point_count());
        Ok(navigation)
    }

    /// Build the navigation document of a new book.
    pub fn synthesize(path: &str, uid: &str, title: &str) -> Result<Self> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="{ncx}" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="0"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
  </navMap>
</ncx>
"#,
            ncx = NCX_NS,
            uid = escape_attr(uid),
            title = escape_text(title),
        );

        let mut navigation = Self::parse(path, xml.into_bytes())?;
        navigation.original = None;
        navigation.dirty = true;
        Ok(navigation)
    }

    /// Archive path of the navigation document.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.document.root
    }

    /// Text of `docTitle`.
    pub fn title(&self) -> Option<String> {
        let text = child(child(self.root(), "docTitle")?, "text")?;
        Some(text.text())
    }

    /// Content of the `dtb:uid` head meta.
    pub fn uid(&self) -> Option<&str> {
        child(self.root(), "head")?
            .elements()
            .find(|el| el.local_name() == "meta" && el.attr("name") == Some("dtb:uid"))?
            .attr("content")
    }

    /// Depth-first iterator over every navigation point. Sources are joined
    /// with `root_folder`.
    pub fn toc<'a>(&'a self, root_folder: &'a str) -> TocIter<'a> {
        TocIter {
            stack: vec![self.document.root.children().iter()],
            root_folder,
        }
    }

    fn nav_point_count(&self) -> usize {
        self.toc("").count()
    }

    /// Append a top-level navigation point to `navMap`, returning its id.
    pub fn add_nav_point(&mut self, label: &str, src: &str) -> Result<String> {
        let play_order = self.nav_point_count() + 1;
        let mut n = play_order;
        let mut id = format!("navPoint-{}", n);
        while self.toc("").any(|entry| entry.id.as_deref() == Some(id.as_str())) {
            n += 1;
            id = format!("navPoint-{}", n);
        }

        let nav_map = child_mut(&mut self.document.root, "navMap")
            .ok_or_else(|| Error::InvalidNavigation("missing <navMap>".to_string()))?;

        let name = |local: &str| match nav_map.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
        let namespace = nav_map.namespace().map(str::to_string);
        let ns = namespace.as_deref();

        let text = XmlElement::new(name("text"), ns).with_text(label);
        let point = XmlElement::new(name("navPoint"), ns)
            .with_attr("id", id.as_str())
            .with_attr("playOrder", play_order.to_string())
            .with_child(XmlElement::new(name("navLabel"), ns).with_child(text))
            .with_child(XmlElement::new(name("content"), ns).with_attr("src", src));

        nav_map.insert_element_indented(None, point);
        self.dirty = true;
        Ok(id)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bytes to write on finalize.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match &self.original {
            Some(bytes) if !self.dirty => Cow::Borrowed(bytes),
            _ => Cow::Owned(self.document.to_bytes()),
        }
    }
}

/// Lazy depth-first walk over the `navPoint`s of a navigation document.
///
/// A clone walks on independently from the same position; call
/// [`crate::Epub::toc`] again to start over.
#[derive(Debug, Clone)]
pub struct TocIter<'a> {
    stack: Vec<std::slice::Iter<'a, XmlNode>>,
    root_folder: &'a str,
}

impl<'a> TocIter<'a> {
    fn entry(&self, point: &XmlElement) -> TocEntry {
        let label = child(point, "navLabel")
            .and_then(|nav_label| child(nav_label, "text"))
            .map(XmlElement::text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| MISSING_LABEL.to_string());

        let source = child(point, "content")
            .and_then(|content| content.attr("src"))
            .map(|src| join_path(self.root_folder, src))
            .unwrap_or_default();

        TocEntry {
            label,
            source,
            id: point.attr("id").map(str::to_string),
        }
    }
}

impl<'a> Iterator for TocIter<'a> {
    type Item = TocEntry;

    fn next(&mut self) -> Option<TocEntry> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                None => {
                    self.stack.pop();
                },
                Some(XmlNode::Element(element)) => {
                    self.stack.push(element.children().iter());
                    if element.local_name() == "navPoint" {
                        return Some(self.entry(element));
                    }
                },
                Some(_) => {},
            }
        }
    }
}

impl std::iter::FusedIterator for TocIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_ncx;

    fn navigation() -> NavigationDocument {
        NavigationDocument::parse("OEBPS/toc.ncx", sample_ncx().into_bytes()).unwrap()
    }

    #[test]
    fn test_toc_is_depth_first() {
        let navigation = navigation();
        let entries: Vec<TocEntry> = navigation.toc("OEBPS").collect();
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, ["Chapter 1", "Section 1.1", "Chapter 2", "None"]);
        assert_eq!(entries[1].source, "OEBPS/chapter1.xhtml#s1");
        assert_eq!(entries[0].id.as_deref(), Some("np-1"));
        assert_eq!(entries[3].id, None);
    }

    #[test]
    fn test_toc_is_restartable() {
        let navigation = navigation();
        let mut first = navigation.toc("OEBPS");
        first.next();
        let rest = first.clone().count();
        assert_eq!(rest, 3);
        assert_eq!(first.count(), 3);
        assert_eq!(navigation.toc("OEBPS").count(), 4);
    }

    #[test]
    fn test_title_and_uid() {
        let navigation = navigation();
        assert_eq!(navigation.title().as_deref(), Some("Il diavolo"));
        assert_eq!(navigation.uid(), Some("urn:uuid:1234"));
        assert_eq!(navigation.to_bytes().as_ref(), sample_ncx().as_bytes());
    }

    #[test]
    fn test_not_ncx() {
        assert!(matches!(
            NavigationDocument::parse("toc.ncx", b"<html/>".to_vec()),
            Err(Error::InvalidNavigation(_))
        ));
        assert!(matches!(
            NavigationDocument::parse("toc.ncx", b"<ncx>".to_vec()),
            Err(Error::InvalidNavigation(_))
        ));
    }

    #[test]
    fn test_synthesize() {
        let navigation = NavigationDocument::synthesize("OEBPS/toc.ncx", "urn:uuid:x", "Default").unwrap();
        assert_eq!(navigation.uid(), Some("urn:uuid:x"));
        assert_eq!(navigation.title().as_deref(), Some("Default"));
        assert_eq!(navigation.toc("OEBPS").count(), 0);
        assert!(navigation.is_dirty());

        let bytes = navigation.to_bytes();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("<!DOCTYPE ncx PUBLIC"));
    }

    #[test]
    fn test_add_nav_point() {
        let mut navigation = navigation();
        let id = navigation.add_nav_point("Epilogue", "epilogue.xhtml").unwrap();
        assert_eq!(id, "navPoint-5");

        let last = navigation.toc("OEBPS").last().unwrap();
        assert_eq!(last.label, "Epilogue");
        assert_eq!(last.source, "OEBPS/epilogue.xhtml");
        assert!(navigation.is_dirty());

        let reparsed = NavigationDocument::parse("OEBPS/toc.ncx", navigation.to_bytes().into_owned()).unwrap();
        assert_eq!(reparsed.toc("OEBPS").count(), 5);
    }
}
