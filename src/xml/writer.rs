//! Serializes an [`XmlDocument`] back to UTF-8 bytes.

use super::element::{XmlElement, XmlNode};
use super::{PrologNode, XmlDocument};
use crate::common::xml::{escape_attr, escape_text};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize a document, prefixed with a UTF-8 XML declaration.
pub fn write_document(doc: &XmlDocument) -> Vec<u8> {
    let mut xml = String::with_capacity(4096);

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    for node in &doc.prolog {
        match node {
            PrologNode::DocType(body) => {
                xml.push_str("<!DOCTYPE ");
                xml.push_str(body);
                xml.push('>');
            },
            PrologNode::Comment(body) => {
                xml.push_str("<!--");
                xml.push_str(body);
                xml.push_str("-->");
            },
        }
        xml.push('\n');
    }
    write_element(&doc.root, &mut xml);
    xml.push('\n');

    xml.into_bytes()
}

/// Serialize a single element and its subtree.
pub fn write_element(element: &XmlElement, xml: &mut String) {
    xml.push('<');
    xml.push_str(element.name());
    for attr in element.attributes() {
        xml.push(' ');
        xml.push_str(&attr.name);
        xml.push_str("=\"");
        xml.push_str(&escape_attr(&attr.value));
        xml.push('"');
    }

    if element.children().is_empty() {
        xml.push_str("/>");
        return;
    }
    xml.push('>');

    for child in element.children() {
        match child {
            XmlNode::Element(el) => write_element(el, xml),
            XmlNode::Text(text) => xml.push_str(&escape_text(text)),
            XmlNode::Comment(body) => {
                xml.push_str("<!--");
                xml.push_str(body);
                xml.push_str("-->");
            },
            XmlNode::CData(body) => {
                xml.push_str("<![CDATA[");
                xml.push_str(body);
                xml.push_str("]]>");
            },
        }
    }

    xml.push_str("</");
    xml.push_str(element.name());
    xml.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::reader::parse_document;

    #[test]
    fn test_write_escapes_and_collapses_empty() {
        let root = XmlElement::new("item", None)
            .with_attr("href", "a&b.xhtml")
            .with_child(XmlElement::new("empty", None))
            .with_text("1 < 2");
        let doc = XmlDocument::new(root);
        let out = String::from_utf8(write_document(&doc)).unwrap();

        assert!(out.starts_with(XML_DECLARATION));
        assert!(out.contains(r#"<item href="a&amp;b.xhtml">1 &lt; 2<empty/></item>"#));
    }

    #[test]
    fn test_reparse_preserves_structure() {
        let xml = br#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <docTitle><text>Tom &amp; Jerry</text></docTitle>
  <!-- nav -->
  <navMap><![CDATA[raw <b>]]></navMap>
</ncx>"#;
        let doc = parse_document(xml).unwrap();
        let again = parse_document(&write_document(&doc)).unwrap();
        assert_eq!(doc, again);
    }
}
