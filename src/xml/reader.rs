//! Builds an [`XmlDocument`] from quick-xml events.

use super::element::{Attribute, XmlElement, XmlNode};
use super::namespace::XML_NS;
use super::{PrologNode, XmlDocument};
use crate::common::bom::{BomKind, strip_bom};
use crate::common::xml::decode_char_ref;
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

/// Namespace bindings introduced by one open element.
type Scope = Vec<(Option<String>, String)>;

/// Parse a UTF-8 XML document into an owned tree.
pub fn parse_document(bytes: &[u8]) -> Result<XmlDocument> {
    let (bom, body) = strip_bom(bytes);
    if let Some(kind) = bom
        && kind != BomKind::Utf8
    {
        return Err(Error::Xml(format!("unsupported document encoding {:?}", kind)));
    }

    let text = std::str::from_utf8(body)?;
    let mut reader = Reader::from_str(text);

    let mut prolog = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut scopes: Vec<Scope> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::Xml(format!("parse error at byte {}: {}", reader.error_position(), e))
        })?;

        match event {
            Event::Start(ref e) => {
                let (element, scope) = open_element(e, &scopes)?;
                if root.is_some() && stack.is_empty() {
                    return Err(Error::Xml("multiple root elements".to_string()));
                }
                stack.push(element);
                scopes.push(scope);
            },
            Event::Empty(ref e) => {
                let (element, _) = open_element(e, &scopes)?;
                attach(element, &mut stack, &mut root)?;
            },
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("unexpected closing tag".to_string()))?;
                scopes.pop();
                attach(element, &mut stack, &mut root)?;
            },
            Event::Text(ref e) => {
                let raw = std::str::from_utf8(e)?;
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &unescape(raw)?);
                } else if !raw.trim().is_empty() {
                    return Err(Error::Xml("text outside of the root element".to_string()));
                }
            },
            Event::GeneralRef(ref e) => {
                let name = std::str::from_utf8(e)?;
                let resolved = resolve_reference(name)?;
                match stack.last_mut() {
                    Some(parent) => push_text(parent, &resolved),
                    None => {
                        return Err(Error::Xml("entity reference outside of the root element".to_string()));
                    },
                }
            },
            Event::CData(ref e) => {
                let body = std::str::from_utf8(e)?.to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children_mut().push(XmlNode::CData(body));
                }
            },
            Event::Comment(ref e) => {
                let body = std::str::from_utf8(e)?.to_string();
                match stack.last_mut() {
                    Some(parent) => parent.children_mut().push(XmlNode::Comment(body)),
                    None if root.is_none() => prolog.push(PrologNode::Comment(body)),
                    None => {},
                }
            },
            Event::DocType(ref e) => {
                let body = std::str::from_utf8(e)?.trim().to_string();
                prolog.push(PrologNode::DocType(body));
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!("unclosed element <{}>", open.name())));
    }
    let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;
    Ok(XmlDocument { prolog, root })
}

fn open_element(e: &BytesStart<'_>, scopes: &[Scope]) -> Result<(XmlElement, Scope)> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();

    let mut attributes = Vec::new();
    let mut scope = Scope::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = unescape(std::str::from_utf8(&attr.value)?)?.into_owned();

        if key == "xmlns" {
            scope.push((None, value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value.clone()));
        }
        attributes.push(Attribute::new(key, value));
    }

    let prefix = name.split_once(':').map(|(p, _)| p);
    let namespace = lookup_namespace(prefix, &scope, scopes);
    if let Some(p) = prefix
        && namespace.is_none()
    {
        return Err(Error::Xml(format!("undeclared namespace prefix '{}' on <{}>", p, name)));
    }

    let mut element = XmlElement::new(name.as_str(), namespace.as_deref());
    for attr in attributes {
        element.set_attr(&attr.name, attr.value);
    }
    Ok((element, scope))
}

fn lookup_namespace(prefix: Option<&str>, current: &Scope, outer: &[Scope]) -> Option<String> {
    if prefix == Some("xml") {
        return Some(XML_NS.to_string());
    }
    std::iter::once(current)
        .chain(outer.iter().rev())
        .flat_map(|scope| scope.iter())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}

fn attach(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_element(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

fn push_text(parent: &mut XmlElement, text: &str) {
    if let Some(XmlNode::Text(last)) = parent.children_mut().last_mut() {
        last.push_str(text);
    } else {
        parent.children_mut().push(XmlNode::Text(text.to_string()));
    }
}

fn resolve_reference(name: &str) -> Result<String> {
    let resolved = match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => decode_char_ref(name),
    };
    resolved
        .map(String::from)
        .ok_or_else(|| Error::Xml(format!("unknown entity reference &{};", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::namespace::{DC_NS, OPF_NS};

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = br#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Il diavolo</dc:title>
  </metadata>
</package>"#;
        let doc = parse_document(xml).unwrap();
        assert!(doc.root.is(OPF_NS, "package"));
        let metadata = doc.root.find(OPF_NS, "metadata").unwrap();
        let title = metadata.find(DC_NS, "title").unwrap();
        assert_eq!(title.text(), "Il diavolo");
        assert_eq!(title.name(), "dc:title");
    }

    #[test]
    fn test_parse_unescapes_text_and_attributes() {
        let doc = parse_document(br#"<a t="x &amp; y">Tom &amp; Jerry &#233;</a>"#).unwrap();
        assert_eq!(doc.root.attr("t"), Some("x & y"));
        assert_eq!(doc.root.text(), "Tom & Jerry é");
    }

    #[test]
    fn test_parse_keeps_doctype_and_whitespace() {
        let xml = br#"<?xml version="1.0"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <head/>
</ncx>"#;
        let doc = parse_document(xml).unwrap();
        assert!(matches!(&doc.prolog[0], PrologNode::DocType(d) if d.starts_with("ncx PUBLIC")));
        assert_eq!(doc.root.children().len(), 3);
        assert_eq!(doc.root.element_count(), 1);
    }

    #[test]
    fn test_parse_skips_utf8_bom() {
        let doc = parse_document(b"\xEF\xBB\xBF<root/>").unwrap();
        assert_eq!(doc.root.name(), "root");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_document(b"").is_err());
        assert!(parse_document(b"<a><b></a>").is_err());
        assert!(parse_document(b"<a>").is_err());
        assert!(parse_document(b"<x:a/>").is_err());
        assert!(parse_document(b"<a/><b/>").is_err());
        assert!(parse_document(b"\xFF\xFE<\x00a\x00/\x00>\x00").is_err());
    }
}
