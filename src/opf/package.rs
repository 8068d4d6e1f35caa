//! The OPF package document.
//!
//! Holds the parsed tree together with typed copies of the manifest, spine,
//! and guide (see [`super::collection`] for how the two are kept in step).
//! A package that was never mutated serializes back to its original bytes.

use super::collection::collect_entries;
use super::entry::{GuideReference, ManifestEntry, SpineEntry};
use crate::common::xml::{escape_attr, escape_text};
use crate::common::{Error, Result};
use crate::xml::namespace::{DC_NS, OPF_NS};
use crate::xml::{XmlDocument, XmlElement};
use log::debug;
use std::borrow::Cow;

/// Media type of an NCX navigation document
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
/// `unique-identifier` used by newly created books
pub const DEFAULT_UNIQUE_ID: &str = "BookId";
/// Manifest id of the NCX in newly created books
pub const DEFAULT_NCX_ID: &str = "ncx";

/// Whether `element` is an OPF element named `local`.
///
/// Some packages omit the namespace altogether; those are accepted too.
pub(crate) fn is_opf_element(element: &XmlElement, local: &str) -> bool {
    element.local_name() == local && matches!(element.namespace(), None | Some(OPF_NS))
}

/// Values a new package is stamped with.
#[derive(Debug, Clone)]
pub struct PackageTemplate<'a> {
    pub identifier: &'a str,
    pub date: &'a str,
    pub creator: &'a str,
    pub navigation_href: &'a str,
}

/// Parsed OPF package document.
#[derive(Debug, Clone)]
pub struct PackageDocument {
    path: String,
    root_folder: String,
    document: XmlDocument,
    original: Option<Vec<u8>>,
    dirty: bool,
    pub(crate) manifest: Vec<ManifestEntry>,
    pub(crate) spine: Vec<SpineEntry>,
    pub(crate) guide: Vec<GuideReference>,
}

impl PackageDocument {
    /// Parse and validate the package document found at archive `path`.
    pub fn parse(path: &str, bytes: Vec<u8>) -> Result<Self> {
        let document = XmlDocument::parse(&bytes).map_err(Error::in_package)?;
        let mut package = Self::from_document(path, document)?;
        package.original = Some(bytes);
        package.dirty = false;
        Ok(package)
    }

    /// Build the package of a new book.
    pub fn synthesize(path: &str, template: &PackageTemplate<'_>) -> Result<Self> {
        let creator = if template.creator.is_empty() {
            String::new()
        } else {
            format!("\n    <dc:creator>{}</dc:creator>", escape_text(template.creator))
        };

        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="{opf}" unique-identifier="{uid_ref}" version="2.0">
  <metadata xmlns:dc="{dc}" xmlns:opf="{opf}">
    <dc:identifier id="{uid_ref}" opf:scheme="UUID">{identifier}</dc:identifier>
    <dc:title></dc:title>
    <dc:language></dc:language>
    <dc:date opf:event="modification">{date}</dc:date>{creator}
  </metadata>
  <manifest>
    <item href="{ncx_href}" id="{ncx_id}" media-type="{ncx_type}"/>
  </manifest>
  <spine toc="{ncx_id}">
  </spine>
  <guide>
  </guide>
</package>
"#,
            opf = OPF_NS,
            dc = DC_NS,
            uid_ref = DEFAULT_UNIQUE_ID,
            identifier = escape_text(template.identifier),
            date = escape_text(template.date),
            creator = creator,
            ncx_href = escape_attr(template.navigation_href),
            ncx_id = DEFAULT_NCX_ID,
            ncx_type = NCX_MEDIA_TYPE,
        );

        let document = XmlDocument::parse(xml.as_bytes()).map_err(Error::in_package)?;
        let mut package = Self::from_document(path, document)?;
        package.dirty = true;
        Ok(package)
    }

    fn from_document(path: &str, document: XmlDocument) -> Result<Self> {
        if document.root.local_name() != "package" {
            return Err(Error::InvalidPackage(format!(
                "root element is <{}>, expected <package>",
                document.root.name()
            )));
        }

        let section = |local: &str| {
            document
                .root
                .elements()
                .find(|el| is_opf_element(el, local))
                .ok_or_else(|| Error::InvalidPackage(format!("missing <{}> section", local)))
        };
        section("metadata")?;
        let manifest = collect_entries::<ManifestEntry>(section("manifest")?);
        let spine = collect_entries::<SpineEntry>(section("spine")?);
        let guide = section("guide")
            .map(collect_entries::<GuideReference>)
            .unwrap_or_default();

        let mut package = Self {
            path: path.to_string(),
            root_folder: parent_folder(path).to_string(),
            document,
            original: None,
            dirty: true,
            manifest,
            spine,
            guide,
        };
        package.link_spine();

        if package.identifier().is_none() {
            return Err(Error::InvalidPackage(
                "unique-identifier does not name a dc:identifier".to_string(),
            ));
        }

        debug!(
            "loaded package {}: {} manifest items, {} spine entries, {} guide references",
            package.path,
            package.manifest.len(),
            package.spine.len(),
            package.guide.len()
        );
        Ok(package)
    }

    /// Annotate every spine entry with its manifest item's href.
    fn link_spine(&mut self) {
        for entry in &mut self.spine {
            entry.href = self
                .manifest
                .iter()
                .find(|item| item.id == entry.idref)
                .map(|item| item.href.clone());
            if entry.href.is_none() {
                debug!("spine itemref '{}' has no manifest item", entry.idref);
            }
        }
    }

    /// Archive path of the package document.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Folder containing the package document (`""` at the archive root).
    #[inline]
    pub fn root_folder(&self) -> &str {
        &self.root_folder
    }

    /// Archive path of an href relative to the package document.
    pub fn resolve_href(&self, href: &str) -> String {
        join_path(&self.root_folder, href)
    }

    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.document.root
    }

    /// A top-level OPF section (`metadata`, `manifest`, `spine`, `guide`).
    pub(crate) fn section(&self, local: &str) -> Option<&XmlElement> {
        self.document.root.elements().find(|el| is_opf_element(el, local))
    }

    pub(crate) fn section_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.document
            .root
            .elements_mut()
            .find(|el| is_opf_element(el, local))
    }

    /// The `<metadata>` element. Presence is checked at load time.
    pub fn metadata_section(&self) -> Option<&XmlElement> {
        self.section("metadata")
    }

    #[inline]
    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    #[inline]
    pub fn spine(&self) -> &[SpineEntry] {
        &self.spine
    }

    #[inline]
    pub fn guide(&self) -> &[GuideReference] {
        &self.guide
    }

    #[inline]
    pub fn has_guide(&self) -> bool {
        self.section("guide").is_some()
    }

    /// Manifest item with the given id.
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Value of the package's `unique-identifier` attribute.
    pub fn unique_identifier_ref(&self) -> Option<&str> {
        self.document.root.attr("unique-identifier")
    }

    /// The `dc:identifier` element named by `unique-identifier`.
    pub fn identifier_element(&self) -> Option<&XmlElement> {
        let id = self.unique_identifier_ref()?;
        find_descendant(self.metadata_section()?, &|el: &XmlElement| {
            el.is(DC_NS, "identifier") && el.attr("id") == Some(id)
        })
    }

    /// Text of the unique identifier.
    pub fn identifier(&self) -> Option<String> {
        self.identifier_element().map(XmlElement::text)
    }

    /// Manifest id of the cover image, from `<meta name="cover">`.
    pub fn cover_id(&self) -> Option<&str> {
        let meta = find_descendant(self.metadata_section()?, &|el: &XmlElement| {
            is_opf_element(el, "meta") && el.attr("name") == Some("cover")
        })?;
        meta.attr("content")
    }

    /// Manifest id named by the spine's `toc` attribute.
    pub fn toc_id(&self) -> Option<&str> {
        self.section("spine")?.attr("toc")
    }

    /// Manifest href of the navigation document named by the spine's `toc`.
    pub fn navigation_href(&self) -> Result<&str> {
        let toc = self
            .toc_id()
            .ok_or_else(|| Error::InvalidNavigation("spine has no toc attribute".to_string()))?;
        self.manifest_item(toc)
            .map(|item| item.href.as_str())
            .ok_or_else(|| Error::InvalidNavigation(format!("toc id '{}' is not in the manifest", toc)))
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Bytes to write on finalize.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match &self.original {
            Some(bytes) if !self.dirty => Cow::Borrowed(bytes),
            _ => Cow::Owned(self.document.to_bytes()),
        }
    }
}

fn find_descendant<'e>(element: &'e XmlElement, pred: &dyn Fn(&XmlElement) -> bool) -> Option<&'e XmlElement> {
    element
        .elements()
        .find_map(|child| if pred(child) { Some(child) } else { find_descendant(child, pred) })
}

/// Folder part of an archive path.
pub(crate) fn parent_folder(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(folder, _)| folder)
}

/// Join an archive folder and a relative href.
pub(crate) fn join_path(folder: &str, href: &str) -> String {
    let href = href.trim_start_matches("./");
    if folder.is_empty() {
        href.to_string()
    } else {
        format!("{}/{}", folder, href)
    }
}
