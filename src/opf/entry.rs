//! Typed manifest, spine, and guide entries.

use super::collection::{CollectionEntry, remove_matching};
use super::package::PackageDocument;
use crate::common::id::generate_item_id;
use crate::common::{Error, Result};
use crate::xml::XmlElement;

/// An `<item>` of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Unique within the manifest; left empty to have one generated
    pub id: String,
    /// Relative to the package document's folder
    pub href: String,
    pub media_type: String,
}

impl ManifestEntry {
    /// Entry whose id is generated on insertion.
    pub fn new(href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::with_id(String::new(), href, media_type)
    }

    pub fn with_id(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
        }
    }
}

impl CollectionEntry for ManifestEntry {
    const SECTION: &'static str = "manifest";
    const TAG: &'static str = "item";

    fn from_element(element: &XmlElement) -> Option<Self> {
        Some(Self {
            id: element.attr("id")?.to_string(),
            href: element.attr("href")?.to_string(),
            media_type: element.attr("media-type")?.to_string(),
        })
    }

    fn write(&self, element: XmlElement) -> XmlElement {
        element
            .with_attr("id", self.id.as_str())
            .with_attr("href", self.href.as_str())
            .with_attr("media-type", self.media_type.as_str())
    }

    fn entries(package: &PackageDocument) -> &Vec<Self> {
        &package.manifest
    }

    fn entries_mut(package: &mut PackageDocument) -> &mut Vec<Self> {
        &mut package.manifest
    }

    fn prepare(&mut self, package: &PackageDocument) -> Result<()> {
        let taken = |id: &str| package.manifest.iter().any(|m| m.id == id);
        if self.id.is_empty() {
            let mut id = generate_item_id();
            while taken(&id) {
                id = generate_item_id();
            }
            self.id = id;
        } else if taken(&self.id) {
            return Err(Error::DuplicateId(self.id.clone()));
        }
        Ok(())
    }

    /// The navigation document must stay in the manifest.
    fn check_removable(&self, package: &PackageDocument) -> Result<()> {
        if package.toc_id() == Some(self.id.as_str()) {
            return Err(Error::InvalidPackage(format!(
                "cannot remove '{}', the spine's toc names it",
                self.id
            )));
        }
        Ok(())
    }

    /// Spine entries may only name manifest items, so they go too.
    fn removed(package: &mut PackageDocument, entry: &Self) {
        remove_matching::<SpineEntry, _>(package, |s| s.idref == entry.id);
    }
}

/// An `<itemref>` of the spine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineEntry {
    pub idref: String,
    pub linear: bool,
    /// href of the referenced manifest item, filled in by the package
    pub href: Option<String>,
}

impl SpineEntry {
    /// Linear entry for manifest item `idref`.
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            linear: true,
            href: None,
        }
    }

    pub fn linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }
}

impl CollectionEntry for SpineEntry {
    const SECTION: &'static str = "spine";
    const TAG: &'static str = "itemref";

    fn from_element(element: &XmlElement) -> Option<Self> {
        Some(Self {
            idref: element.attr("idref")?.to_string(),
            linear: element.attr("linear") != Some("no"),
            href: None,
        })
    }

    fn write(&self, element: XmlElement) -> XmlElement {
        element
            .with_attr("idref", self.idref.as_str())
            .with_attr("linear", if self.linear { "yes" } else { "no" })
    }

    fn entries(package: &PackageDocument) -> &Vec<Self> {
        &package.spine
    }

    fn entries_mut(package: &mut PackageDocument) -> &mut Vec<Self> {
        &mut package.spine
    }

    fn prepare(&mut self, package: &PackageDocument) -> Result<()> {
        let item = package
            .manifest
            .iter()
            .find(|m| m.id == self.idref)
            .ok_or_else(|| Error::UnknownManifestId(self.idref.clone()))?;
        self.href = Some(item.href.clone());
        Ok(())
    }
}

/// A `<reference>` of the guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideReference {
    pub href: String,
    pub reference_type: Option<String>,
    pub title: Option<String>,
}

impl GuideReference {
    pub fn new(href: impl Into<String>, reference_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            reference_type: Some(reference_type.into()),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl CollectionEntry for GuideReference {
    const SECTION: &'static str = "guide";
    const TAG: &'static str = "reference";

    fn from_element(element: &XmlElement) -> Option<Self> {
        Some(Self {
            href: element.attr("href")?.to_string(),
            reference_type: element.attr("type").map(str::to_string),
            title: element.attr("title").map(str::to_string),
        })
    }

    fn write(&self, mut element: XmlElement) -> XmlElement {
        if let Some(reference_type) = &self.reference_type {
            element.set_attr("type", reference_type.as_str());
        }
        if let Some(title) = &self.title {
            element.set_attr("title", title.as_str());
        }
        element.with_attr("href", self.href.as_str())
    }

    fn entries(package: &PackageDocument) -> &Vec<Self> {
        &package.guide
    }

    fn entries_mut(package: &mut PackageDocument) -> &mut Vec<Self> {
        &mut package.guide
    }
}
