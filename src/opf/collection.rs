//! Ordered views over the manifest, spine, and guide sections.
//!
//! Each section is kept twice: as a `Vec` of typed entries for cheap reads,
//! and as child elements of the package tree for serialization. The i-th
//! entry always corresponds to the i-th *qualifying* child element, i.e. one
//! with the expected tag and required attributes. Children that did not
//! qualify at load time (comments, unknown tags, items missing attributes)
//! are left where they are and never counted.

use super::package::{PackageDocument, is_opf_element};
use crate::common::{Error, Result};
use crate::xml::XmlElement;
use log::debug;
use std::marker::PhantomData;

/// A typed child of one of the package's ordered sections.
pub trait CollectionEntry: Clone + Sized {
    /// Local name of the section element
    const SECTION: &'static str;
    /// Local name of each entry element
    const TAG: &'static str;

    /// Build an entry from an element, or `None` if required attributes are
    /// missing.
    fn from_element(element: &XmlElement) -> Option<Self>;

    /// Write this entry's attributes onto a freshly created element.
    fn write(&self, element: XmlElement) -> XmlElement;

    fn entries(package: &PackageDocument) -> &Vec<Self>;

    fn entries_mut(package: &mut PackageDocument) -> &mut Vec<Self>;

    /// Validate and complete an entry before it is inserted.
    fn prepare(&mut self, _package: &PackageDocument) -> Result<()> {
        Ok(())
    }

    /// Refuse removal of an entry other parts of the package depend on.
    fn check_removable(&self, _package: &PackageDocument) -> Result<()> {
        Ok(())
    }

    /// Follow-up after an entry was removed from both structures.
    fn removed(_package: &mut PackageDocument, _entry: &Self) {}
}

/// Collect the qualifying entries of a section, skipping the rest.
pub(crate) fn collect_entries<E: CollectionEntry>(section: &XmlElement) -> Vec<E> {
    let mut entries = Vec::new();
    for element in section.elements().filter(|el| is_opf_element(el, E::TAG)) {
        match E::from_element(element) {
            Some(entry) => entries.push(entry),
            None => debug!("skipping <{}> in <{}> without required attributes", E::TAG, E::SECTION),
        }
    }
    entries
}

fn qualifying_positions<E: CollectionEntry>(section: &XmlElement) -> Vec<usize> {
    section.element_positions(|el| is_opf_element(el, E::TAG) && E::from_element(el).is_some())
}

/// Name and namespace for a new child, following the section's own prefix.
fn child_name(section: &XmlElement, local: &str) -> (String, Option<String>) {
    let name = match section.prefix() {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    };
    (name, section.namespace().map(str::to_string))
}

/// Remove entry `index` from the sequence and the tree. `index` must be in
/// bounds.
fn remove_entry<E: CollectionEntry>(package: &mut PackageDocument, index: usize) -> E {
    let raw = package
        .section(E::SECTION)
        .and_then(|section| qualifying_positions::<E>(section).get(index).copied());

    let removed = E::entries_mut(package).remove(index);
    if let Some(raw) = raw
        && let Some(section) = package.section_mut(E::SECTION)
    {
        section.remove_element_trimmed(raw);
    }
    package.mark_dirty();
    removed
}

/// Mutable ordered view over one package section.
///
/// Obtained from [`crate::Epub::manifest_mut`], [`crate::Epub::spine_mut`], or
/// [`crate::Epub::guide_mut`].
pub struct CollectionView<'a, E: CollectionEntry> {
    package: &'a mut PackageDocument,
    marker: PhantomData<E>,
}

impl<'a, E: CollectionEntry> CollectionView<'a, E> {
    pub(crate) fn new(package: &'a mut PackageDocument) -> Self {
        Self {
            package,
            marker: PhantomData,
        }
    }

    /// Whether the section exists in the package document. Only the guide
    /// can be absent; an absent section behaves as a permanently empty one.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.package.section(E::SECTION).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        E::entries(self.package).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        E::entries(self.package).is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&E> {
        E::entries(self.package).get(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[E] {
        E::entries(self.package)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        E::entries(self.package).iter()
    }

    /// Append an entry. Returns its index, or `None` if the section is absent.
    #[inline]
    pub fn append(&mut self, entry: E) -> Result<Option<usize>> {
        self.insert(usize::MAX, entry)
    }

    /// Insert an entry before `index` (clamped to the end).
    ///
    /// Returns the index the entry landed at, or `None` if the section is
    /// absent and nothing was done.
    pub fn insert(&mut self, index: usize, mut entry: E) -> Result<Option<usize>> {
        let Some(section) = self.package.section(E::SECTION) else {
            debug!("no <{}> section, ignoring insert", E::SECTION);
            return Ok(None);
        };
        let positions = qualifying_positions::<E>(section);
        let (name, namespace) = child_name(section, E::TAG);

        entry.prepare(self.package)?;
        let element = entry.write(XmlElement::new(name, namespace.as_deref()));

        let entries = E::entries_mut(self.package);
        let index = index.min(entries.len());
        entries.insert(index, entry);

        if let Some(section) = self.package.section_mut(E::SECTION) {
            section.insert_element_indented(positions.get(index).copied(), element);
        }
        self.package.mark_dirty();
        Ok(Some(index))
    }

    /// Remove the entry at `index`.
    ///
    /// Returns `None` if the section is absent.
    pub fn delete_at(&mut self, index: usize) -> Result<Option<E>> {
        if !self.is_present() {
            debug!("no <{}> section, ignoring delete", E::SECTION);
            return Ok(None);
        }
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let package = &*self.package;
        E::entries(package)[index].check_removable(package)?;

        let removed = remove_entry::<E>(self.package, index);
        E::removed(self.package, &removed);
        Ok(Some(removed))
    }

    /// Index of the first entry matching `pred`.
    pub fn position<P>(&self, pred: P) -> Option<usize>
    where
        P: FnMut(&E) -> bool,
    {
        self.iter().position(pred)
    }
}

impl<'v, 'a, E: CollectionEntry> IntoIterator for &'v CollectionView<'a, E> {
    type Item = &'v E;
    type IntoIter = std::slice::Iter<'v, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Remove every entry matching `pred` from one section.
pub(crate) fn remove_matching<E, P>(package: &mut PackageDocument, mut pred: P)
where
    E: CollectionEntry,
    P: FnMut(&E) -> bool,
{
    while let Some(index) = E::entries(package).iter().position(&mut pred) {
        remove_entry::<E>(package, index);
    }
}
