//! The [`Epub`] type: one open EPUB archive.
//!
//! An `Epub` ties the archive state machine ([`crate::ocf::Archive`]) to the
//! three documents every EPUB 2 book carries: the OCF container, the OPF
//! package, and the NCX navigation document. All edits happen in memory;
//! nothing is written until the book is closed or explicitly flushed.

use crate::common::id::generate_book_uuid;
use crate::common::{Error, Result};
use crate::config::OpenOptions;
use crate::ncx::{NavigationDocument, TocIter};
use crate::ocf::{
    Archive, ArchiveState, CONTAINER_PATH, Container, EPUB_MIMETYPE, EpubSource, FixedMembers, MIMETYPE_PATH,
    OpenMode, OutputTarget, SourceArchive,
};
use crate::opf::{
    Guide, GuideReference, Manifest, ManifestEntry, Metadata, MetadataMut, PackageDocument, PackageTemplate,
    Spine, SpineEntry,
};
use crate::xml::NamespaceRegistry;
use log::{debug, warn};
use std::fmt;
use std::path::Path;

/// Title written into the navigation document of a new book
const DEFAULT_NAVIGATION_TITLE: &str = "Default";

/// Placement options for [`Epub::add_part`].
///
/// # Examples
///
/// ```rust
/// use quire::PartOptions;
///
/// let options = PartOptions::new().at(2).reference_type("cover").linear(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOptions {
    /// Spine position; `None` (or past the end) appends
    pub position: Option<usize>,
    /// Guide reference `type`
    pub reference_type: String,
    /// Whether the spine entry is part of the linear reading order
    pub linear: bool,
}

impl Default for PartOptions {
    fn default() -> Self {
        Self {
            position: None,
            reference_type: "text".to_string(),
            linear: true,
        }
    }
}

impl PartOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    #[inline]
    pub fn reference_type(mut self, reference_type: impl Into<String>) -> Self {
        self.reference_type = reference_type.into();
        self
    }

    #[inline]
    pub fn linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }
}

/// An open EPUB.
///
/// # Examples
///
/// ```no_run
/// use quire::{Epub, OpenMode, PartOptions};
///
/// # fn main() -> quire::Result<()> {
/// let mut book = Epub::open("book.epub", OpenMode::Append)?;
/// book.metadata_mut()?.set("dc:title", "A New Title")?;
/// book.add_part(
///     "<html>...</html>",
///     "epilogue.xhtml",
///     "application/xhtml+xml",
///     PartOptions::new(),
/// )?;
/// book.close()?;
/// # Ok(())
/// # }
/// ```
///
/// A book dropped while still open is closed on a best-effort basis; call
/// [`Epub::close`] to see write errors.
pub struct Epub {
    archive: Archive,
    container: Container,
    package: PackageDocument,
    navigation: NavigationDocument,
    namespaces: NamespaceRegistry,
}

impl Epub {
    /// Open `source` with default options.
    pub fn open(source: impl Into<EpubSource>, mode: OpenMode) -> Result<Self> {
        Self::open_with(source, mode, &OpenOptions::default())
    }

    /// Open `source` with explicit options.
    ///
    /// In read and append mode the container, package, and navigation
    /// documents are loaded and validated; any failure aborts the open. In
    /// create mode they are generated and nothing touches `source` until the
    /// book is closed.
    pub fn open_with(source: impl Into<EpubSource>, mode: OpenMode, options: &OpenOptions) -> Result<Self> {
        let source = source.into();
        let mut archive = Archive::open(&source, mode)?.with_compression_level(options.compression_level);

        let (container, package, navigation) = match archive.source() {
            Some(source) => load_documents(source)?,
            None => create_documents(options)?,
        };
        archive.reserve(package.path());
        archive.reserve(navigation.path());

        debug!(
            "opened {:?} book, package {}, navigation {}",
            mode,
            package.path(),
            navigation.path()
        );

        Ok(Self {
            archive,
            container,
            package,
            navigation,
            namespaces: options.namespaces.clone(),
        })
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.archive.mode()
    }

    #[inline]
    pub fn state(&self) -> ArchiveState {
        self.archive.state()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.archive.is_closed()
    }

    /// The book's unique identifier (`dc:identifier` named by the package).
    pub fn identifier(&self) -> Option<String> {
        self.package.identifier()
    }

    /// Manifest id of the cover image, if declared.
    pub fn cover_id(&self) -> Option<&str> {
        self.package.cover_id()
    }

    /// Archive path of the package document.
    #[inline]
    pub fn package_path(&self) -> &str {
        self.package.path()
    }

    /// Archive path of the navigation document.
    #[inline]
    pub fn navigation_path(&self) -> &str {
        self.navigation.path()
    }

    /// Folder of the package document; manifest hrefs are relative to it.
    #[inline]
    pub fn root_folder(&self) -> &str {
        self.package.root_folder()
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    pub fn package(&self) -> &PackageDocument {
        &self.package
    }

    #[inline]
    pub fn navigation(&self) -> &NavigationDocument {
        &self.navigation
    }

    /// This book's namespace registry.
    #[inline]
    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    /// Bind a metadata key prefix for this book only.
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) {
        self.namespaces.register(prefix, uri);
    }

    /// Read-only metadata view.
    pub fn metadata(&self) -> Metadata<'_> {
        Metadata::new(&self.package, &self.namespaces)
    }

    /// Mutable metadata view.
    pub fn metadata_mut(&mut self) -> Result<MetadataMut<'_>> {
        self.archive.ensure_writable()?;
        Ok(MetadataMut::new(&mut self.package, &mut self.namespaces))
    }

    #[inline]
    pub fn manifest(&self) -> &[ManifestEntry] {
        self.package.manifest()
    }

    #[inline]
    pub fn spine(&self) -> &[SpineEntry] {
        self.package.spine()
    }

    /// Guide references; empty when the package has no guide.
    #[inline]
    pub fn guide(&self) -> &[GuideReference] {
        self.package.guide()
    }

    pub fn manifest_mut(&mut self) -> Result<Manifest<'_>> {
        self.archive.ensure_writable()?;
        Ok(Manifest::new(&mut self.package))
    }

    pub fn spine_mut(&mut self) -> Result<Spine<'_>> {
        self.archive.ensure_writable()?;
        Ok(Spine::new(&mut self.package))
    }

    /// Mutable guide view. Edits are no-ops when the package has no guide.
    pub fn guide_mut(&mut self) -> Result<Guide<'_>> {
        self.archive.ensure_writable()?;
        Ok(Guide::new(&mut self.package))
    }

    /// Table of contents, depth first.
    pub fn toc(&self) -> TocIter<'_> {
        self.navigation.toc(self.package.root_folder())
    }

    /// Store `content` at `href` (relative to the package folder) and list it
    /// in the manifest. Returns the generated manifest id.
    pub fn add_item(&mut self, content: impl Into<Vec<u8>>, href: &str, media_type: &str) -> Result<String> {
        self.archive.ensure_writable()?;
        let member = self.package.resolve_href(href);
        self.archive.check_stageable(&member)?;

        let index = Manifest::new(&mut self.package).append(ManifestEntry::new(href, media_type))?;
        let id = index
            .and_then(|i| self.package.manifest().get(i))
            .map(|item| item.id.clone())
            .ok_or_else(|| Error::InvalidPackage("missing <manifest> section".to_string()))?;

        self.archive.stage_write(&member, content.into())?;
        debug!("added item {} at {}", id, member);
        Ok(id)
    }

    /// Add a content document to the manifest and the spine.
    ///
    /// When the package has a non-empty guide, a reference titled `href` is
    /// added too: at the same position if the guide is long enough,
    /// otherwise at the end.
    pub fn add_part(
        &mut self,
        content: impl Into<Vec<u8>>,
        href: &str,
        media_type: &str,
        options: PartOptions,
    ) -> Result<String> {
        let id = self.add_item(content, href, media_type)?;

        let itemref = SpineEntry::new(id.as_str()).linear(options.linear);
        Spine::new(&mut self.package).insert(options.position.unwrap_or(usize::MAX), itemref)?;

        if !self.package.guide().is_empty() {
            let reference = GuideReference::new(href, options.reference_type).with_title(href);
            let mut guide = Guide::new(&mut self.package);
            let at = match options.position {
                Some(position) if guide.len() > position => position,
                _ => usize::MAX,
            };
            guide.insert(at, reference)?;
        }
        Ok(id)
    }

    /// Append a top-level entry to the table of contents. Returns its id.
    pub fn add_nav_point(&mut self, label: &str, href: &str) -> Result<String> {
        self.archive.ensure_writable()?;
        self.navigation.add_nav_point(label, href)
    }

    /// Names the finalized archive would contain, in output order.
    pub fn member_names(&self) -> Result<Vec<String>> {
        self.archive.ensure_open()?;
        Ok(self.archive.member_names(self.fixed_paths()))
    }

    /// Current bytes of a member.
    ///
    /// The fixed members are rendered from their in-memory documents, so
    /// pending edits are visible.
    pub fn read_member(&self, path: &str) -> Result<Vec<u8>> {
        self.archive.ensure_open()?;
        if path == MIMETYPE_PATH {
            Ok(EPUB_MIMETYPE.as_bytes().to_vec())
        } else if path == CONTAINER_PATH {
            Ok(self.container.to_bytes().into_owned())
        } else if path == self.package.path() {
            Ok(self.package.to_bytes().into_owned())
        } else if path == self.navigation.path() {
            Ok(self.navigation.to_bytes().into_owned())
        } else {
            self.archive.read(path)
        }
    }

    /// Stage raw bytes at an archive path, replacing any earlier write.
    pub fn write_member(&mut self, path: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        self.archive.stage_write(path, data.into())
    }

    /// Remove a member from the finalized archive.
    pub fn delete_member(&mut self, path: &str) -> Result<()> {
        self.archive.stage_delete(path)
    }

    /// Close the book. Writable books are finalized to where they came from:
    /// the source path, the path given at creation, or memory.
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.archive.state() {
            ArchiveState::Closed => Ok(()),
            ArchiveState::OpenRead => {
                self.archive.release();
                debug!("closed read-only book");
                Ok(())
            },
            _ => {
                let target = self.archive.default_target().clone();
                self.finalize(&target)
            },
        }
    }

    /// Finalize to `path` and close.
    pub fn write_to_disk(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.finalize(&OutputTarget::Path(path.as_ref().to_path_buf()))
    }

    /// Finalize to memory, close, and return the archive bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if !self.is_closed() {
            self.finalize(&OutputTarget::Memory)?;
        }
        self.archive
            .take_output()
            .ok_or(Error::NotWritable("archive was not finalized to memory"))
    }

    /// Archive bytes of a book finalized to memory.
    #[inline]
    pub fn output(&self) -> Option<&[u8]> {
        self.archive.output()
    }

    fn fixed_paths(&self) -> [&str; 4] {
        [MIMETYPE_PATH, CONTAINER_PATH, self.package.path(), self.navigation.path()]
    }

    fn finalize(&mut self, target: &OutputTarget) -> Result<()> {
        self.archive.begin_finalize()?;

        let fixed = FixedMembers {
            container: self.container.to_bytes(),
            package_path: self.package.path(),
            package: self.package.to_bytes(),
            navigation_path: self.navigation.path(),
            navigation: self.navigation.to_bytes(),
        };
        let result = self
            .archive
            .assemble(&fixed)
            .and_then(|bytes| self.archive.deliver(bytes, target));

        self.archive.release();
        match &result {
            Ok(()) => debug!("closed book, package rewritten: {}", self.package.is_dirty()),
            Err(err) => debug!("closed book after failed write: {}", err),
        }
        result
    }
}

impl Drop for Epub {
    fn drop(&mut self) {
        if self.archive.is_closed() {
            return;
        }
        if let Err(err) = self.close() {
            warn!("failed to finalize {} on drop: {}", self.package.path(), err);
        }
    }
}

impl fmt::Debug for Epub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Epub")
            .field("mode", &self.archive.mode())
            .field("state", &self.archive.state())
            .field("package", &self.package.path())
            .field("navigation", &self.navigation.path())
            .finish()
    }
}

/// Map a missing archive member to the error of the document being loaded.
fn read_required(source: &SourceArchive, path: &str, invalid: fn(String) -> Error) -> Result<Vec<u8>> {
    match source.read(path) {
        Err(Error::MemberNotFound(_)) => Err(invalid(format!("archive has no member {}", path))),
        other => other,
    }
}

fn load_documents(source: &SourceArchive) -> Result<(Container, PackageDocument, NavigationDocument)> {
    let container = Container::parse(read_required(source, CONTAINER_PATH, Error::InvalidContainer)?)?;

    let package_path = container.rootfile_path();
    let package = PackageDocument::parse(
        package_path,
        read_required(source, package_path, Error::InvalidPackage)?,
    )?;

    let navigation_path = package.resolve_href(package.navigation_href()?);
    let navigation = NavigationDocument::parse(
        &navigation_path,
        read_required(source, &navigation_path, Error::InvalidNavigation)?,
    )?;

    Ok((container, package, navigation))
}

fn create_documents(options: &OpenOptions) -> Result<(Container, PackageDocument, NavigationDocument)> {
    let identifier = generate_book_uuid();
    let date = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();

    let package_path = options.package_path();
    let package = PackageDocument::synthesize(
        &package_path,
        &PackageTemplate {
            identifier: &identifier,
            date: &date,
            creator: &options.creator,
            navigation_href: &options.navigation_file,
        },
    )?;
    let navigation = NavigationDocument::synthesize(
        &package.resolve_href(&options.navigation_file),
        &identifier,
        DEFAULT_NAVIGATION_TITLE,
    )?;

    Ok((Container::new(package_path), package, navigation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocf::SourceArchive;
    use crate::test_support::{
        CONTAINER_XML, build_archive, chapter, sample_epub, sample_epub_without_guide, sample_ncx, sample_opf,
    };
    use zip::CompressionMethod;

    fn open_sample(mode: OpenMode) -> Epub {
        Epub::open(sample_epub(), mode).unwrap()
    }

    fn reopen(bytes: Vec<u8>) -> Epub {
        Epub::open(bytes, OpenMode::Read).unwrap()
    }

    #[test]
    fn test_open_read() {
        let book = open_sample(OpenMode::Read);
        assert_eq!(book.mode(), OpenMode::Read);
        assert_eq!(book.identifier().as_deref(), Some("urn:uuid:1234"));
        assert_eq!(book.cover_id(), Some("cover-image"));
        assert_eq!(book.package_path(), "OEBPS/content.opf");
        assert_eq!(book.navigation_path(), "OEBPS/toc.ncx");
        assert_eq!(book.root_folder(), "OEBPS");
        assert_eq!(book.metadata().text("dc:title").unwrap(), "Il diavolo");
        assert_eq!(book.manifest().len(), 5);
        assert_eq!(book.spine().len(), 3);
        assert_eq!(book.guide().len(), 2);

        let toc: Vec<_> = book.toc().map(|entry| entry.source).collect();
        assert_eq!(toc[0], "OEBPS/chapter1.xhtml");
        assert_eq!(toc.len(), 4);
    }

    #[test]
    fn test_read_mode_rejects_mutation() {
        let mut book = open_sample(OpenMode::Read);
        assert!(matches!(book.metadata_mut(), Err(Error::NotWritable(_))));
        assert!(matches!(book.manifest_mut(), Err(Error::NotWritable(_))));
        assert!(matches!(book.spine_mut(), Err(Error::NotWritable(_))));
        assert!(matches!(book.guide_mut(), Err(Error::NotWritable(_))));
        assert!(matches!(book.add_item("x", "x.xhtml", "application/xhtml+xml"), Err(Error::NotWritable(_))));
        assert!(matches!(book.add_nav_point("x", "x.xhtml"), Err(Error::NotWritable(_))));
        assert!(matches!(book.write_member("OEBPS/x", "x"), Err(Error::NotWritable(_))));
        assert!(matches!(book.delete_member("OEBPS/chapter1.xhtml"), Err(Error::NotWritable(_))));
        assert!(matches!(book.write_to_disk("unused.epub"), Err(Error::NotWritable(_))));
        assert!(!book.is_closed());

        book.close().unwrap();
        assert!(book.is_closed());
        book.close().unwrap();
        assert!(book.output().is_none());
    }

    #[test]
    fn test_closed_book_rejects_access() {
        let mut book = open_sample(OpenMode::Append);
        book.close().unwrap();
        assert_eq!(book.state(), ArchiveState::Closed);
        assert!(matches!(book.metadata_mut(), Err(Error::NotWritable(_))));
        assert!(matches!(book.read_member("OEBPS/chapter1.xhtml"), Err(Error::NotWritable(_))));
        assert!(matches!(book.member_names(), Err(Error::NotWritable(_))));
        assert!(book.output().is_some());
        book.close().unwrap();
    }

    #[test]
    fn test_open_validation_errors() {
        let no_container = build_archive(&[("mimetype", b"application/epub+zip")]);
        assert!(matches!(
            Epub::open(no_container, OpenMode::Read),
            Err(Error::InvalidContainer(_))
        ));

        let no_package = build_archive(&[("META-INF/container.xml", CONTAINER_XML.as_bytes())]);
        assert!(matches!(Epub::open(no_package, OpenMode::Read), Err(Error::InvalidPackage(_))));

        let opf = sample_opf().replace(r#"unique-identifier="BookId""#, r#"unique-identifier="Nope""#);
        let bad_id = build_archive(&[
            ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
            ("OEBPS/content.opf", opf.as_bytes()),
        ]);
        assert!(matches!(Epub::open(bad_id, OpenMode::Read), Err(Error::InvalidPackage(_))));

        let opf = sample_opf();
        let no_ncx = build_archive(&[
            ("META-INF/container.xml", CONTAINER_XML.as_bytes()),
            ("OEBPS/content.opf", opf.as_bytes()),
        ]);
        assert!(matches!(Epub::open(no_ncx, OpenMode::Read), Err(Error::InvalidNavigation(_))));

        assert!(matches!(
            Epub::open(b"not a zip".to_vec(), OpenMode::Read),
            Err(Error::Zip(_))
        ));
        assert!(matches!(
            Epub::open("/no/such/book.epub", OpenMode::Append),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_unmodified_append_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("source.epub");
        let target_path = dir.path().join("target.epub");
        std::fs::write(&source_path, sample_epub()).unwrap();

        let mut book = Epub::open(source_path.as_path(), OpenMode::Append).unwrap();
        book.write_to_disk(&target_path).unwrap();
        assert!(book.is_closed());

        let source = SourceArchive::from_bytes(std::fs::read(&source_path).unwrap()).unwrap();
        let target = SourceArchive::from_bytes(std::fs::read(&target_path).unwrap()).unwrap();
        let mut source_names = source.member_names().to_vec();
        let mut target_names = target.member_names().to_vec();
        source_names.sort();
        target_names.sort();
        assert_eq!(source_names, target_names);
        for name in &source_names {
            assert_eq!(source.read(name).unwrap(), target.read(name).unwrap(), "{name} differs");
        }
        assert_eq!(target.member_names()[0], MIMETYPE_PATH);
    }

    #[test]
    fn test_failed_write_closes_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("source.epub");
        let original = sample_epub();
        std::fs::write(&source_path, &original).unwrap();

        let mut book = Epub::open(source_path.as_path(), OpenMode::Append).unwrap();
        book.metadata_mut().unwrap().set("dc:title", "Unsaved").unwrap();
        let result = book.write_to_disk(dir.path().join("missing").join("target.epub"));

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(book.is_closed());
        assert!(book.output().is_none());
        assert!(matches!(book.metadata_mut(), Err(Error::NotWritable(_))));
        book.close().unwrap();
        drop(book);

        assert_eq!(std::fs::read(&source_path).unwrap(), original);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_add_part_at_position() {
        let mut book = open_sample(OpenMode::Append);
        let id = book
            .add_part(chapter("Interlude"), "interlude.xhtml", "application/xhtml+xml", PartOptions::new().at(2))
            .unwrap();

        assert_eq!(book.spine().len(), 4);
        assert_eq!(book.spine()[2].idref, id);
        assert_eq!(book.spine()[2].href.as_deref(), Some("interlude.xhtml"));
        // guide has 2 references, so position 2 appends
        assert_eq!(book.guide().len(), 3);
        assert_eq!(book.guide()[2].href, "interlude.xhtml");
        assert_eq!(book.guide()[2].title.as_deref(), Some("interlude.xhtml"));
        assert_eq!(book.read_member("OEBPS/interlude.xhtml").unwrap(), chapter("Interlude").into_bytes());

        let id = book
            .add_part(chapter("Prologue"), "prologue.xhtml", "application/xhtml+xml", PartOptions::new().at(1))
            .unwrap();
        assert_eq!(book.spine()[1].idref, id);
        assert_eq!(book.guide()[1].href, "prologue.xhtml");

        let reopened = reopen(book.into_bytes().unwrap());
        let idrefs: Vec<&str> = reopened.spine().iter().map(|s| s.idref.as_str()).collect();
        assert_eq!(idrefs.len(), 5);
        assert_eq!(idrefs[0], "chapter1");
        assert_eq!(reopened.manifest().len(), 7);
        assert_eq!(
            reopened.read_member("OEBPS/prologue.xhtml").unwrap(),
            chapter("Prologue").into_bytes()
        );
    }

    #[test]
    fn test_add_part_out_of_range_appends() {
        let mut book = open_sample(OpenMode::Append);
        let id = book
            .add_part("<html/>", "end.xhtml", "application/xhtml+xml", PartOptions::new().at(99).linear(false))
            .unwrap();
        let last = book.spine().last().unwrap();
        assert_eq!(last.idref, id);
        assert!(!last.linear);

        let id = book
            .add_part("<html/>", "end2.xhtml", "application/xhtml+xml", PartOptions::new())
            .unwrap();
        assert_eq!(book.spine().last().unwrap().idref, id);
    }

    #[test]
    fn test_create_then_add_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.epub");

        let mut book = Epub::open(path.as_path(), OpenMode::Create).unwrap();
        assert!(!path.exists());
        book.metadata_mut().unwrap().set("dc:title", "Fresh").unwrap();
        book.add_part(chapter("One"), "one.xhtml", "application/xhtml+xml", PartOptions::new())
            .unwrap();
        book.close().unwrap();

        let archive = SourceArchive::from_bytes(std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            archive.member_names(),
            [
                "mimetype",
                "META-INF/container.xml",
                "OEBPS/content.opf",
                "OEBPS/toc.ncx",
                "OEBPS/one.xhtml"
            ]
        );
        assert_eq!(archive.read_member("mimetype").unwrap().compression, CompressionMethod::Stored);
        assert_eq!(archive.read("mimetype").unwrap(), EPUB_MIMETYPE.as_bytes());

        let book = Epub::open(path.as_path(), OpenMode::Read).unwrap();
        assert!(book.identifier().unwrap().starts_with("urn:uuid:"));
        assert_eq!(book.metadata().text("dc:title").unwrap(), "Fresh");
        assert_eq!(book.metadata().text("dc:creator").unwrap(), "quire");
        assert_eq!(book.spine().len(), 1);
        assert!(book.guide().is_empty());
        assert_eq!(book.toc().count(), 0);
    }

    #[test]
    fn test_create_in_memory_with_options() {
        let options = OpenOptions::new()
            .with_content_folder("OPS")
            .with_creator("")
            .with_compression_level(9);
        let mut book = Epub::open_with(Vec::new(), OpenMode::Create, &options).unwrap();
        assert_eq!(book.package_path(), "OPS/content.opf");
        assert_eq!(book.navigation_path(), "OPS/toc.ncx");
        book.add_nav_point("Start", "start.xhtml").unwrap();

        let reopened = reopen(book.into_bytes().unwrap());
        assert_eq!(reopened.package_path(), "OPS/content.opf");
        assert!(reopened.metadata().get("dc:creator").is_err());
        let toc: Vec<_> = reopened.toc().collect();
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].source, "OPS/start.xhtml");
    }

    #[test]
    fn test_missing_guide_stays_empty() {
        let mut book = Epub::open(sample_epub_without_guide(), OpenMode::Append).unwrap();
        assert_eq!(book.guide().len(), 0);
        {
            let mut guide = book.guide_mut().unwrap();
            assert_eq!(guide.append(GuideReference::new("a.xhtml", "text")).unwrap(), None);
            assert!(guide.delete_at(0).unwrap().is_none());
        }
        book.add_part("<html/>", "a.xhtml", "application/xhtml+xml", PartOptions::new().at(0))
            .unwrap();
        assert_eq!(book.guide().len(), 0);
        assert_eq!(book.spine()[0].href.as_deref(), Some("a.xhtml"));
    }

    #[test]
    fn test_metadata_set_persists() {
        let mut book = open_sample(OpenMode::Append);
        let title_attrs = book.metadata().get("dc:title").unwrap().attributes().to_vec();
        book.metadata_mut().unwrap().set("dc:title", "New").unwrap();
        assert_eq!(book.metadata().text("dc:title").unwrap(), "New");

        let reopened = reopen(book.into_bytes().unwrap());
        let title = reopened.metadata().get("dc:title").unwrap();
        assert_eq!(title.text(), "New");
        assert_eq!(title.attributes(), title_attrs.as_slice());
        // untouched navigation is copied byte for byte
        assert_eq!(reopened.read_member("OEBPS/toc.ncx").unwrap(), sample_ncx().into_bytes());
    }

    #[test]
    fn test_delete_manifest_entry() {
        let mut book = open_sample(OpenMode::Append);
        let index = book.manifest().iter().position(|m| m.id == "chapter2").unwrap();
        book.manifest_mut().unwrap().delete_at(index).unwrap();

        assert_eq!(book.manifest().len(), 4);
        assert_eq!(book.spine().len(), 2);
        let section = book.package().section("manifest").unwrap();
        // the skipped <item> without href is still there
        assert_eq!(section.element_count(), book.manifest().len() + 1);

        let reopened = reopen(book.into_bytes().unwrap());
        assert!(reopened.manifest().iter().all(|m| m.id != "chapter2"));
    }

    #[test]
    fn test_member_staging() {
        let mut book = open_sample(OpenMode::Append);
        book.write_member("OEBPS/style.css", "p { margin: 0 }").unwrap();
        book.write_member("OEBPS/style.css", "p { margin: 1em }").unwrap();
        book.delete_member("OEBPS/chapter3.xhtml").unwrap();

        for path in [MIMETYPE_PATH, CONTAINER_PATH, "OEBPS/content.opf", "OEBPS/toc.ncx"] {
            assert!(matches!(book.write_member(path, "x"), Err(Error::ReservedMember(_))));
            assert!(matches!(book.delete_member(path), Err(Error::ReservedMember(_))));
        }
        assert!(matches!(
            book.add_item("x", "content.opf", "application/xhtml+xml"),
            Err(Error::ReservedMember(_))
        ));
        assert_eq!(book.manifest().len(), 5);

        assert_eq!(book.read_member("OEBPS/style.css").unwrap(), b"p { margin: 1em }");
        assert!(matches!(
            book.read_member("OEBPS/chapter3.xhtml"),
            Err(Error::MemberNotFound(_))
        ));
        assert!(matches!(book.delete_member("OEBPS/ghost.xhtml"), Err(Error::MemberNotFound(_))));

        let names = book.member_names().unwrap();
        assert_eq!(&names[..4], book.fixed_paths());
        assert!(names.contains(&"OEBPS/style.css".to_string()));
        assert!(!names.contains(&"OEBPS/chapter3.xhtml".to_string()));

        let archive = SourceArchive::from_bytes(book.into_bytes().unwrap()).unwrap();
        assert_eq!(archive.read("OEBPS/style.css").unwrap(), b"p { margin: 1em }");
        assert!(!archive.contains("OEBPS/chapter3.xhtml"));
        assert_eq!(
            archive.read_member("OEBPS/images/cover.png").unwrap().compression,
            CompressionMethod::Stored
        );
    }

    #[test]
    fn test_drop_finalizes_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        std::fs::write(&path, sample_epub()).unwrap();

        {
            let mut book = Epub::open(path.as_path(), OpenMode::Append).unwrap();
            book.metadata_mut().unwrap().set("dc:title", "Dropped").unwrap();
        }

        let book = Epub::open(path.as_path(), OpenMode::Read).unwrap();
        assert_eq!(book.metadata().text("dc:title").unwrap(), "Dropped");
    }

    #[test]
    fn test_namespace_registrations_are_per_book() {
        let mut first = open_sample(OpenMode::Append);
        let second = open_sample(OpenMode::Append);
        first.register_namespace("calibre", "http://calibre.kovidgoyal.net/2009/metadata");
        first.metadata_mut().unwrap().set("calibre:series", "Opere").unwrap();

        assert!(first.metadata().get("calibre:series").is_ok());
        assert!(matches!(
            second.metadata().get("calibre:series"),
            Err(Error::UnknownNamespacePrefix(_))
        ));
    }
}
