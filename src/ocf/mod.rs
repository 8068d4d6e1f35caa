//! OCF container layer: the ZIP archive an EPUB lives in.
//!
//! - [`source`]: normalizes paths, buffers, and readers into a seekable archive
//! - [`container`]: `META-INF/container.xml`
//! - [`staging`]: pending member writes/deletions
//! - [`writer`]: ZIP output with the mandatory `mimetype` member first
//! - [`archive`]: open modes and the finalize state machine

pub mod archive;
pub mod container;
pub mod source;
pub mod staging;
pub mod writer;

pub use archive::{Archive, ArchiveState, FixedMembers, OpenMode, OutputTarget};
pub use container::{CONTAINER_PATH, Container, EPUB_MIMETYPE, MIMETYPE_PATH, OPF_MEDIA_TYPE};
pub use source::{EpubSource, SourceArchive, SourceMember};
pub use staging::Staging;
pub use writer::PackageWriter;
