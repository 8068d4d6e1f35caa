//! Quire - A Rust library for reading and editing EPUB 2 books
//!
//! This library opens an EPUB archive, exposes its package metadata,
//! manifest, spine, guide, and table of contents, lets callers edit them in
//! memory, and writes a well-formed archive back out.
//!
//! # Features
//!
//! - **Three open modes**: read-only, append (edit in place), and create
//! - **Metadata editing**: Get, set, add, and delete Dublin Core and custom
//!   metadata elements by prefixed or `{uri}local` keys
//! - **Collections**: Manifest, spine, and guide views that keep the XML tree
//!   and the parsed entries in lockstep
//! - **Table of contents**: Lazy depth-first walk over the NCX navigation map
//! - **Faithful output**: Unmodified documents and members are copied back
//!   byte for byte; `mimetype` is always the first, uncompressed member
//!
//! # Example - Reading a book
//!
//! ```no_run
//! use quire::{Epub, OpenMode};
//!
//! # fn main() -> quire::Result<()> {
//! let book = Epub::open("book.epub", OpenMode::Read)?;
//! println!("Title: {}", book.metadata().text("dc:title")?);
//!
//! for entry in book.toc() {
//!     println!("{} -> {}", entry.label, entry.source);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Creating a book
//!
//! ```no_run
//! use quire::{Epub, OpenMode, PartOptions};
//!
//! # fn main() -> quire::Result<()> {
//! let mut book = Epub::open("new.epub", OpenMode::Create)?;
//! book.metadata_mut()?.set("dc:title", "My Book")?;
//! book.metadata_mut()?.set("dc:language", "en")?;
//! book.add_part(
//!     "<html xmlns=\"http://www.w3.org/1999/xhtml\"><body/></html>",
//!     "chapter1.xhtml",
//!     "application/xhtml+xml",
//!     PartOptions::new(),
//! )?;
//! book.add_nav_point("Chapter 1", "chapter1.xhtml")?;
//! book.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Editing in memory
//!
//! ```no_run
//! use quire::{Epub, OpenMode};
//!
//! # fn main() -> quire::Result<()> {
//! let bytes = std::fs::read("book.epub")?;
//! let mut book = Epub::open(bytes, OpenMode::Append)?;
//! book.register_namespace("calibre", "http://calibre.kovidgoyal.net/2009/metadata");
//! book.metadata_mut()?.set("calibre:series", "Collected Works")?;
//! let edited: Vec<u8> = book.into_bytes()?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod config;
pub mod epub;
pub mod ncx;
pub mod ocf;
pub mod opf;
pub mod xml;

#[cfg(test)]
mod test_support;

pub use common::{Error, Result};
pub use config::OpenOptions;
pub use epub::{Epub, PartOptions};
pub use ncx::{TocEntry, TocIter};
pub use ocf::{ArchiveState, EpubSource, OpenMode};
pub use opf::{
    CollectionEntry, CollectionView, Guide, GuideReference, Manifest, ManifestEntry, Metadata, MetadataMut,
    MetadataValue, Spine, SpineEntry,
};
pub use xml::{Attribute, NamespaceRegistry, XmlElement};
