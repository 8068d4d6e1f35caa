//! NCX navigation document (EPUB 2 table of contents).

pub mod navigation;

pub use navigation::{MISSING_LABEL, NavigationDocument, TocEntry, TocIter};
