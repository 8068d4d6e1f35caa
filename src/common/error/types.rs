//! Unified error type for quire.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! distinguishes structural problems found while opening a container from
//! misuse of a live instance and from failures of the underlying byte source.
use thiserror::Error;

/// Main error type for quire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `META-INF/container.xml` is missing, malformed, or names no rootfile
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// Package document is missing, malformed, or has no usable identifier
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// Navigation document could not be located or parsed
    #[error("Invalid navigation: {0}")]
    InvalidNavigation(String),

    /// Mutation attempted on a read-only or closed instance
    #[error("Not writable: {0}")]
    NotWritable(&'static str),

    /// Metadata key has no matching element
    #[error("Metadata key not found: {0}")]
    KeyNotFound(String),

    /// Metadata key uses a prefix that was never registered
    #[error("Unknown namespace prefix: {0}")]
    UnknownNamespacePrefix(String),

    /// Collection index outside the current bounds
    #[error("Index {index} out of bounds for collection of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Manifest id already in use
    #[error("Duplicate manifest id: {0}")]
    DuplicateId(String),

    /// Spine idref that names no manifest item
    #[error("No manifest item with id: {0}")]
    UnknownManifestId(String),

    /// Archive member not present
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Member owned by the container itself and rebuilt on finalize
    #[error("Reserved member cannot be staged: {0}")]
    ReservedMember(String),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Whether the error comes from the underlying byte source rather than
    /// from the container's structure or the caller's usage.
    pub fn is_underlying_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Zip(_))
    }
}

/// Result type for quire operations.
pub type Result<T> = std::result::Result<T, Error>;
