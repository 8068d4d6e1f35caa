//! Normalizes the accepted inputs into one in-memory, seekable archive.
//!
//! Paths, owned buffers, borrowed slices, and arbitrary readers all end up as
//! a `Vec<u8>` behind a [`zip::ZipArchive`], so parsing never has to care
//! where the bytes came from.

use crate::common::{Error, Result};
use std::cell::RefCell;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;

/// Where an EPUB comes from (read/append) or goes to (create).
#[derive(Debug, Clone)]
pub enum EpubSource {
    /// A file on disk. In append mode the finalized archive replaces it.
    Path(PathBuf),
    /// An archive already in memory. Finalized output stays in memory.
    Bytes(Vec<u8>),
}

impl EpubSource {
    /// Read a whole stream into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(EpubSource::Bytes(data))
    }

    /// The filesystem path, if this source is file-backed.
    pub fn path(&self) -> Option<&Path> {
        match self {
            EpubSource::Path(path) => Some(path),
            EpubSource::Bytes(_) => None,
        }
    }

    /// Load the complete source into memory.
    pub(crate) fn load(&self) -> Result<Vec<u8>> {
        match self {
            EpubSource::Path(path) => Ok(std::fs::read(path)?),
            EpubSource::Bytes(data) => Ok(data.clone()),
        }
    }
}

impl From<PathBuf> for EpubSource {
    fn from(path: PathBuf) -> Self {
        EpubSource::Path(path)
    }
}

impl From<&Path> for EpubSource {
    fn from(path: &Path) -> Self {
        EpubSource::Path(path.to_path_buf())
    }
}

impl From<&str> for EpubSource {
    fn from(path: &str) -> Self {
        EpubSource::Path(PathBuf::from(path))
    }
}

impl From<String> for EpubSource {
    fn from(path: String) -> Self {
        EpubSource::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for EpubSource {
    fn from(data: Vec<u8>) -> Self {
        EpubSource::Bytes(data)
    }
}

impl From<&[u8]> for EpubSource {
    fn from(data: &[u8]) -> Self {
        EpubSource::Bytes(data.to_vec())
    }
}

/// A member read back out of the source archive.
#[derive(Debug, Clone)]
pub struct SourceMember {
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
}

/// The original archive of a read or append session.
///
/// The archive needs `&mut` access to seek, so it lives in a `RefCell` and
/// readers can share `&self`.
pub struct SourceArchive {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
    /// File members in central-directory order
    names: Vec<String>,
}

impl SourceArchive {
    /// Parse the central directory of an in-memory archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

        let mut names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            names.push(file.name().to_string());
        }

        Ok(Self {
            archive: RefCell::new(archive),
            names,
        })
    }

    /// Member names in their original order (directories excluded).
    #[inline]
    pub fn member_names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Number of file members.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Read a member's decompressed bytes.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.read_member(name)?.data)
    }

    /// Read a member together with the compression it was stored with.
    pub fn read_member(&self, name: &str) -> Result<SourceMember> {
        if !self.contains(name) {
            return Err(Error::MemberNotFound(name.to_string()));
        }
        let mut archive = self.archive.borrow_mut();
        let mut file = archive.by_name(name)?;
        let compression = file.compression();

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(SourceMember { data, compression })
    }
}
