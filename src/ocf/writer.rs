//! OCF archive writing.
//!
//! EPUB readers sniff the first local header of the archive, so the
//! `mimetype` member has to come first and be stored uncompressed.
//! [`PackageWriter`] enforces that ordering and tracks which names have
//! already been written so one member never appears twice.

use super::container::{EPUB_MIMETYPE, MIMETYPE_PATH};
use crate::common::{Error, Result};
use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Builder for an EPUB (OCF) ZIP archive
///
/// # Examples
///
/// ```no_run
/// # use quire::ocf::PackageWriter;
/// # use quire::Result;
/// # fn example() -> Result<()> {
/// let mut writer = PackageWriter::new()?;
/// writer.add_file("META-INF/container.xml", b"<container>...</container>")?;
/// writer.add_file("OEBPS/content.opf", b"<package>...</package>")?;
///
/// let bytes = writer.finish_to_bytes()?;
/// std::fs::write("book.epub", bytes)?;
/// # Ok(())
/// # }
/// ```
pub struct PackageWriter<W: Write + Seek> {
    zip_writer: ZipWriter<W>,
    compression_level: Option<i64>,
    written: HashSet<String>,
}

impl PackageWriter<Cursor<Vec<u8>>> {
    /// Create a package writer that writes to memory
    pub fn new() -> Result<Self> {
        Self::with_writer(Cursor::new(Vec::new()))
    }

    /// Finish writing and return the bytes
    pub fn finish_to_bytes(self) -> Result<Vec<u8>> {
        let cursor = self.finish()?;
        Ok(cursor.into_inner())
    }
}

impl<W: Write + Seek> PackageWriter<W> {
    /// Create a package writer over `writer` and emit the mimetype member.
    pub fn with_writer(writer: W) -> Result<Self> {
        let mut package = Self {
            zip_writer: ZipWriter::new(writer),
            compression_level: None,
            written: HashSet::new(),
        };
        package.write_entry(MIMETYPE_PATH, EPUB_MIMETYPE.as_bytes(), CompressionMethod::Stored)?;
        Ok(package)
    }

    /// Deflate level for compressed members (`None` = library default)
    pub fn with_compression_level(mut self, level: Option<i64>) -> Self {
        self.compression_level = level;
        self
    }

    /// Add a deflated member.
    #[inline]
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.write_entry(path, content, CompressionMethod::Deflated)
    }

    /// Add a member stored without compression.
    #[inline]
    pub fn add_stored(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.write_entry(path, content, CompressionMethod::Stored)
    }

    /// Add a member with an explicit compression method.
    ///
    /// Anything other than stored is written deflated.
    pub fn add_file_with_method(&mut self, path: &str, content: &[u8], method: CompressionMethod) -> Result<()> {
        match method {
            CompressionMethod::Stored => self.add_stored(path, content),
            _ => self.add_file(path, content),
        }
    }

    fn write_entry(&mut self, path: &str, content: &[u8], method: CompressionMethod) -> Result<()> {
        if !self.written.insert(path.to_string()) {
            return Err(Error::Zip(zip::result::ZipError::InvalidArchive(
                "duplicate member name".into(),
            )));
        }

        let options = match method {
            CompressionMethod::Stored => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            _ => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(self.compression_level),
        };

        self.zip_writer.start_file(path, options)?;
        self.zip_writer.write_all(content)?;
        Ok(())
    }

    /// Finish the ZIP archive and return the underlying writer
    pub fn finish(self) -> Result<W> {
        let writer = self.zip_writer.finish()?;
        Ok(writer)
    }
}
