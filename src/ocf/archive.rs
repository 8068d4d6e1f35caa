//! Archive lifecycle: open modes, staged member edits, and finalization.
//!
//! The source archive is never modified in place. Finalizing always builds a
//! fresh archive in the order EPUB readers expect:
//!
//! 1. `mimetype` (stored)
//! 2. `META-INF/container.xml`
//! 3. the package document
//! 4. the navigation document
//! 5. staged writes, in staging order
//! 6. untouched source members, in their original order
//!
//! The result either replaces a file on disk (via a sibling temporary file)
//! or stays in memory.

use super::container::{CONTAINER_PATH, MIMETYPE_PATH};
use super::source::{EpubSource, SourceArchive};
use super::staging::Staging;
use super::writer::PackageWriter;
use crate::common::{Error, Result};
use log::debug;
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;

/// How an EPUB is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read an existing archive; every mutation fails with `NotWritable`.
    Read,
    /// Edit an existing archive; the result replaces it on close.
    Append,
    /// Start a new book from built-in templates.
    Create,
}

impl OpenMode {
    #[inline]
    pub fn is_writable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

/// Lifecycle state of an open archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveState {
    OpenRead,
    OpenAppend,
    OpenCreate,
    Finalizing,
    Closed,
}

/// Where a finalized archive goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Path(PathBuf),
    Memory,
}

/// The four members every finalized archive starts with.
#[derive(Debug)]
pub struct FixedMembers<'a> {
    pub container: Cow<'a, [u8]>,
    pub package_path: &'a str,
    pub package: Cow<'a, [u8]>,
    pub navigation_path: &'a str,
    pub navigation: Cow<'a, [u8]>,
}

impl FixedMembers<'_> {
    /// Archive paths in output order.
    pub fn paths(&self) -> [&str; 4] {
        [MIMETYPE_PATH, CONTAINER_PATH, self.package_path, self.navigation_path]
    }
}

enum Planned<'a> {
    Staged(&'a str, &'a [u8]),
    Original(&'a str),
}

/// State machine around the source archive and its staged edits.
pub struct Archive {
    mode: OpenMode,
    state: ArchiveState,
    source: Option<SourceArchive>,
    staging: Staging,
    default_target: OutputTarget,
    reserved: Vec<String>,
    compression_level: Option<i64>,
    output: Option<Vec<u8>>,
}

impl Archive {
    /// Acquire the source. Read and append modes load and index it now;
    /// create mode only remembers where the result should go.
    pub fn open(source: &EpubSource, mode: OpenMode) -> Result<Self> {
        let (archive, state) = match mode {
            OpenMode::Read => (Some(SourceArchive::from_bytes(source.load()?)?), ArchiveState::OpenRead),
            OpenMode::Append => (Some(SourceArchive::from_bytes(source.load()?)?), ArchiveState::OpenAppend),
            OpenMode::Create => (None, ArchiveState::OpenCreate),
        };

        let default_target = match source {
            EpubSource::Path(path) => OutputTarget::Path(path.clone()),
            EpubSource::Bytes(_) => OutputTarget::Memory,
        };

        if let Some(archive) = &archive {
            debug!("opened archive with {} members ({:?})", archive.len(), mode);
        }

        Ok(Self {
            mode,
            state,
            source: archive,
            staging: Staging::new(),
            default_target,
            reserved: vec![MIMETYPE_PATH.to_string(), CONTAINER_PATH.to_string()],
            compression_level: None,
            output: None,
        })
    }

    /// Deflate level used when finalizing.
    pub fn with_compression_level(mut self, level: Option<i64>) -> Self {
        self.compression_level = level;
        self
    }

    /// Mark a path as a fixed member that staging may not touch.
    pub fn reserve(&mut self, path: &str) {
        if !self.is_reserved(path) {
            self.reserved.push(path.to_string());
        }
    }

    #[inline]
    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved.iter().any(|p| p == path)
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[inline]
    pub fn state(&self) -> ArchiveState {
        self.state
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == ArchiveState::Closed
    }

    /// Where `close()` writes to.
    #[inline]
    pub fn default_target(&self) -> &OutputTarget {
        &self.default_target
    }

    /// The source archive, while it is held.
    #[inline]
    pub fn source(&self) -> Option<&SourceArchive> {
        self.source.as_ref()
    }

    /// Fail unless the archive is open in a writable mode.
    pub fn ensure_writable(&self) -> Result<()> {
        match self.state {
            ArchiveState::OpenAppend | ArchiveState::OpenCreate => Ok(()),
            ArchiveState::OpenRead => Err(Error::NotWritable("archive is opened read-only")),
            ArchiveState::Finalizing | ArchiveState::Closed => Err(Error::NotWritable("archive is closed")),
        }
    }

    /// Fail once the archive has been closed.
    pub fn ensure_open(&self) -> Result<()> {
        match self.state {
            ArchiveState::Finalizing | ArchiveState::Closed => Err(Error::NotWritable("archive is closed")),
            _ => Ok(()),
        }
    }

    /// Check that `path` can be staged, without staging anything.
    pub fn check_stageable(&self, path: &str) -> Result<()> {
        self.ensure_writable()?;
        if self.is_reserved(path) {
            return Err(Error::ReservedMember(path.to_string()));
        }
        Ok(())
    }

    /// Stage a member write.
    pub fn stage_write(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        self.check_stageable(path)?;
        self.staging.write(path, data);
        Ok(())
    }

    /// Stage a member deletion.
    pub fn stage_delete(&mut self, path: &str) -> Result<()> {
        self.check_stageable(path)?;
        if !self.contains(path) {
            return Err(Error::MemberNotFound(path.to_string()));
        }
        self.staging.delete(path);
        Ok(())
    }

    /// Whether the finalized archive would contain a non-fixed `path`.
    pub fn contains(&self, path: &str) -> bool {
        if self.staging.is_deleted(path) {
            return false;
        }
        self.staging.contains(path) || self.source.as_ref().is_some_and(|s| s.contains(path))
    }

    /// Current bytes of a non-fixed member: staged first, then original.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if self.staging.is_deleted(path) {
            return Err(Error::MemberNotFound(path.to_string()));
        }
        if let Some(data) = self.staging.get(path) {
            return Ok(data.to_vec());
        }
        match &self.source {
            Some(source) => source.read(path),
            None => Err(Error::MemberNotFound(path.to_string())),
        }
    }

    /// Names the finalized archive would contain, in output order.
    pub fn member_names(&self, fixed: [&str; 4]) -> Vec<String> {
        fixed
            .iter()
            .map(|p| p.to_string())
            .chain(self.plan(&fixed).into_iter().map(|planned| match planned {
                Planned::Staged(path, _) | Planned::Original(path) => path.to_string(),
            }))
            .collect()
    }

    fn plan<'a>(&'a self, fixed: &[&str; 4]) -> Vec<Planned<'a>> {
        let mut planned: Vec<Planned<'a>> = self
            .staging
            .writes()
            .filter(|(path, _)| !fixed.contains(path))
            .map(|(path, data)| Planned::Staged(path, data))
            .collect();

        if let Some(source) = &self.source {
            planned.extend(
                source
                    .member_names()
                    .iter()
                    .map(String::as_str)
                    .filter(|name| {
                        !fixed.contains(name) && !self.staging.contains(name) && !self.staging.is_deleted(name)
                    })
                    .map(Planned::Original),
            );
        }
        planned
    }

    /// Build the complete output archive.
    pub fn assemble(&self, fixed: &FixedMembers<'_>) -> Result<Vec<u8>> {
        let mut writer = PackageWriter::new()?.with_compression_level(self.compression_level);

        writer.add_file(CONTAINER_PATH, &fixed.container)?;
        writer.add_file(fixed.package_path, &fixed.package)?;
        writer.add_file(fixed.navigation_path, &fixed.navigation)?;

        let paths = fixed.paths();
        let plan = self.plan(&paths);
        let mut copied = 0usize;
        for planned in &plan {
            match planned {
                Planned::Staged(path, data) => writer.add_file(path, data)?,
                Planned::Original(name) => {
                    // Checked by plan(): originals only exist with a source.
                    let Some(source) = &self.source else { continue };
                    let member = source.read_member(name)?;
                    let method = match member.compression {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    };
                    writer.add_file_with_method(name, &member.data, method)?;
                    copied += 1;
                },
            }
        }

        let bytes = writer.finish_to_bytes()?;
        debug!(
            "assembled archive: {} staged, {} copied, {} bytes",
            plan.len() - copied,
            copied,
            bytes.len()
        );
        Ok(bytes)
    }

    /// Enter the finalizing state.
    pub fn begin_finalize(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.state = ArchiveState::Finalizing;
        Ok(())
    }

    /// Hand assembled bytes to `target`.
    pub fn deliver(&mut self, bytes: Vec<u8>, target: &OutputTarget) -> Result<()> {
        match target {
            OutputTarget::Memory => {
                debug!("finalized {} bytes to memory", bytes.len());
                self.output = Some(bytes);
                Ok(())
            },
            OutputTarget::Path(path) => {
                write_atomically(path, &bytes)?;
                debug!("finalized {} bytes to {}", bytes.len(), path.display());
                Ok(())
            },
        }
    }

    /// Release the source and staged data and enter the closed state.
    pub fn release(&mut self) {
        self.source = None;
        self.staging.clear();
        self.state = ArchiveState::Closed;
    }

    /// In-memory output of a finalized archive.
    #[inline]
    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    #[inline]
    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.output.take()
    }
}

/// Write through a sibling temporary file so a failed write never leaves a
/// truncated target behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name")
    })?;

    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".quire-tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = std::fs::write(&tmp_path, bytes).and_then(|()| std::fs::rename(&tmp_path, path));
    if let Err(err) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}
