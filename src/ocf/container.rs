//! `META-INF/container.xml`: the pointer to the package document.

use crate::common::{Error, Result};
use crate::xml::XmlDocument;
use std::borrow::Cow;

/// Archive path of the container document
pub const CONTAINER_PATH: &str = "META-INF/container.xml";
/// Archive path of the mimetype member
pub const MIMETYPE_PATH: &str = "mimetype";
/// Content of the mimetype member
pub const EPUB_MIMETYPE: &str = "application/epub+zip";
/// Media type of an OPF rootfile
pub const OPF_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Parsed (or synthesized) OCF container document.
#[derive(Debug, Clone)]
pub struct Container {
    rootfile: String,
    media_type: Option<String>,
    /// Source bytes, copied through unchanged on finalize
    original: Option<Vec<u8>>,
}

impl Container {
    /// Container pointing at `rootfile`, for newly created books.
    pub fn new(rootfile: impl Into<String>) -> Self {
        Self {
            rootfile: rootfile.into(),
            media_type: Some(OPF_MEDIA_TYPE.to_string()),
            original: None,
        }
    }

    /// Parse container.xml and take the first rootfile's `full-path`.
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let doc = XmlDocument::parse(&bytes).map_err(Error::in_container)?;

        let rootfile = doc
            .root
            .elements()
            .find(|el| el.local_name() == "rootfiles")
            .and_then(|rootfiles| rootfiles.elements().find(|el| el.local_name() == "rootfile"))
            .ok_or_else(|| Error::InvalidContainer("no rootfile element".to_string()))?;

        let full_path = rootfile
            .attr("full-path")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidContainer("rootfile has no full-path".to_string()))?;

        Ok(Self {
            rootfile: full_path.trim_start_matches('/').to_string(),
            media_type: rootfile.attr("media-type").map(str::to_string),
            original: Some(bytes),
        })
    }

    /// Archive path of the package document.
    #[inline]
    pub fn rootfile_path(&self) -> &str {
        &self.rootfile
    }

    /// Declared media type of the rootfile.
    #[inline]
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Bytes to write on finalize: the source document when there is one.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match &self.original {
            Some(bytes) => Cow::Borrowed(bytes),
            None => Cow::Owned(self.generate().into_bytes()),
        }
    }

    fn generate(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{}" media-type="{}"/>
  </rootfiles>
</container>
"#,
            crate::common::xml::escape_attr(&self.rootfile),
            crate::common::xml::escape_attr(self.media_type.as_deref().unwrap_or(OPF_MEDIA_TYPE))
        )
    }
}
