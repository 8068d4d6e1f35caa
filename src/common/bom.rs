//! Byte Order Mark (BOM) detection for XML members.
//!
//! Container, package, and navigation documents are read as UTF-8. A UTF-8
//! BOM is skipped; any other BOM means the document is in an encoding the
//! tree parser does not handle.

/// Supported BOM encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomKind {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl BomKind {
    /// Returns the byte representation of the BOM.
    #[inline]
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            BomKind::Utf8 => &UTF8_BOM,
            BomKind::Utf16Le => &UTF16_LE_BOM,
            BomKind::Utf16Be => &UTF16_BE_BOM,
            BomKind::Utf32Le => &UTF32_LE_BOM,
            BomKind::Utf32Be => &UTF32_BE_BOM,
        }
    }

    /// Returns the length in bytes of the BOM.
    #[inline]
    #[allow(clippy::len_without_is_empty)] // No need to check for empty BOMs
    pub const fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

/// UTF-8 BOM bytes.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
/// UTF-16 little-endian BOM bytes.
pub const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
/// UTF-16 big-endian BOM bytes.
pub const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
/// UTF-32 little-endian BOM bytes.
pub const UTF32_LE_BOM: [u8; 4] = [0xFF, 0xFE, 0x00, 0x00];
/// UTF-32 big-endian BOM bytes.
pub const UTF32_BE_BOM: [u8; 4] = [0x00, 0x00, 0xFE, 0xFF];

/// Detect the BOM at the start of `data`, if any.
pub fn detect_bom(data: &[u8]) -> Option<BomKind> {
    // UTF-32 LE shares its first two bytes with UTF-16 LE, so check it first
    if data.starts_with(&UTF32_BE_BOM) {
        return Some(BomKind::Utf32Be);
    }
    if data.starts_with(&UTF32_LE_BOM) {
        return Some(BomKind::Utf32Le);
    }
    if data.starts_with(&UTF8_BOM) {
        return Some(BomKind::Utf8);
    }
    if data.starts_with(&UTF16_BE_BOM) {
        return Some(BomKind::Utf16Be);
    }
    if data.starts_with(&UTF16_LE_BOM) {
        return Some(BomKind::Utf16Le);
    }
    None
}

/// Split a leading BOM off `data`.
///
/// Returns the detected kind (if any) and the remaining bytes.
#[inline]
pub fn strip_bom(data: &[u8]) -> (Option<BomKind>, &[u8]) {
    match detect_bom(data) {
        Some(kind) => (Some(kind), &data[kind.len()..]),
        None => (None, data),
    }
}
