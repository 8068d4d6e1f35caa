use crate::xml::NamespaceRegistry;

/// Options controlling how an EPUB is opened, created, and written back.
///
/// # Examples
///
/// ```rust
/// use quire::OpenOptions;
///
/// let options = OpenOptions::new()
///     .with_namespace("calibre", "http://calibre.kovidgoyal.net/2009/metadata")
///     .with_content_folder("OPS")
///     .with_creator("Example Press");
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Prefixes available to metadata keys
    pub namespaces: NamespaceRegistry,
    /// Folder holding the package and content of a created book
    pub content_folder: String,
    /// File name of the package document of a created book
    pub package_file: String,
    /// File name of the navigation document of a created book
    pub navigation_file: String,
    /// `dc:creator` of a created book (empty for none)
    pub creator: String,
    /// Deflate level for written members (`None` = zip default)
    pub compression_level: Option<i64>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            namespaces: NamespaceRegistry::default(),
            content_folder: "OEBPS".to_string(),
            package_file: "content.opf".to_string(),
            navigation_file: "toc.ncx".to_string(),
            creator: "quire".to_string(),
            compression_level: None,
        }
    }
}

impl OpenOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional namespace prefix.
    #[inline]
    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.register(prefix, uri);
        self
    }

    /// Use `registry` as the starting namespace registry.
    ///
    /// Every book opened with these options gets its own copy, so later
    /// registrations on one book never leak into another.
    #[inline]
    pub fn with_namespaces(mut self, registry: NamespaceRegistry) -> Self {
        self.namespaces = registry;
        self
    }

    #[inline]
    pub fn with_content_folder(mut self, folder: impl Into<String>) -> Self {
        self.content_folder = folder.into();
        self
    }

    #[inline]
    pub fn with_package_file(mut self, name: impl Into<String>) -> Self {
        self.package_file = name.into();
        self
    }

    #[inline]
    pub fn with_navigation_file(mut self, name: impl Into<String>) -> Self {
        self.navigation_file = name.into();
        self
    }

    #[inline]
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    /// Deflate level, 0 to 9.
    #[inline]
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level.clamp(0, 9));
        self
    }

    /// Archive path of the package document of a created book.
    pub(crate) fn package_path(&self) -> String {
        crate::opf::package::join_path(self.content_folder.trim_matches('/'), &self.package_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = OpenOptions::default();
        assert_eq!(options.package_path(), "OEBPS/content.opf");
        assert_eq!(options.navigation_file, "toc.ncx");
        assert_eq!(options.compression_level, None);
    }

    #[test]
    fn test_builder() {
        let options = OpenOptions::new()
            .with_content_folder("")
            .with_package_file("book.opf")
            .with_compression_level(42)
            .with_namespace("x", "urn:x");
        assert_eq!(options.package_path(), "book.opf");
        assert_eq!(options.compression_level, Some(9));
        assert_eq!(options.namespaces.uri("x"), Some("urn:x"));
    }
}
