//! Namespace URIs and the `prefix:local` key resolver.

use crate::common::{Error, Result};

/// Dublin Core elements
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
/// OPF package document
pub const OPF_NS: &str = "http://www.idpf.org/2007/opf";
/// NCX navigation document
pub const NCX_NS: &str = "http://www.daisy.org/z3986/2005/ncx/";
/// OCF container document
pub const CONTAINER_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
/// The implicitly bound `xml` prefix
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix → URI registry consulted when resolving metadata keys.
///
/// Each [`crate::Epub`] owns its own registry. Registering a prefix on one
/// instance never affects another; to share registrations, configure the
/// same registry value in [`crate::OpenOptions`] for each instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    prefixes: Vec<(String, String)>,
    default_namespace: String,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self {
            prefixes: vec![
                ("dc".to_string(), DC_NS.to_string()),
                ("opf".to_string(), OPF_NS.to_string()),
                ("ncx".to_string(), NCX_NS.to_string()),
            ],
            default_namespace: OPF_NS.to_string(),
        }
    }
}

/// A fully resolved metadata key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedKey {
    /// Prefix used when a new element has to be created (`None` = unprefixed)
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: String,
}

impl QualifiedKey {
    /// Qualified element name for a newly created element.
    pub fn element_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

impl NamespaceRegistry {
    /// Create a registry with the built-in `dc`, `opf`, and `ncx` prefixes.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`, replacing an earlier binding of the same prefix.
    pub fn register(&mut self, prefix: &str, uri: &str) {
        match self.prefixes.iter_mut().find(|(p, _)| p == prefix) {
            Some(entry) => entry.1 = uri.to_string(),
            None => self.prefixes.push((prefix.to_string(), uri.to_string())),
        }
    }

    /// URI bound to `prefix`.
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.prefixes
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// First prefix bound to `uri`.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Namespace used for keys without a prefix.
    #[inline]
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Resolve a key of the form `prefix:local`, `local`, or `{uri}local`.
    ///
    /// Unprefixed keys map to the default (OPF) namespace. Clark-notation keys
    /// borrow a registered prefix for the URI when one exists.
    pub fn resolve(&self, key: &str) -> Result<QualifiedKey> {
        let malformed = || Error::KeyNotFound(key.to_string());

        if let Some(rest) = key.strip_prefix('{') {
            let (uri, local) = rest.split_once('}').ok_or_else(malformed)?;
            if uri.is_empty() || local.is_empty() || local.contains(':') {
                return Err(malformed());
            }
            let prefix = if uri == self.default_namespace {
                None
            } else {
                Some(
                    self.prefix_for(uri)
                        .map_or_else(|| format!("ns{}", self.prefixes.len()), str::to_string),
                )
            };
            return Ok(QualifiedKey {
                prefix,
                local: local.to_string(),
                namespace: uri.to_string(),
            });
        }

        match key.split_once(':') {
            Some((prefix, local)) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(malformed());
                }
                let uri = self
                    .uri(prefix)
                    .ok_or_else(|| Error::UnknownNamespacePrefix(prefix.to_string()))?;
                Ok(QualifiedKey {
                    prefix: Some(prefix.to_string()),
                    local: local.to_string(),
                    namespace: uri.to_string(),
                })
            },
            None if key.is_empty() => Err(malformed()),
            None => Ok(QualifiedKey {
                prefix: None,
                local: key.to_string(),
                namespace: self.default_namespace.clone(),
            }),
        }
    }
}
