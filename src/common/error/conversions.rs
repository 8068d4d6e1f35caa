//! Error conversion implementations.
//!
//! Open-time failures are reported against the document being loaded, so the
//! loaders re-tag generic XML errors with [`Error::in_container`],
//! [`Error::in_package`], or [`Error::in_navigation`].

use super::types::Error;

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Xml(format!("invalid UTF-8: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Xml(format!("invalid UTF-8: {}", err))
    }
}

impl Error {
    /// Re-tag an XML failure as a container failure.
    pub(crate) fn in_container(self) -> Self {
        match self {
            Error::Xml(msg) => Error::InvalidContainer(msg),
            other => other,
        }
    }

    /// Re-tag an XML failure as a package failure.
    pub(crate) fn in_package(self) -> Self {
        match self {
            Error::Xml(msg) => Error::InvalidPackage(msg),
            other => other,
        }
    }

    /// Re-tag an XML failure as a navigation failure.
    pub(crate) fn in_navigation(self) -> Self {
        match self {
            Error::Xml(msg) => Error::InvalidNavigation(msg),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retag_only_touches_xml_errors() {
        let err = Error::Xml("bad".to_string()).in_package();
        assert!(matches!(err, Error::InvalidPackage(ref m) if m == "bad"));

        let err = Error::KeyNotFound("dc:title".to_string()).in_container();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    fn test_io_is_underlying() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_underlying_io());
        assert!(!Error::NotWritable("closed").is_underlying_io());
    }
}
