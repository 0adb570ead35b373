//! Error types for record extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, XmlStreamError>;

/// Errors raised while opening or scanning a document.
///
/// `Io` and `Usage` are raised before any record is produced. `Parse` is
/// returned in place of the next record and finishes the stream; records
/// yielded before it stay valid.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum XmlStreamError {
    /// The input file could not be opened or read
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The markup is not well-formed
    #[error("malformed XML at byte {position}: {message}")]
    Parse { position: u64, message: String },

    /// The caller supplied invalid arguments
    #[error("invalid arguments: {0}")]
    Usage(String),
}

impl XmlStreamError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        XmlStreamError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(position: u64, message: impl Into<String>) -> Self {
        XmlStreamError::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        XmlStreamError::Usage(message.into())
    }

    /// Check if this error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, XmlStreamError::Io { .. })
    }

    /// Check if this error reports malformed markup
    pub fn is_parse(&self) -> bool {
        matches!(self, XmlStreamError::Parse { .. })
    }

    /// Check if this error reports invalid arguments
    pub fn is_usage(&self) -> bool {
        matches!(self, XmlStreamError::Usage(_))
    }

    /// Short stable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            XmlStreamError::Io { .. } => "io",
            XmlStreamError::Parse { .. } => "parse",
            XmlStreamError::Usage(_) => "usage",
        }
    }

    /// Byte offset of a parse error
    pub fn position(&self) -> Option<u64> {
        match self {
            XmlStreamError::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let io = XmlStreamError::io(
            "missing.xml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(io.is_io());
        assert_eq!(io.kind(), "io");
        assert!(io.to_string().contains("missing.xml"));

        let parse = XmlStreamError::parse(12, "unclosed tag <a>");
        assert!(parse.is_parse());
        assert_eq!(parse.position(), Some(12));
        assert_eq!(parse.to_string(), "malformed XML at byte 12: unclosed tag <a>");

        let usage = XmlStreamError::usage("no target tags");
        assert!(usage.is_usage());
        assert_eq!(usage.position(), None);
    }
}
