//! Error types for request assembly.
//!
//! # Design
//! Three failure families exist: reading attachment data (`Io`), turning a
//! field value into its target text or JSON form (`Encoding`), and model
//! directives that cannot be satisfied (`Configuration`). Every variant names
//! the field or path involved so the caller can point at the offending model
//! definition.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned while resolving a model or assembling a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Attachment data could not be read from a path or a stream.
    #[error("failed to read attachment {}: {source}", display_path(.path))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    /// A value has no representation in its destination.
    #[error("cannot encode `{field}`: {reason}")]
    Encoding { field: String, reason: String },

    /// The model's directives are incomplete or contradictory.
    #[error("invalid directives on `{field}`: {reason}")]
    Configuration { field: String, reason: String },
}

impl RequestError {
    pub(crate) fn encoding(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RequestError::Encoding {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RequestError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<stream>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = RequestError::Io {
            path: Some(PathBuf::from("/missing/report.pdf")),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read attachment /missing/report.pdf: no such file"
        );
    }

    #[test]
    fn io_error_without_path_is_a_stream() {
        let err = RequestError::Io {
            path: None,
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "eof"),
        };
        assert!(err.to_string().contains("<stream>"));
    }

    #[test]
    fn configuration_error_display() {
        let err = RequestError::configuration("Avatar", "file directive has no name");
        assert_eq!(
            err.to_string(),
            "invalid directives on `Avatar`: file directive has no name"
        );
    }
}
