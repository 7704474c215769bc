//! Errors raised while reading and normalizing a JSON document

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input bytes are not well-formed JSON. The message carries the
    /// line and column.
    #[error("malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// The document root must be an object
    #[error("document root must be an object, found {found}")]
    RootNotObject { found: &'static str },

    #[error("failed to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Releasing the input failed after traversal ended
    #[error("failed to close input: {0}")]
    ResourceClose(#[source] io::Error),
}

impl Error {
    /// Whether the error came from the bytes themselves rather than the
    /// surrounding I/O
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Malformed(_) | Error::RootNotObject { .. })
    }

    /// Line and column of a malformed input error
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            Error::Malformed(e) => Some((e.line(), e.column())),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Io(e.into())
        } else {
            Error::Malformed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_keeps_the_location_of_syntax_errors() {
        let error: Error = serde_json::from_str::<serde_json::Value>("{\"a\": 1,\n  }")
            .unwrap_err()
            .into();

        assert!(error.is_malformed());
        assert_eq!(error.location().map(|(line, _)| line), Some(2));
        assert!(error.to_string().starts_with("malformed JSON: "));
    }
}
