//! Unified error type for tubeforge.
//!
//! Remote calls, external tools, and configuration checks all funnel their
//! failures into [`Error`]. None of these ever reach a field reader: the
//! catalog turns them into unavailable (`None`) field values.

use std::fmt;

/// Unified error type covering all failure modes in tubeforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status.
    #[error("API error [{status}]: {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message reported by the service, or the raw body.
        message: String,
    },

    /// A response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An external tool (yt-dlp, etc.) failed.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Input or configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested entity does not exist remotely.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "item", "collection").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },
}

impl Error {
    /// Convenience constructor for [`Error::Transport`].
    pub fn transport(err: impl fmt::Display) -> Self {
        Error::Transport(err.to_string())
    }

    /// Convenience constructor for [`Error::Api`].
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Parse`].
    pub fn parse(err: impl fmt::Display) -> Self {
        Error::Parse(err.to_string())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
