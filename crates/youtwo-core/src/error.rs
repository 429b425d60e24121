//! Graph error types

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by source and render failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while fetching, validating or rendering a knowledge graph
///
/// Every failure in the subsystem ends up as one of these variants so that
/// callers (CLI commands, tools) only ever need to handle this type.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The connector could not produce a snapshot
    #[error("Failed to fetch graph data: {message}")]
    Source {
        /// What was being fetched
        message: String,
        /// Underlying transport, I/O or decoding error
        #[source]
        source: Option<BoxError>,
    },

    /// The diagram could not be laid out or written
    #[error("Failed to render graph: {message}")]
    Render {
        /// What failed
        message: String,
        /// Underlying renderer error
        #[source]
        source: Option<BoxError>,
    },

    /// A record is missing a required field or references a missing endpoint
    #[error("Malformed graph data: {0}")]
    Malformed(String),

    /// Snapshot persistence failed
    #[error("I/O error at {}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration or call sequence
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Specialized Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Create a source error without an underlying cause
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a source error wrapping a cause
    pub fn fetch_with(msg: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Source {
            message: msg.into(),
            source: Some(cause.into()),
        }
    }

    /// Create a render error without an underlying cause
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a render error wrapping a cause
    pub fn render_with(msg: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Render {
            message: msg.into(),
            source: Some(cause.into()),
        }
    }

    /// Create a malformed-data error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create an I/O error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Render the error and its full cause chain on one line
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str(": ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}
