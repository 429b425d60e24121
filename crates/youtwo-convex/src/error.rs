//! Convex client errors

use thiserror::Error;
use youtwo_core::GraphError;

/// Errors from the Convex HTTP and MCP clients
#[derive(Error, Debug)]
pub enum ConvexError {
    /// No deployment URL in config or `CONVEX_URL`
    #[error("CONVEX_URL is not set")]
    MissingUrl,

    /// The deployment URL cannot address the HTTP API
    #[error("Convex HTTP API base must end with .site, got '{0}'")]
    InvalidUrl(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// A response body did not have the expected shape
    #[error("Failed to decode Convex response: {0}")]
    Decode(String),

    /// The MCP server process could not be started
    #[error("Failed to start MCP server '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The MCP session failed below the tool level
    #[error("MCP protocol error: {0}")]
    Protocol(String),

    /// JSON-RPC error response
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Tool outside the allowed set
    #[error("MCP tool '{0}' is not allowed")]
    ToolNotAllowed(String),

    /// Tool result flagged `isError`
    #[error("MCP tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// `status` listed no `ownDev` deployment
    #[error("No ownDev deployment found for project")]
    NoDeployment,
}

/// Result alias for Convex client operations
pub type ConvexResult<T> = Result<T, ConvexError>;

impl ConvexError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

impl From<ConvexError> for GraphError {
    fn from(err: ConvexError) -> Self {
        GraphError::fetch_with("Convex request failed", err)
    }
}
