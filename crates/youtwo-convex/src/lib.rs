//! # YouTwo Convex
//!
//! Clients for the Convex backend that stores the knowledge graph.
//!
//! - [`http`]: [`ConvexHttpClient`] for the deployment's HTTP actions
//!   (`/graph`, `/metadata`, `/sources`)
//! - [`mcp`]: [`McpClient`], an rmcp client session with the Convex MCP server,
//!   restricted to the `status`, `functionSpec` and `run` tools
//! - [`toolkit`]: the knowledge-graph functions the backend exposes
//! - [`endpoint`]: [`ConvexMcpGraph`], a graph endpoint over MCP
//!
//! Both [`ConvexHttpClient`] and [`ConvexMcpGraph`] implement
//! [`youtwo_core::GraphEndpoint`] and can back a `GraphSource::Remote`.

pub mod endpoint;
pub mod error;
pub mod http;
pub mod mcp;
pub mod toolkit;

pub use endpoint::ConvexMcpGraph;
pub use error::{ConvexError, ConvexResult};
pub use http::{site_url, ConvexHttpClient, SourceRecord, CONNECTION_CHECK_TIMEOUT};
pub use mcp::{parse_status, parse_tool_result, Deployment, McpClient, ToolInfo, ALLOWED_TOOLS};
pub use toolkit::{BriefFunction, ToolkitFunction, KG_TOOLKIT};
