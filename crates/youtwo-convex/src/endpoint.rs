//! Graph endpoint backed by the Convex MCP server

use crate::error::ConvexResult;
use crate::http::ConvexHttpClient;
use crate::mcp::{Deployment, McpClient};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;
use youtwo_core::{ConvexConfig, GraphEndpoint, GraphResult};

/// Reads the graph through `knowledge:readGraph` on the `ownDev` deployment.
///
/// Each fetch starts its own MCP session. When the deployment has no
/// selector but does have a URL, the HTTP `GET /graph` route is used instead.
#[derive(Debug, Clone)]
pub struct ConvexMcpGraph {
    command: String,
    args: Vec<String>,
    project_dir: PathBuf,
}

impl ConvexMcpGraph {
    pub fn new(command: impl Into<String>, args: Vec<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args,
            project_dir: project_dir.into(),
        }
    }

    /// Project directory defaults to the working directory
    pub fn from_config(config: &ConvexConfig) -> Self {
        Self::new(
            config.mcp_command.clone(),
            config.mcp_args.clone(),
            config
                .project_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        )
    }

    /// Start a session and resolve the deployment
    pub async fn connect(&self) -> ConvexResult<(McpClient, Deployment)> {
        let client = McpClient::spawn(&self.command, &self.args).await?;
        let deployment = client.status(&self.project_dir).await?;
        debug!(
            "Using deployment {} ({})",
            deployment.deployment_selector,
            deployment.url.as_deref().unwrap_or("no url")
        );
        Ok((client, deployment))
    }

    async fn read_graph(&self) -> ConvexResult<Value> {
        let (client, deployment) = self.connect().await?;
        match (deployment.deployment_selector.is_empty(), &deployment.url) {
            (true, Some(url)) => ConvexHttpClient::new(url)?.get_graph().await,
            _ => client.read_graph(&deployment.deployment_selector).await,
        }
    }
}

#[async_trait]
impl GraphEndpoint for ConvexMcpGraph {
    fn describe(&self) -> String {
        format!("Convex MCP ({})", self.project_dir.display())
    }

    async fn fetch_graph(&self) -> GraphResult<Value> {
        Ok(self.read_graph().await?)
    }
}
