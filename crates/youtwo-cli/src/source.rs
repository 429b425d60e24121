//! Picks the graph source for a command

use crate::cli::SourceArgs;
use anyhow::{Context, Result};
use tracing::debug;
use youtwo_convex::{ConvexHttpClient, ConvexMcpGraph};
use youtwo_core::{ConvexConfig, GraphSource};

/// `--json` reads a file, `--mcp` goes through the MCP server, anything
/// else uses the Convex HTTP actions.
pub fn resolve(args: &SourceArgs, convex: &ConvexConfig) -> Result<GraphSource> {
    let source = if let Some(path) = &args.json {
        GraphSource::from_file(path)?
    } else if args.mcp {
        GraphSource::remote(ConvexMcpGraph::from_config(convex))
    } else {
        let client = ConvexHttpClient::from_config(convex)
            .context("No Convex deployment configured; set CONVEX_URL or pass --json PATH")?;
        GraphSource::remote(client)
    };
    debug!("Graph source: {}", source.describe());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_json_source_must_exist() {
        let args = SourceArgs {
            json: Some(PathBuf::from("/nonexistent/graph.json")),
            ..Default::default()
        };
        let err = resolve(&args, &ConvexConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/graph.json"));
    }

    #[test]
    fn test_http_source_uses_configured_url() {
        let convex = ConvexConfig {
            url: Some("https://happy-otter-123.convex.cloud".to_string()),
            ..Default::default()
        };
        let source = resolve(&SourceArgs::default(), &convex).unwrap();
        assert!(source.describe().contains("happy-otter-123.convex.site"));
    }

    #[test]
    fn test_mcp_source_needs_no_url() {
        let args = SourceArgs {
            mcp: true,
            ..Default::default()
        };
        let source = resolve(&args, &ConvexConfig::default()).unwrap();
        assert!(source.describe().contains("Convex MCP"));
    }
}
