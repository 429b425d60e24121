use anyhow::{Context, Result};
use colored::Colorize;
use youtwo_convex::ConvexMcpGraph;
use youtwo_core::ConvexConfig;

/// Execute functions command
pub async fn execute(convex: &ConvexConfig) -> Result<()> {
    let (client, deployment) = ConvexMcpGraph::from_config(convex)
        .connect()
        .await
        .context("Could not reach the Convex MCP server")?;

    let functions = client
        .function_spec(&deployment.deployment_selector)
        .await
        .context("Could not read the deployment's function spec")?;

    if functions.is_empty() {
        println!(
            "{} No knowledge-graph functions on {}",
            "Warning:".yellow().bold(),
            deployment.deployment_selector
        );
        return Ok(());
    }

    println!(
        "{} ({})",
        "Knowledge-graph functions".cyan().bold(),
        deployment.deployment_selector
    );
    for function in functions {
        println!(
            "  {:<20} {}  {}",
            function.tool_name.green(),
            function.identifier,
            function.description.dimmed()
        );
    }
    Ok(())
}
