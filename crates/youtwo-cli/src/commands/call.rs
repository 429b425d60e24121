use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::debug;
use youtwo_convex::toolkit::by_tool_name;
use youtwo_convex::ConvexMcpGraph;
use youtwo_core::ConvexConfig;

/// Execute call command
pub async fn execute(function: String, args: String, convex: &ConvexConfig) -> Result<()> {
    let args = parse_args(&args)?;
    let function_name = resolve_function(&function);

    let (client, deployment) = ConvexMcpGraph::from_config(convex)
        .connect()
        .await
        .context("Could not reach the Convex MCP server")?;
    debug!("Calling {} on {}", function_name, deployment.deployment_selector);

    let result = client
        .run_function(&deployment.deployment_selector, &function_name, &args)
        .await
        .with_context(|| format!("Function {function_name} failed"))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn parse_args(raw: &str) -> Result<Value> {
    let args: Value = serde_json::from_str(raw).context("--args is not valid JSON")?;
    if !args.is_object() {
        bail!("--args must be a JSON object");
    }
    Ok(args)
}

/// Toolkit tool names map to their backend function
fn resolve_function(function: &str) -> String {
    match by_tool_name(function) {
        Some(known) => known.function_name(),
        None => function.to_string(),
    }
}
