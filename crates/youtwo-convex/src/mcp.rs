//! Convex MCP client using rmcp
//!
//! Wraps an rmcp client session. In production the session runs over the
//! stdio of `npx -y convex@latest mcp start`; only the `status`,
//! `functionSpec` and `run` tools are ever called.

use crate::error::{ConvexError, ConvexResult};
use crate::toolkit::{filter_function_spec, ToolkitFunction, READ_GRAPH_FUNCTION};
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent, Tool};
use rmcp::service::{RunningService, ServiceError, ServiceExt};
use rmcp::transport::{ConfigureCommandExt, IntoTransport, TokioChildProcess};
use rmcp::RoleClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Tools this client may call
pub const ALLOWED_TOOLS: &[&str] = &["status", "functionSpec", "run"];

fn is_allowed(name: &str) -> bool {
    ALLOWED_TOOLS.contains(&name)
}

/// A tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl From<Tool> for ToolInfo {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()),
            input_schema: Value::Object((*tool.input_schema).clone()),
        }
    }
}

/// The developer's own deployment as reported by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(rename = "deploymentSelector")]
    pub deployment_selector: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<ServiceError> for ConvexError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::McpError(data) => ConvexError::Rpc {
                code: i64::from(data.code.0),
                message: data.message.into_owned(),
            },
            other => ConvexError::Protocol(other.to_string()),
        }
    }
}

/// Client session with the Convex MCP server
///
/// The session (and a spawned server process) is shut down on drop.
pub struct McpClient {
    service: RunningService<RoleClient, ()>,
}

impl McpClient {
    /// Start `command args...` and run the MCP handshake over its stdio.
    ///
    /// The server's stderr is discarded.
    pub async fn spawn(command: &str, args: &[String]) -> ConvexResult<Self> {
        info!("Starting MCP server: {} {}", command, args.join(" "));

        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args);
            cmd.stderr(Stdio::null());
        }))
        .map_err(|source| ConvexError::Spawn {
            command: command.to_string(),
            source,
        })?;

        Self::connect(transport).await
    }

    /// Run the handshake over any rmcp transport
    pub async fn connect<T, E, A>(transport: T) -> ConvexResult<Self>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ConvexError::protocol(format!("handshake failed: {e}")))?;

        if let Some(info) = service.peer_info() {
            debug!(
                "Connected to MCP server {} (protocol {})",
                info.server_info.name, info.protocol_version
            );
        }
        Ok(Self { service })
    }

    /// Name the server reported during the handshake
    pub fn server_name(&self) -> Option<&str> {
        self.service
            .peer_info()
            .map(|info| info.server_info.name.as_str())
    }

    /// Allowed tools advertised by the server
    pub async fn list_tools(&self) -> ConvexResult<Vec<ToolInfo>> {
        let result = self.service.list_tools(Default::default()).await?;
        Ok(result
            .tools
            .into_iter()
            .filter(|tool| is_allowed(&tool.name))
            .map(ToolInfo::from)
            .collect())
    }

    /// Call an allowed tool and decode its JSON payload
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ConvexResult<Value> {
        if !is_allowed(name) {
            return Err(ConvexError::ToolNotAllowed(name.to_string()));
        }
        debug!("Calling MCP tool: {} with args: {}", name, arguments);

        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: arguments.as_object().cloned(),
            })
            .await?;
        parse_tool_result(name, &result)
    }

    /// Resolve the `ownDev` deployment of the project at `project_dir`
    pub async fn status(&self, project_dir: &Path) -> ConvexResult<Deployment> {
        let status = self
            .call_tool(
                "status",
                json!({ "projectDir": project_dir.to_string_lossy() }),
            )
            .await?;
        parse_status(&status)
    }

    /// Toolkit functions available on the deployment
    pub async fn function_spec(&self, deployment_selector: &str) -> ConvexResult<Vec<ToolkitFunction>> {
        let spec = self
            .call_tool(
                "functionSpec",
                json!({ "deploymentSelector": deployment_selector }),
            )
            .await?;
        let functions = spec
            .as_array()
            .ok_or_else(|| ConvexError::decode("functionSpec did not return a list"))?;
        Ok(filter_function_spec(functions))
    }

    /// Run a backend function; `args` is sent JSON-encoded as the tool expects
    pub async fn run_function(
        &self,
        deployment_selector: &str,
        function_name: &str,
        args: &Value,
    ) -> ConvexResult<Value> {
        debug!("Running Convex function {}", function_name);
        self.call_tool(
            "run",
            json!({
                "deploymentSelector": deployment_selector,
                "functionName": function_name,
                "args": args.to_string(),
            }),
        )
        .await
    }

    /// `knowledge:readGraph`
    pub async fn read_graph(&self, deployment_selector: &str) -> ConvexResult<Value> {
        self.run_function(deployment_selector, READ_GRAPH_FUNCTION, &json!({}))
            .await
    }
}

/// Decode a `tools/call` result.
///
/// `isError` (on the result or inside its JSON text) is a failure; otherwise
/// the first text item (or the structured content) is parsed and its
/// `result` field, or the whole value, is returned.
pub fn parse_tool_result(tool: &str, result: &CallToolResult) -> ConvexResult<Value> {
    let text = result.content.iter().find_map(|content| match &content.raw {
        RawContent::Text(t) => Some(t.text.as_str()),
        _ => None,
    });

    if result.is_error.unwrap_or(false) {
        return Err(ConvexError::ToolFailed {
            tool: tool.to_string(),
            message: text.unwrap_or("unknown error").to_string(),
        });
    }

    let payload: Value = match (text, &result.structured_content) {
        (Some(text), _) => serde_json::from_str(text)
            .map_err(|e| ConvexError::decode(format!("{tool} returned invalid JSON: {e}")))?,
        (None, Some(structured)) => structured.clone(),
        (None, None) => {
            return Err(ConvexError::decode(format!("{tool} returned no text content")));
        }
    };

    if payload.get("isError").and_then(Value::as_bool).unwrap_or(false) {
        let message = match payload.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown error".to_string(),
        };
        return Err(ConvexError::ToolFailed {
            tool: tool.to_string(),
            message,
        });
    }

    match payload {
        Value::Object(mut map) if map.contains_key("result") => {
            Ok(map.remove("result").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

/// Pick the `ownDev` entry from a `status` payload
pub fn parse_status(status: &Value) -> ConvexResult<Deployment> {
    let deployments = status
        .get("availableDeployments")
        .and_then(Value::as_array)
        .ok_or(ConvexError::NoDeployment)?;

    deployments
        .iter()
        .find(|d| d.get("kind").and_then(Value::as_str) == Some("ownDev"))
        .ok_or(ConvexError::NoDeployment)
        .and_then(|d| {
            serde_json::from_value(d.clone())
                .map_err(|e| ConvexError::decode(format!("status deployment: {e}")))
        })
}
