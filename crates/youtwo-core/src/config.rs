//! Configuration
//!
//! Loaded with precedence: defaults < TOML file < environment < CLI flags
//! (the last layer is applied by the binary).
//!
//! ```toml
//! [convex]
//! url = "https://happy-otter-123.convex.cloud"
//!
//! [visualization]
//! rankdir = "LR"
//!
//! [visualization.entity_type_colors]
//! person = "lightblue"
//! default = "lightgray"
//!
//! [output]
//! directory = "./data"
//! format = "svg"
//! max_nodes = 50
//! ```

use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable holding the Convex deployment URL
pub const CONVEX_URL_ENV: &str = "CONVEX_URL";
/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "YOUTWO_OUTPUT_DIR";

/// Color used when the table has no `default` entry
const FALLBACK_COLOR: &str = "lightgray";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouTwoConfig {
    #[serde(default)]
    pub convex: ConvexConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Where the remote graph lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexConfig {
    /// Deployment URL (`*.convex.cloud` or `*.convex.site`)
    pub url: Option<String>,
    /// Program that starts the Convex MCP server
    #[serde(default = "default_mcp_command")]
    pub mcp_command: String,
    #[serde(default = "default_mcp_args")]
    pub mcp_args: Vec<String>,
    /// Convex project directory passed to the MCP `status` tool
    pub project_dir: Option<PathBuf>,
}

/// Diagram styling and layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Graphviz rank direction (TB, LR, BT, RL)
    pub rankdir: String,
    /// Graphviz size in inches, `"width,height"`
    pub size: String,
    pub dpi: String,
    pub node_shape: String,
    pub node_style: String,
    /// Lower-case entity type to fill color; `default` is the fallback
    pub entity_type_colors: BTreeMap<String, String>,
}

/// Image format written by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    Pdf,
    /// Graphviz DOT source
    Dot,
}

/// Which renderer draws the diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackendKind {
    /// Pipe DOT through the Graphviz `dot` program
    #[default]
    Graphviz,
    /// Pure-Rust layered SVG layout
    Builtin,
}

/// Output location and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File stem, the extension comes from `format`
    pub filename: String,
    pub format: OutputFormat,
    pub max_nodes: Option<usize>,
    pub max_edges: Option<usize>,
    /// Also write `<filename>_data.json` beside the image
    pub save_data: bool,
    /// Open the image in the platform viewer after rendering
    pub view: bool,
    pub backend: RenderBackendKind,
    pub graphviz_program: PathBuf,
}

/// Pipeline behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding dated `knowledge_graph-YYYY-MM-DD.json` snapshots
    pub cache_dir: PathBuf,
    /// Reuse today's cached snapshot instead of fetching again
    pub frozen: bool,
}

impl Default for ConvexConfig {
    fn default() -> Self {
        Self {
            url: None,
            mcp_command: default_mcp_command(),
            mcp_args: default_mcp_args(),
            project_dir: None,
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        let entity_type_colors = [
            ("person", "lightblue"),
            ("organization", "lightgreen"),
            ("location", "lightyellow"),
            ("concept", "lightpink"),
            ("event", "lightcoral"),
            ("default", FALLBACK_COLOR),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            rankdir: "TB".to_string(),
            size: "12,8".to_string(),
            dpi: "300".to_string(),
            node_shape: "ellipse".to_string(),
            node_style: "filled".to_string(),
            entity_type_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./data"),
            filename: "knowledge_graph".to_string(),
            format: OutputFormat::Png,
            max_nodes: Some(100),
            max_edges: Some(200),
            save_data: false,
            view: false,
            backend: RenderBackendKind::Graphviz,
            graphviz_program: PathBuf::from("dot"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data"),
            frozen: true,
        }
    }
}

fn default_mcp_command() -> String {
    "npx".to_string()
}

fn default_mcp_args() -> Vec<String> {
    ["-y", "convex@latest", "mcp", "start"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl VisualizationConfig {
    /// Fill color for an entity type, case-insensitive, with fallback
    pub fn entity_color(&self, entity_type: &str) -> &str {
        self.entity_type_colors
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(entity_type))
            .or_else(|| self.entity_type_colors.get_key_value("default"))
            .map(|(_, color)| color.as_str())
            .unwrap_or(FALLBACK_COLOR)
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Dot => "dot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            "dot" | "gv" => Ok(OutputFormat::Dot),
            other => Err(GraphError::config(format!(
                "unsupported output format '{other}' (expected png, svg, pdf or dot)"
            ))),
        }
    }
}

impl YouTwoConfig {
    /// Load defaults, then the config file, then environment overrides
    ///
    /// An explicit `path` must exist; the default location may be absent.
    pub fn load(path: Option<PathBuf>) -> GraphResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> GraphResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
        let config = toml::from_str(&text)
            .map_err(|e| GraphError::config(format!("{}: {e}", path.display())))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(CONVEX_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.convex.url = Some(url);
        }
        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.output.directory = PathBuf::from(dir);
        }
    }

    /// `<config dir>/youtwo/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("youtwo").join("config.toml"))
    }

    pub fn to_toml(&self) -> GraphResult<String> {
        toml::to_string_pretty(self).map_err(|e| GraphError::config(e.to_string()))
    }

    /// Write the default configuration as a starting point
    pub fn write_example(path: &Path, force: bool) -> GraphResult<()> {
        if path.exists() && !force {
            return Err(GraphError::config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
        }

        let body = format!(
            "# YouTwo configuration\n# Environment: {CONVEX_URL_ENV} and {OUTPUT_DIR_ENV} override the file.\n\n{}",
            Self::default().to_toml()?
        );
        std::fs::write(path, body).map_err(|e| GraphError::io(path, e))
    }
}
