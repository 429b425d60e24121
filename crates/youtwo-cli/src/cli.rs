use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use youtwo_core::OutputFormat;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "youtwo")]
#[command(about = "youtwo - fetch, validate and draw the YouTwo knowledge graph")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/youtwo/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Explicit log level from the flags, if any
    pub fn level_filter(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the knowledge graph to an image
    Visualize(VisualizeArgs),

    /// Gather, integrate and validate the knowledge graph
    Pipeline(PipelineArgs),

    /// Run a backend function through the Convex MCP server
    Call {
        /// Function name (`module:export`) or toolkit tool name (`view_graph`)
        function: String,

        /// Function arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// List the knowledge-graph functions the deployment exposes
    Functions,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Where the graph comes from; the configured Convex HTTP endpoint when omitted
#[derive(Args, Debug, Clone, Default, PartialEq)]
#[group(id = "source", multiple = false)]
pub struct SourceArgs {
    /// Read the graph from a JSON file
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Fetch the graph from the Convex HTTP actions
    #[arg(long)]
    pub http: bool,

    /// Fetch the graph through the Convex MCP server
    #[arg(long)]
    pub mcp: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VisualizeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Maximum number of entities to draw
    #[arg(long)]
    pub max_nodes: Option<usize>,

    /// Maximum number of relations to draw
    #[arg(long)]
    pub max_edges: Option<usize>,

    /// Directory for the image and data files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File stem for the image
    #[arg(long)]
    pub filename: Option<String>,

    /// Image format (png, svg, pdf, dot)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Also write <filename>_data.json with what was drawn
    #[arg(long)]
    pub save_data: bool,

    /// Open the image once written
    #[arg(long)]
    pub view: bool,

    /// Use the built-in SVG layout instead of Graphviz
    #[arg(long)]
    pub builtin: bool,
}

/// Report output style for `pipeline`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Topic recorded with the run
    #[arg(long, default_value = "")]
    pub topic: String,

    /// Always fetch, ignoring today's cached snapshot
    #[arg(long)]
    pub no_frozen: bool,

    /// Snapshot cache directory (overrides config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write an example config file
    Init {
        /// Where to write it (defaults to ~/.config/youtwo/config.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format (toml, json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}
