//! Diagram rendering backends

use crate::dot::to_dot;
use crate::svg::to_svg;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};
use youtwo_core::{
    GraphError, GraphResult, GraphSnapshot, OutputConfig, OutputFormat, RenderBackendKind,
    VisualizationConfig,
};

/// How the image bytes are produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBackend {
    /// Pipe DOT into a Graphviz program (any format)
    Graphviz { program: PathBuf },
    /// Pure-Rust layout, SVG and DOT only
    Builtin,
}

impl RenderBackend {
    pub fn from_output(output: &OutputConfig) -> Self {
        match output.backend {
            RenderBackendKind::Graphviz => RenderBackend::Graphviz {
                program: output.graphviz_program.clone(),
            },
            RenderBackendKind::Builtin => RenderBackend::Builtin,
        }
    }
}

impl Default for RenderBackend {
    fn default() -> Self {
        RenderBackend::Graphviz {
            program: PathBuf::from("dot"),
        }
    }
}

/// Turns a snapshot into exactly one image file
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: VisualizationConfig,
    backend: RenderBackend,
}

impl Renderer {
    pub fn new(style: VisualizationConfig, backend: RenderBackend) -> Self {
        Self { style, backend }
    }

    pub fn style(&self) -> &VisualizationConfig {
        &self.style
    }

    pub fn backend(&self) -> &RenderBackend {
        &self.backend
    }

    /// Render `snapshot` to `<directory>/<filename>.<ext>`.
    ///
    /// The image is written to a temporary file in `directory` and renamed
    /// into place only once it is complete; on error nothing is left behind.
    pub async fn render(
        &self,
        snapshot: &GraphSnapshot,
        directory: &Path,
        filename: &str,
        format: OutputFormat,
    ) -> GraphResult<PathBuf> {
        if filename.is_empty() {
            return Err(GraphError::render("output filename is empty"));
        }

        let bytes = self.render_bytes(snapshot, format).await?;

        std::fs::create_dir_all(directory).map_err(|e| GraphError::io(directory, e))?;
        let target = directory.join(format!("{filename}.{}", format.extension()));

        let mut tmp = tempfile::Builder::new()
            .prefix(".youtwo-render-")
            .tempfile_in(directory)
            .map_err(|e| GraphError::render_with("cannot create temporary image file", e))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| GraphError::render_with("cannot write image", e))?;
        tmp.persist(&target).map_err(|e| {
            GraphError::render_with(format!("cannot move image to {}", target.display()), e.error)
        })?;

        info!(
            "Rendered {} entities and {} relations to {}",
            snapshot.entities.len(),
            snapshot.relations.len(),
            target.display()
        );
        Ok(target)
    }

    /// Encoded image without touching the filesystem
    pub async fn render_bytes(
        &self,
        snapshot: &GraphSnapshot,
        format: OutputFormat,
    ) -> GraphResult<Vec<u8>> {
        match (&self.backend, format) {
            (_, OutputFormat::Dot) => Ok(to_dot(snapshot, &self.style)?.into_bytes()),
            (RenderBackend::Builtin, OutputFormat::Svg) => {
                Ok(to_svg(snapshot, &self.style)?.into_bytes())
            }
            (RenderBackend::Builtin, other) => Err(GraphError::render(format!(
                "the builtin renderer only writes svg and dot; {other} output requires Graphviz"
            ))),
            (RenderBackend::Graphviz { program }, other) => {
                let dot = to_dot(snapshot, &self.style)?;
                run_graphviz(program, &dot, other).await
            }
        }
    }
}

/// Feed DOT source to a Graphviz program and collect its stdout
async fn run_graphviz(program: &Path, dot: &str, format: OutputFormat) -> GraphResult<Vec<u8>> {
    debug!(
        "Running {} -T{} on {} bytes of DOT",
        program.display(),
        format.extension(),
        dot.len()
    );

    let mut child = Command::new(program)
        .arg(format!("-T{}", format.extension()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            let msg = if e.kind() == ErrorKind::NotFound {
                format!(
                    "Graphviz program '{}' not found; install Graphviz or use the builtin backend",
                    program.display()
                )
            } else {
                format!("failed to start '{}'", program.display())
            };
            GraphError::render_with(msg, e)
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| GraphError::render("Graphviz stdin unavailable"))?;
    stdin
        .write_all(dot.as_bytes())
        .await
        .map_err(|e| GraphError::render_with("failed writing DOT input", e))?;
    drop(stdin);

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| GraphError::render_with("failed reading Graphviz output", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GraphError::render(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}
