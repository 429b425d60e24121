//! Knowledge graph visualizer
//!
//! Couples a [`GraphSource`] with a [`Renderer`]: the snapshot is fetched
//! once, cached, optionally annotated with extra properties, then filtered
//! and drawn on every [`Visualizer::visualize`] call.

use crate::renderer::{RenderBackend, Renderer};
use crate::viewer::open_in_viewer;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;
use youtwo_core::{
    GraphError, GraphResult, GraphSnapshot, GraphSource, OutputConfig, OutputFormat, Properties,
    RelationUpdate, YouTwoConfig,
};

/// Per-call rendering options
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizeOptions {
    /// `None` draws every entity
    pub max_nodes: Option<usize>,
    /// `None` draws every relation
    pub max_edges: Option<usize>,
    pub directory: PathBuf,
    pub filename: String,
    pub format: OutputFormat,
    /// Also write `<filename>_data.json` with exactly what was drawn
    pub save_data: bool,
    /// Open the image once written
    pub view: bool,
}

impl VisualizeOptions {
    pub fn from_output(output: &OutputConfig) -> Self {
        Self {
            max_nodes: output.max_nodes,
            max_edges: output.max_edges,
            directory: output.directory.clone(),
            filename: output.filename.clone(),
            format: output.format,
            save_data: output.save_data,
            view: output.view,
        }
    }

    /// Path of the image these options produce
    pub fn image_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.filename, self.format.extension()))
    }

    /// Path of the sibling data file
    pub fn data_path(&self) -> PathBuf {
        self.directory.join(format!("{}_data.json", self.filename))
    }
}

impl Default for VisualizeOptions {
    fn default() -> Self {
        Self::from_output(&OutputConfig::default())
    }
}

/// Files written by one visualization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visualization {
    pub image: PathBuf,
    pub data: Option<PathBuf>,
}

pub struct Visualizer {
    source: GraphSource,
    renderer: Renderer,
    snapshot: Option<GraphSnapshot>,
}

impl Visualizer {
    pub fn new(source: GraphSource, renderer: Renderer) -> Self {
        Self {
            source,
            renderer,
            snapshot: None,
        }
    }

    /// Renderer styled and backed per `config`
    pub fn from_config(source: GraphSource, config: &YouTwoConfig) -> Self {
        let renderer = Renderer::new(
            config.visualization.clone(),
            RenderBackend::from_output(&config.output),
        );
        Self::new(source, renderer)
    }

    pub fn source(&self) -> &GraphSource {
        &self.source
    }

    /// The cached snapshot, if loaded
    pub fn snapshot(&self) -> Option<&GraphSnapshot> {
        self.snapshot.as_ref()
    }

    /// Fetch through the connector on first use, then reuse the cached copy
    pub async fn load(&mut self) -> GraphResult<&GraphSnapshot> {
        if self.snapshot.is_none() {
            let fetched = self.source.fetch().await?;
            self.snapshot = Some(fetched);
        }
        self.loaded()
    }

    /// Drop the cache and fetch again
    pub async fn reload(&mut self) -> GraphResult<&GraphSnapshot> {
        self.snapshot = None;
        self.load().await
    }

    /// Merge properties into named entities of the cached snapshot.
    ///
    /// Unknown names are ignored. Returns how many entities changed.
    pub fn update_entity_properties(
        &mut self,
        updates: &HashMap<String, Properties>,
    ) -> GraphResult<usize> {
        Ok(self.loaded_mut()?.merge_entity_properties(updates))
    }

    /// Merge properties into relations matching `(source, target, type)`
    pub fn update_relation_properties(&mut self, updates: &[RelationUpdate]) -> GraphResult<usize> {
        Ok(self.loaded_mut()?.merge_relation_properties(updates))
    }

    /// Filter, render and optionally save or open the result
    pub async fn visualize(&mut self, options: &VisualizeOptions) -> GraphResult<Visualization> {
        let filtered = self.load().await?.filter(options.max_nodes, options.max_edges);

        let image = self
            .renderer
            .render(
                &filtered,
                &options.directory,
                &options.filename,
                options.format,
            )
            .await?;

        let data = if options.save_data {
            Some(filtered.save(options.data_path())?)
        } else {
            None
        };

        info!(
            "Visualized {} nodes and {} edges",
            filtered.entities.len(),
            filtered.relations.len()
        );

        if options.view {
            open_in_viewer(&image);
        }

        Ok(Visualization { image, data })
    }

    /// Save the full cached snapshot (loading it first if needed)
    pub async fn save_current_state(&mut self, path: impl AsRef<Path>) -> GraphResult<PathBuf> {
        self.load().await?.save(path)
    }

    fn loaded(&self) -> GraphResult<&GraphSnapshot> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| GraphError::config("graph data not loaded; call load() first"))
    }

    fn loaded_mut(&mut self) -> GraphResult<&mut GraphSnapshot> {
        self.snapshot
            .as_mut()
            .ok_or_else(|| GraphError::config("graph data not loaded; call load() first"))
    }
}

/// Render a graph stored in a JSON file
pub async fn visualize_from_json(
    path: impl Into<PathBuf>,
    renderer: Renderer,
    options: &VisualizeOptions,
) -> GraphResult<Visualization> {
    let source = GraphSource::from_file(path)?;
    Visualizer::new(source, renderer).visualize(options).await
}

/// Render a graph held in memory as `{entities, relations}` JSON
pub async fn visualize_from_value(
    value: Value,
    renderer: Renderer,
    options: &VisualizeOptions,
) -> GraphResult<Visualization> {
    Visualizer::new(GraphSource::from_value(value), renderer)
        .visualize(options)
        .await
}
