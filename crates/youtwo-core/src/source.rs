//! Graph data connector
//!
//! A [`GraphSource`] produces a [`GraphSnapshot`] from one of three origins:
//!
//! - `Remote`: a [`GraphEndpoint`] (Convex over HTTP, Convex over MCP, ...)
//! - `File`: a JSON file that must exist when the source is built
//! - `InMemory`: a caller-supplied JSON value
//!
//! The set of origins is closed; only the remote transport is pluggable.
//! Every failure comes back as a [`GraphError`], never as a transport error.

use crate::error::{GraphError, GraphResult};
use crate::model::GraphSnapshot;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Remote transport able to return the raw graph document
///
/// Implementations only move bytes; normalization happens in [`GraphSource`].
#[async_trait]
pub trait GraphEndpoint: Send + Sync {
    /// Short label used in logs and error messages
    fn describe(&self) -> String;

    /// Fetch the raw `{entities, relations}` document
    async fn fetch_graph(&self) -> GraphResult<Value>;
}

/// JSON file origin, validated at construction
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Fails fast when the path is not an existing regular file
    pub fn new(path: impl Into<PathBuf>) -> GraphResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(GraphError::fetch(format!(
                "JSON file not found: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn fetch(&self) -> GraphResult<GraphSnapshot> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            GraphError::fetch_with(format!("cannot read {}", self.path.display()), e)
        })?;
        GraphSnapshot::from_json_str(&text)
    }
}

/// Where a snapshot comes from
#[derive(Clone)]
pub enum GraphSource {
    /// A remote graph API behind some transport
    Remote(Arc<dyn GraphEndpoint>),
    /// A JSON document on disk
    File(FileSource),
    /// A JSON value held in memory
    InMemory(Value),
}

impl std::fmt::Debug for GraphSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphSource::Remote(endpoint) => {
                f.debug_tuple("Remote").field(&endpoint.describe()).finish()
            }
            GraphSource::File(file) => f.debug_tuple("File").field(&file.path).finish(),
            GraphSource::InMemory(_) => f.debug_tuple("InMemory").finish(),
        }
    }
}

impl GraphSource {
    pub fn remote(endpoint: impl GraphEndpoint + 'static) -> Self {
        GraphSource::Remote(Arc::new(endpoint))
    }

    /// JSON file source; errors immediately if the file is missing
    pub fn from_file(path: impl Into<PathBuf>) -> GraphResult<Self> {
        Ok(GraphSource::File(FileSource::new(path)?))
    }

    pub fn from_value(value: Value) -> Self {
        GraphSource::InMemory(value)
    }

    /// Short label for logs
    pub fn describe(&self) -> String {
        match self {
            GraphSource::Remote(endpoint) => endpoint.describe(),
            GraphSource::File(file) => format!("file {}", file.path.display()),
            GraphSource::InMemory(_) => "in-memory value".to_string(),
        }
    }

    /// Produce a normalized snapshot
    pub async fn fetch(&self) -> GraphResult<GraphSnapshot> {
        debug!("Fetching graph from {}", self.describe());

        let snapshot = match self {
            GraphSource::Remote(endpoint) => {
                let raw = endpoint.fetch_graph().await?;
                GraphSnapshot::from_value(raw)?
            }
            GraphSource::File(file) => file.fetch().await?,
            GraphSource::InMemory(value) => GraphSnapshot::from_value(value.clone())?,
        };

        info!(
            "Fetched {} entities and {} relations from {}",
            snapshot.entities.len(),
            snapshot.relations.len(),
            self.describe()
        );
        Ok(snapshot)
    }
}
