//! # YouTwo Core
//!
//! Foundation types shared by every YouTwo crate.
//!
//! ## Modules
//!
//! - [`model`]: canonical [`Entity`], [`Relation`] and [`GraphSnapshot`] records,
//!   including normalization of the two relation endpoint spellings
//!   (`from`/`to` and `source`/`target`), filtering and JSON persistence
//! - [`source`]: the graph data connector, a closed set of origins
//!   (remote endpoint, JSON file, in-memory value) behind one `fetch()`
//! - [`error`]: [`GraphError`], the single error type surfaced by fetching,
//!   validating and rendering
//! - [`config`]: TOML configuration with defaults, file and environment layers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use youtwo_core::{GraphSource, GraphSnapshot};
//!
//! let source = GraphSource::from_file("knowledge_graph.json")?;
//! let snapshot = source.fetch().await?;
//! let small = snapshot.filter(Some(50), Some(100));
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod model;
pub mod source;

pub use config::*;
pub use error::*;
pub use model::*;
pub use source::*;
