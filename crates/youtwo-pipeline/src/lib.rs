//! Knowledge Graph Pipeline
//!
//! Turns a graph source into a validated directed graph.
//!
//! ## Architecture
//!
//! The pipeline runs three stages, strictly in order:
//! 1. **Gather**: fetch a snapshot through the connector (or today's cached copy)
//! 2. **Integrate**: build a directed graph from the snapshot's relations
//! 3. **Validate**: count nodes and edges, check weak connectivity and cycles
//!
//! Each stage consumes the previous stage's output and returns a new value
//! ([`Gathered`] → [`Integrated`] → [`Validated`]), so stages can be exercised
//! one at a time. [`KgPipeline`] runs all three and tracks the run through
//! [`PipelineStage`]: `Gathering → Integrating → Validating → Done`, with
//! `Failed` reachable from any non-terminal stage.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use youtwo_pipeline::KgPipeline;
//!
//! let pipeline = KgPipeline::new(source);
//! let validated = pipeline.run("Friends").await?;
//! println!("{}", validated.report);
//! ```

pub mod cache;
pub mod graph;
pub mod runner;
pub mod stages;
pub mod state;

pub use cache::*;
pub use graph::*;
pub use runner::*;
pub use stages::*;
pub use state::*;
