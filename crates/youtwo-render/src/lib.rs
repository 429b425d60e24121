//! # YouTwo Render
//!
//! Draws knowledge graph snapshots.
//!
//! - [`dot`]: Graphviz DOT source with type-based node colors
//! - [`svg`]: a dependency-free layered SVG layout
//! - [`renderer`]: [`Renderer`], which writes exactly one image per call,
//!   either through Graphviz or the built-in layout
//! - [`visualizer`]: [`Visualizer`], which caches a fetched snapshot and
//!   filters, renders and optionally saves it
//!
//! ```rust,ignore
//! use youtwo_render::{Renderer, RenderBackend, VisualizeOptions, visualize_from_value};
//!
//! let renderer = Renderer::new(Default::default(), RenderBackend::Builtin);
//! let out = visualize_from_value(graph, renderer, &VisualizeOptions::default()).await?;
//! println!("{}", out.image.display());
//! ```

pub mod dot;
pub mod renderer;
pub mod svg;
pub mod viewer;
pub mod visualizer;

pub use dot::to_dot;
pub use renderer::{RenderBackend, Renderer};
pub use svg::to_svg;
pub use viewer::open_in_viewer;
pub use visualizer::{
    visualize_from_json, visualize_from_value, Visualization, VisualizeOptions, Visualizer,
};
