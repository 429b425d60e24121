use anyhow::Result;
use colored::Colorize;
use tracing::info;
use youtwo_core::{OutputConfig, RenderBackendKind, YouTwoConfig};
use youtwo_render::{RenderBackend, Renderer, VisualizeOptions, Visualizer};

use crate::cli::VisualizeArgs;
use crate::source;

/// Execute visualize command
pub async fn execute(args: VisualizeArgs, config: &YouTwoConfig) -> Result<()> {
    let source = source::resolve(&args.source, &config.convex)?;
    let output = apply_overrides(config.output.clone(), &args);

    let renderer = Renderer::new(
        config.visualization.clone(),
        RenderBackend::from_output(&output),
    );
    let options = VisualizeOptions::from_output(&output);

    info!("Rendering {} to {}", source.describe(), options.image_path().display());
    let written = Visualizer::new(source, renderer).visualize(&options).await?;

    println!("{} {}", "Graph:".green().bold(), written.image.display());
    if let Some(data) = written.data {
        println!("{} {}", "Data:".green().bold(), data.display());
    }
    Ok(())
}

/// Command line flags win over the file and environment layers
fn apply_overrides(mut output: OutputConfig, args: &VisualizeArgs) -> OutputConfig {
    if let Some(n) = args.max_nodes {
        output.max_nodes = Some(n);
    }
    if let Some(n) = args.max_edges {
        output.max_edges = Some(n);
    }
    if let Some(dir) = &args.output_dir {
        output.directory = dir.clone();
    }
    if let Some(name) = &args.filename {
        output.filename = name.clone();
    }
    if let Some(format) = args.format {
        output.format = format;
    }
    output.save_data |= args.save_data;
    output.view |= args.view;
    if args.builtin {
        output.backend = RenderBackendKind::Builtin;
    }
    output
}
