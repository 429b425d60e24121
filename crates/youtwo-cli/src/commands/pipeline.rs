use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use youtwo_core::{PipelineConfig, YouTwoConfig};
use youtwo_pipeline::{KgPipeline, PipelineRun};

use crate::cli::{PipelineArgs, ReportFormat};
use crate::source;

/// Execute pipeline command
pub async fn execute(args: PipelineArgs, config: &YouTwoConfig) -> Result<()> {
    let source = source::resolve(&args.source, &config.convex)?;
    let pipeline = KgPipeline::with_config(source, &pipeline_config(config, &args));

    let run = pipeline.run_tracked(&args.topic).await?;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(&run))?),
        ReportFormat::Text => print_text(&run),
    }
    Ok(())
}

fn pipeline_config(config: &YouTwoConfig, args: &PipelineArgs) -> PipelineConfig {
    let mut pipeline = config.pipeline.clone();
    if args.no_frozen {
        pipeline.frozen = false;
    }
    if let Some(dir) = &args.cache_dir {
        pipeline.cache_dir = dir.clone();
    }
    pipeline
}

fn print_text(run: &PipelineRun) {
    for line in &run.validated.log {
        println!("{line}");
    }
    let report = &run.validated.report;
    println!("\n{}", "Validation report".cyan().bold());
    println!("  nodes:     {}", report.num_nodes);
    println!("  edges:     {}", report.num_edges);
    println!("  connected: {}", yes_no(report.is_connected));
    println!("  cycles:    {}", yes_no(report.has_cycles));
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".yellow().to_string()
    }
}

fn to_json(run: &PipelineRun) -> serde_json::Value {
    json!({
        "topic": run.validated.topic,
        "stages": run.stages,
        "log": run.validated.log,
        "report": run.validated.report,
    })
}
