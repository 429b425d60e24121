//! Knowledge graph pipeline orchestrator

use crate::cache::SnapshotCache;
use crate::stages::{gather, GatherOptions, Validated};
use crate::state::{PipelineStage, StageTracker};
use std::time::Instant;
use tracing::{error, info};
use youtwo_core::{GraphResult, GraphSource, PipelineConfig};

/// Runs Gather → Integrate → Validate for one source
///
/// ```text
/// KgPipeline (orchestration)
///   ├─> GraphSource      (Gather)
///   ├─> KnowledgeGraph   (Integrate)
///   └─> ValidationReport (Validate)
/// ```
pub struct KgPipeline {
    source: GraphSource,
    options: GatherOptions,
}

/// A finished run and the stages it went through
#[derive(Debug)]
pub struct PipelineRun {
    pub validated: Validated,
    pub stages: Vec<PipelineStage>,
}

impl KgPipeline {
    /// Pipeline without a snapshot cache
    pub fn new(source: GraphSource) -> Self {
        Self {
            source,
            options: GatherOptions::default(),
        }
    }

    /// Pipeline with today's dated cache in `config.cache_dir`
    pub fn with_config(source: GraphSource, config: &PipelineConfig) -> Self {
        Self {
            source,
            options: GatherOptions {
                cache: Some(SnapshotCache::today(&config.cache_dir)),
                frozen: config.frozen,
            },
        }
    }

    pub fn with_options(source: GraphSource, options: GatherOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &GraphSource {
        &self.source
    }

    /// Run all stages and return the validated graph
    pub async fn run(&self, topic: &str) -> GraphResult<Validated> {
        self.run_tracked(topic).await.map(|run| run.validated)
    }

    /// Run all stages, also returning the stage history.
    ///
    /// A failure in any stage moves the run to `Failed` and no partial
    /// result is returned.
    pub async fn run_tracked(&self, topic: &str) -> GraphResult<PipelineRun> {
        let start = Instant::now();
        let mut tracker = StageTracker::new();
        info!("Running knowledge graph pipeline for '{}'", topic);

        let gathered = match gather(topic, &self.source, &self.options).await {
            Ok(gathered) => gathered,
            Err(e) => {
                tracker.fail();
                error!(
                    "Pipeline failed in {}: {}",
                    PipelineStage::Gathering,
                    e.chain()
                );
                return Err(e);
            }
        };

        tracker.advance(PipelineStage::Integrating)?;
        let integrated = gathered.integrate();

        tracker.advance(PipelineStage::Validating)?;
        let validated = integrated.validate();

        tracker.advance(PipelineStage::Done)?;
        info!(
            "Pipeline finished in {}ms: {}",
            start.elapsed().as_millis(),
            validated.report
        );

        Ok(PipelineRun {
            validated,
            stages: tracker.history().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use youtwo_core::GraphError;

    #[tokio::test]
    async fn test_run_records_every_stage() {
        let source = GraphSource::from_value(json!({
            "entities": [{"name": "A", "entityType": "concept"}],
            "relations": [{"from": "A", "to": "A", "relationType": "self"}]
        }));
        let run = KgPipeline::new(source).run_tracked("loop").await.unwrap();

        assert_eq!(
            run.stages,
            vec![
                PipelineStage::Gathering,
                PipelineStage::Integrating,
                PipelineStage::Validating,
                PipelineStage::Done
            ]
        );
        assert!(run.validated.report.has_cycles);
    }

    #[tokio::test]
    async fn test_malformed_source_fails_run() {
        let source = GraphSource::from_value(json!({
            "relations": [{"from": "A", "relationType": "r"}]
        }));
        let err = KgPipeline::new(source).run("bad").await.unwrap_err();
        assert!(matches!(err, GraphError::Malformed(_)));
    }
}
