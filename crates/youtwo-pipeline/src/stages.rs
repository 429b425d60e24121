//! Gather, Integrate and Validate
//!
//! Each stage consumes the previous stage's value, so a stage can only run
//! once and only after the one before it succeeded.

use crate::cache::SnapshotCache;
use crate::graph::KnowledgeGraph;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};
use youtwo_core::{GraphResult, GraphSnapshot, GraphSource};

/// Output of the Validate stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub is_connected: bool,
    pub has_cycles: bool,
}

impl ValidationReport {
    pub fn of(graph: &KnowledgeGraph) -> Self {
        Self {
            num_nodes: graph.node_count(),
            num_edges: graph.edge_count(),
            is_connected: graph.is_weakly_connected(),
            has_cycles: graph.has_cycles(),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes={} edges={} connected={} cycles={}",
            self.num_nodes, self.num_edges, self.is_connected, self.has_cycles
        )
    }
}

/// Where Gather looks before calling the connector
#[derive(Debug, Clone, Default)]
pub struct GatherOptions {
    pub cache: Option<SnapshotCache>,
    /// Reuse the cached snapshot for today when present
    pub frozen: bool,
}

/// A snapshot fetched for a topic
#[derive(Debug, Clone)]
pub struct Gathered {
    pub topic: String,
    pub snapshot: GraphSnapshot,
    pub from_cache: bool,
    pub log: Vec<String>,
}

/// The snapshot plus its directed graph
#[derive(Debug, Clone)]
pub struct Integrated {
    pub topic: String,
    pub snapshot: GraphSnapshot,
    pub graph: KnowledgeGraph,
    pub log: Vec<String>,
}

/// Final pipeline value
#[derive(Debug, Clone)]
pub struct Validated {
    pub topic: String,
    pub snapshot: GraphSnapshot,
    pub graph: KnowledgeGraph,
    pub report: ValidationReport,
    pub log: Vec<String>,
}

/// Fetch a snapshot, honoring the frozen cache.
///
/// The cache is only written after a successful fetch; a failed fetch
/// leaves the filesystem untouched.
pub async fn gather(
    topic: impl Into<String>,
    source: &GraphSource,
    options: &GatherOptions,
) -> GraphResult<Gathered> {
    let topic = topic.into();
    let mut log = Vec::new();

    if options.frozen {
        if let Some(snapshot) = options.cache.as_ref().and_then(SnapshotCache::load) {
            log.push(format!(
                "Loaded cached knowledge graph ({} entities, {} relations)",
                snapshot.entities.len(),
                snapshot.relations.len()
            ));
            return Ok(Gathered {
                topic,
                snapshot,
                from_cache: true,
                log,
            });
        }
    }

    let snapshot = source.fetch().await?;
    log.push(format!(
        "Fetched knowledge graph from {} ({} entities, {} relations)",
        source.describe(),
        snapshot.entities.len(),
        snapshot.relations.len()
    ));

    if let Some(cache) = &options.cache {
        match cache.store(&snapshot) {
            Ok(path) => debug!("Cached snapshot at {}", path.display()),
            Err(e) => warn!("Could not cache snapshot: {}", e.chain()),
        }
    }

    Ok(Gathered {
        topic,
        snapshot,
        from_cache: false,
        log,
    })
}

impl Gathered {
    /// Build the directed graph from relations only
    pub fn integrate(self) -> Integrated {
        let graph = KnowledgeGraph::from_relations(&self.snapshot.relations);
        let mut log = self.log;
        log.push(format!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        ));
        info!(
            "Integrated {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Integrated {
            topic: self.topic,
            snapshot: self.snapshot,
            graph,
            log,
        }
    }
}

impl Integrated {
    pub fn validate(self) -> Validated {
        let report = ValidationReport::of(&self.graph);
        let mut log = self.log;
        log.push(format!("Validation report: {report}"));
        info!("Validated graph: {}", report);

        Validated {
            topic: self.topic,
            snapshot: self.snapshot,
            graph: self.graph,
            report,
            log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn friends() -> GraphSource {
        GraphSource::from_value(json!({
            "entities": [
                {"name": "Ross", "entityType": "person"},
                {"name": "Rachel", "entityType": "person"},
                {"name": "Central Perk", "entityType": "location"}
            ],
            "relations": [
                {"from": "Ross", "to": "Rachel", "relationType": "loves"},
                {"source": "Rachel", "target": "Central Perk", "relationType": "works_at"}
            ]
        }))
    }

    #[tokio::test]
    async fn test_stages_chain() {
        let gathered = gather("Friends", &friends(), &GatherOptions::default())
            .await
            .unwrap();
        assert!(!gathered.from_cache);

        let validated = gathered.integrate().validate();
        assert_eq!(validated.topic, "Friends");
        assert_eq!(
            validated.report,
            ValidationReport {
                num_nodes: 3,
                num_edges: 2,
                is_connected: true,
                has_cycles: false,
            }
        );
        assert_eq!(validated.log.len(), 3);
        assert!(validated.log[2].starts_with("Validation report:"));
    }

    #[tokio::test]
    async fn test_empty_snapshot_validates_as_empty() {
        let source = GraphSource::from_value(json!({"entities": [], "relations": []}));
        let validated = gather("", &source, &GatherOptions::default())
            .await
            .unwrap()
            .integrate()
            .validate();

        assert_eq!(
            validated.report,
            ValidationReport {
                num_nodes: 0,
                num_edges: 0,
                is_connected: false,
                has_cycles: false,
            }
        );
    }

    #[tokio::test]
    async fn test_entities_without_relations_are_not_nodes() {
        let source = GraphSource::from_value(json!({
            "entities": [{"name": "Gunther", "entityType": "person"}],
            "relations": []
        }));
        let validated = gather("", &source, &GatherOptions::default())
            .await
            .unwrap()
            .integrate()
            .validate();
        assert_eq!(validated.report.num_nodes, 0);
    }

    #[tokio::test]
    async fn test_frozen_gather_prefers_cache() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let cache = SnapshotCache::for_date(dir.path(), date);
        let options = GatherOptions {
            cache: Some(cache.clone()),
            frozen: true,
        };

        let first = gather("", &friends(), &options).await.unwrap();
        assert!(!first.from_cache);
        assert!(cache.path().is_file());

        // A source that would fail proves the second run never calls it
        let broken = GraphSource::from_value(json!({"entities": "nope"}));
        let second = gather("", &broken, &options).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.snapshot, first.snapshot);
    }

    #[tokio::test]
    async fn test_unfrozen_gather_refetches_and_refreshes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::for_date(dir.path(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        cache.store(&GraphSnapshot::default()).unwrap();

        let options = GatherOptions {
            cache: Some(cache.clone()),
            frozen: false,
        };
        let gathered = gather("", &friends(), &options).await.unwrap();
        assert!(!gathered.from_cache);
        assert_eq!(cache.load().unwrap().entities.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_gather_writes_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::for_date(dir.path(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        let options = GatherOptions {
            cache: Some(cache.clone()),
            frozen: true,
        };

        let broken = GraphSource::from_value(json!({"relations": [{"from": "A"}]}));
        assert!(gather("", &broken, &options).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
