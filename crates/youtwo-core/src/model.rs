//! Knowledge graph data model
//!
//! Upstream graph records are loosely shaped: relation endpoints arrive either
//! as `from`/`to` (Convex) or as `source`/`target` (hand-written JSON), and
//! records carry extra keys nobody here cares about. Everything is normalized
//! once, at deserialization, into [`Entity`], [`Relation`] and
//! [`GraphSnapshot`]. Serialized output always uses `from`/`to`.

use crate::error::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Open key/value map attached to entities and relations
pub type Properties = BTreeMap<String, Value>;

/// A named node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntity")]
pub struct Entity {
    /// Unique identifier within a snapshot
    pub name: String,
    /// Free-form category (person, organization, ...)
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A directed, labeled edge between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRelation")]
pub struct Relation {
    #[serde(rename = "from")]
    pub source: String,
    #[serde(rename = "to")]
    pub target: String,
    #[serde(rename = "relationType")]
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl Relation {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            properties: Properties::new(),
        }
    }

    fn matches(&self, source: &str, target: &str, relation_type: &str) -> bool {
        self.source == source && self.target == target && self.relation_type == relation_type
    }
}

/// Property update addressed at every relation with the same endpoints and type
#[derive(Debug, Clone, PartialEq)]
pub struct RelationUpdate {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub properties: Properties,
}

/// A complete, point-in-time set of entities and relations
///
/// Snapshots are loaded, filtered and saved wholesale. The only in-place
/// mutations are the two property-merge operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct GraphSnapshot {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl GraphSnapshot {
    /// Build a snapshot, dropping entities whose name was already seen
    pub fn new(entities: Vec<Entity>, relations: Vec<Relation>) -> Self {
        let mut seen = HashSet::with_capacity(entities.len());
        let entities = entities
            .into_iter()
            .filter(|entity| {
                let fresh = seen.insert(entity.name.clone());
                if !fresh {
                    debug!("Dropping duplicate entity '{}'", entity.name);
                }
                fresh
            })
            .collect();

        Self {
            entities,
            relations,
        }
    }

    /// Normalize an arbitrary JSON value into a snapshot
    ///
    /// Missing required keys (entity `name`, relation endpoints or
    /// `relationType`) are reported as [`GraphError::Malformed`].
    pub fn from_value(value: Value) -> GraphResult<Self> {
        serde_json::from_value(value).map_err(|e| GraphError::malformed(e.to_string()))
    }

    /// Parse JSON text into a snapshot
    ///
    /// Syntax errors are source errors; well-formed JSON with the wrong shape
    /// is malformed data.
    pub fn from_json_str(text: &str) -> GraphResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            if e.is_syntax() || e.is_eof() || e.is_io() {
                GraphError::fetch_with("invalid JSON", e)
            } else {
                GraphError::malformed(e.to_string())
            }
        })
    }

    /// Canonical `{entities, relations}` JSON with `from`/`to` relation keys
    pub fn to_value(&self) -> Value {
        // Plain strings and maps only, serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Return a copy limited to `max_nodes` entities and `max_edges` relations
    ///
    /// Both lists are truncated first, then relations whose endpoints were not
    /// kept are dropped. `None` means no limit.
    pub fn filter(&self, max_nodes: Option<usize>, max_edges: Option<usize>) -> GraphSnapshot {
        let entities: Vec<Entity> = match max_nodes {
            Some(n) => self.entities.iter().take(n).cloned().collect(),
            None => self.entities.clone(),
        };
        let names: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();

        let relations: Vec<Relation> = self
            .relations
            .iter()
            .take(max_edges.unwrap_or(usize::MAX))
            .filter(|r| names.contains(r.source.as_str()) && names.contains(r.target.as_str()))
            .cloned()
            .collect();

        GraphSnapshot {
            entities,
            relations,
        }
    }

    /// Fail with [`GraphError::Malformed`] if a relation points at a missing entity
    pub fn check_endpoints(&self) -> GraphResult<()> {
        let names: HashSet<&str> = self.entities.iter().map(|e| e.name.as_str()).collect();
        for rel in &self.relations {
            for endpoint in [&rel.source, &rel.target] {
                if !names.contains(endpoint.as_str()) {
                    return Err(GraphError::malformed(format!(
                        "relation '{}' -[{}]-> '{}' references unknown entity '{}'",
                        rel.source, rel.relation_type, rel.target, endpoint
                    )));
                }
            }
        }
        Ok(())
    }

    /// Merge property maps into entities by name; returns how many matched
    pub fn merge_entity_properties(&mut self, updates: &HashMap<String, Properties>) -> usize {
        let mut touched = 0;
        for entity in &mut self.entities {
            if let Some(props) = updates.get(&entity.name) {
                entity
                    .properties
                    .extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                touched += 1;
            }
        }
        touched
    }

    /// Merge property maps into every matching relation; returns how many matched
    pub fn merge_relation_properties(&mut self, updates: &[RelationUpdate]) -> usize {
        let mut touched = 0;
        for update in updates {
            for rel in self
                .relations
                .iter_mut()
                .filter(|r| r.matches(&update.source, &update.target, &update.relation_type))
            {
                rel.properties.extend(
                    update
                        .properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
                touched += 1;
            }
        }
        touched
    }

    /// Check the rules [`GraphSnapshot::load`] enforces on the way in
    ///
    /// Entity names and relation endpoints and types must be non-empty and
    /// entity names unique.
    pub fn validate(&self) -> GraphResult<()> {
        let mut seen = HashSet::with_capacity(self.entities.len());
        for entity in &self.entities {
            if entity.name.is_empty() {
                return Err(GraphError::malformed("entity has an empty 'name'"));
            }
            if !seen.insert(entity.name.as_str()) {
                return Err(GraphError::malformed(format!(
                    "duplicate entity '{}'",
                    entity.name
                )));
            }
        }

        for rel in &self.relations {
            if rel.source.is_empty() || rel.target.is_empty() {
                return Err(GraphError::malformed(format!(
                    "relation '{}' -> '{}' has an empty endpoint",
                    rel.source, rel.target
                )));
            }
            if rel.relation_type.is_empty() {
                return Err(GraphError::malformed(format!(
                    "relation '{}' -> '{}' has an empty 'relationType'",
                    rel.source, rel.target
                )));
            }
        }
        Ok(())
    }

    /// Write pretty JSON, forcing a `.json` extension; returns the final path
    ///
    /// Snapshots that fail [`GraphSnapshot::validate`] are rejected before
    /// anything is written.
    pub fn save(&self, path: impl AsRef<Path>) -> GraphResult<PathBuf> {
        self.validate()?;
        let path = path.as_ref().with_extension("json");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
        }

        let text = serde_json::to_string_pretty(self)
            .map_err(|e| GraphError::malformed(format!("cannot serialize snapshot: {e}")))?;
        std::fs::write(&path, text).map_err(|e| GraphError::io(&path, e))?;

        debug!(
            "Saved {} entities and {} relations to {}",
            self.entities.len(),
            self.relations.len(),
            path.display()
        );
        Ok(path)
    }

    /// Read a snapshot saved by [`GraphSnapshot::save`] (`.json` extension forced)
    pub fn load(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref().with_extension("json");
        let text = std::fs::read_to_string(&path).map_err(|e| GraphError::io(&path, e))?;
        Self::from_json_str(&text)
    }
}

// ============================================================================
// Raw wire records
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawEntity {
    name: Option<String>,
    #[serde(rename = "entityType")]
    entity_type: Option<String>,
    properties: Option<Properties>,
}

impl TryFrom<RawEntity> for Entity {
    type Error = String;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        let name = non_empty(raw.name).ok_or("entity is missing 'name'")?;

        Ok(Entity {
            name,
            entity_type: raw.entity_type.unwrap_or_default(),
            properties: raw.properties.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawRelation {
    from: Option<String>,
    to: Option<String>,
    source: Option<String>,
    target: Option<String>,
    #[serde(rename = "relationType")]
    relation_type: Option<String>,
    properties: Option<Properties>,
}

impl TryFrom<RawRelation> for Relation {
    type Error = String;

    fn try_from(raw: RawRelation) -> Result<Self, Self::Error> {
        let source = non_empty(raw.from)
            .or_else(|| non_empty(raw.source))
            .ok_or("relation is missing 'from'/'source'")?;
        let target = non_empty(raw.to)
            .or_else(|| non_empty(raw.target))
            .ok_or("relation is missing 'to'/'target'")?;
        let relation_type = non_empty(raw.relation_type)
            .ok_or_else(|| format!("relation '{source}' -> '{target}' is missing 'relationType'"))?;

        Ok(Relation {
            source,
            target,
            relation_type,
            properties: raw.properties.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    relations: Vec<Relation>,
}

impl TryFrom<RawSnapshot> for GraphSnapshot {
    type Error = String;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        Ok(GraphSnapshot::new(raw.entities, raw.relations))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triangle() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Entity::new("A", "concept"),
                Entity::new("B", "concept"),
                Entity::new("C", "concept"),
            ],
            vec![
                Relation::new("A", "B", "next"),
                Relation::new("B", "C", "next"),
                Relation::new("C", "A", "next"),
            ],
        )
    }

    #[test]
    fn test_from_to_and_source_target_normalize_identically() {
        let a = GraphSnapshot::from_value(json!({
            "relations": [{"from": "Alice", "to": "Bob", "relationType": "knows"}]
        }))
        .unwrap();
        let b = GraphSnapshot::from_value(json!({
            "relations": [{"source": "Alice", "target": "Bob", "relationType": "knows"}]
        }))
        .unwrap();

        assert_eq!(a.relations, b.relations);
        assert_eq!(a.relations[0].source, "Alice");
        assert_eq!(a.relations[0].target, "Bob");
    }

    #[test]
    fn test_from_wins_over_source() {
        let snap = GraphSnapshot::from_value(json!({
            "relations": [{
                "from": "X", "source": "Y", "to": "Z", "relationType": "r"
            }]
        }))
        .unwrap();
        assert_eq!(snap.relations[0].source, "X");
    }

    #[test]
    fn test_serialized_relations_use_from_to_only() {
        let snap = GraphSnapshot::new(
            vec![Entity::new("Alice", "person")],
            vec![Relation::new("Alice", "Alice", "self")],
        );
        let value = snap.to_value();
        let rel = &value["relations"][0];

        assert_eq!(rel["from"], "Alice");
        assert_eq!(rel["to"], "Alice");
        assert!(rel.get("source").is_none());
        assert!(rel.get("target").is_none());
        assert_eq!(value["entities"][0]["entityType"], "person");
    }

    #[test]
    fn test_missing_relation_type_is_malformed() {
        let err = GraphSnapshot::from_value(json!({
            "relations": [{"from": "A", "to": "B"}]
        }))
        .unwrap_err();
        assert!(matches!(err, GraphError::Malformed(_)), "got {err:?}");
        assert!(err.to_string().contains("relationType"));
    }

    #[test]
    fn test_missing_entity_name_is_malformed() {
        let err = GraphSnapshot::from_value(json!({
            "entities": [{"entityType": "person"}]
        }))
        .unwrap_err();
        assert!(matches!(err, GraphError::Malformed(_)));
    }

    #[test]
    fn test_extra_keys_are_ignored_and_type_defaults() {
        let snap = GraphSnapshot::from_value(json!({
            "entities": [{"_id": "abc", "name": "Rachel", "observations": ["barista"]}],
            "relations": []
        }))
        .unwrap();
        assert_eq!(snap.entities[0].entity_type, "");
        assert!(snap.entities[0].properties.is_empty());
    }

    #[test]
    fn test_duplicate_entities_first_wins() {
        let snap = GraphSnapshot::new(
            vec![Entity::new("A", "person"), Entity::new("A", "place")],
            vec![],
        );
        assert_eq!(snap.entities.len(), 1);
        assert_eq!(snap.entities[0].entity_type, "person");
    }

    #[test]
    fn test_filter_drops_relations_to_truncated_entities() {
        let filtered = triangle().filter(Some(2), None);

        assert_eq!(filtered.entities.len(), 2);
        assert_eq!(filtered.relations, vec![Relation::new("A", "B", "next")]);
    }

    #[test]
    fn test_filter_truncates_relations_before_endpoint_check() {
        let filtered = triangle().filter(None, Some(1));
        assert_eq!(filtered.relations.len(), 1);
    }

    #[test]
    fn test_filter_zero_limits_are_real_limits() {
        let filtered = triangle().filter(Some(0), Some(0));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_check_endpoints_reports_dangling_relation() {
        let snap = GraphSnapshot::new(
            vec![Entity::new("A", "x")],
            vec![Relation::new("A", "Ghost", "haunts")],
        );
        let err = snap.check_endpoints().unwrap_err();
        assert!(err.to_string().contains("Ghost"));
        assert!(triangle().check_endpoints().is_ok());
    }

    #[test]
    fn test_merge_entity_properties() {
        let mut snap = triangle();
        let mut updates = HashMap::new();
        updates.insert(
            "B".to_string(),
            Properties::from([("rank".to_string(), json!(2))]),
        );
        updates.insert("Nobody".to_string(), Properties::new());

        assert_eq!(snap.merge_entity_properties(&updates), 1);
        assert_eq!(snap.entity("B").unwrap().properties["rank"], json!(2));
    }

    #[test]
    fn test_merge_relation_properties_hits_every_match() {
        let mut snap = triangle();
        snap.relations.push(Relation::new("A", "B", "next"));

        let touched = snap.merge_relation_properties(&[RelationUpdate {
            source: "A".to_string(),
            target: "B".to_string(),
            relation_type: "next".to_string(),
            properties: Properties::from([("weight".to_string(), json!(0.5))]),
        }]);

        assert_eq!(touched, 2);
        assert_eq!(snap.relations[3].properties["weight"], json!(0.5));
        assert!(snap.relations[1].properties.is_empty());
    }

    #[test]
    fn test_save_forces_json_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = triangle().save(dir.path().join("nested/graph_data")).unwrap();

        assert_eq!(path, dir.path().join("nested/graph_data.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load_returns_equal_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snap = triangle();
        let path = snap.save(dir.path().join("graph")).unwrap();
        assert_eq!(GraphSnapshot::load(&path).unwrap(), snap);
    }

    #[test]
    fn test_save_rejects_what_load_would_reject() {
        let dir = tempfile::tempdir().unwrap();
        let pair = || vec![Entity::new("A", "person"), Entity::new("B", "person")];

        let untyped = GraphSnapshot::new(pair(), vec![Relation::new("A", "B", "")]);
        let unnamed = GraphSnapshot::new(vec![Entity::new("", "x")], vec![]);
        let mut duplicated = GraphSnapshot::new(pair(), vec![]);
        duplicated.entities.push(Entity::new("A", "robot"));

        for (name, snap) in [("untyped", untyped), ("unnamed", unnamed), ("duplicated", duplicated)] {
            let err = snap.save(dir.path().join(name)).unwrap_err();
            assert!(matches!(err, GraphError::Malformed(_)), "{name}: got {err:?}");
            assert!(!dir.path().join(format!("{name}.json")).exists());
        }
    }

    #[test]
    fn test_validate_accepts_dangling_relations() {
        let snap = GraphSnapshot::new(
            vec![Entity::new("A", "person")],
            vec![Relation::new("A", "Ghost", "haunts")],
        );
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn test_load_reports_syntax_error_as_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = GraphSnapshot::load(&path).unwrap_err();
        assert!(matches!(err, GraphError::Source { .. }), "got {err:?}");
    }
}
