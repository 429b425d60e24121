//! Graphviz DOT generation

use std::collections::HashMap;
use youtwo_core::{GraphResult, GraphSnapshot, VisualizationConfig};

/// Render a snapshot as a DOT digraph.
///
/// Entities become `n<index>` nodes labeled with their name and filled by
/// entity type; relations become edges labeled with the relation type.
/// Every relation endpoint must be one of the snapshot's entities.
pub fn to_dot(snapshot: &GraphSnapshot, config: &VisualizationConfig) -> GraphResult<String> {
    snapshot.check_endpoints()?;

    let mut out = String::from("digraph knowledge_graph {\n");
    out.push_str(&format!("  rankdir={};\n", escape_attr(&config.rankdir)));
    out.push_str(&format!("  size=\"{}\";\n", escape_dot(&config.size)));
    out.push_str(&format!("  dpi={};\n", escape_attr(&config.dpi)));
    out.push_str(&format!(
        "  node [shape={} style={} fontname=\"Helvetica\"];\n",
        escape_attr(&config.node_shape),
        escape_attr(&config.node_style)
    ));
    out.push_str("  edge [fontname=\"Helvetica\" fontsize=10];\n\n");

    let mut ids: HashMap<&str, usize> = HashMap::with_capacity(snapshot.entities.len());
    for (idx, entity) in snapshot.entities.iter().enumerate() {
        ids.insert(entity.name.as_str(), idx);
        out.push_str(&format!(
            "  n{} [label=\"{}\" fillcolor=\"{}\"];\n",
            idx,
            escape_dot(&entity.name),
            escape_dot(config.entity_color(&entity.entity_type))
        ));
    }

    out.push('\n');

    for rel in &snapshot.relations {
        // endpoints checked above
        let (Some(from), Some(to)) = (ids.get(rel.source.as_str()), ids.get(rel.target.as_str()))
        else {
            continue;
        };
        out.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            from,
            to,
            escape_dot(&rel.relation_type)
        ));
    }

    out.push_str("}\n");
    Ok(out)
}

/// Escape a string for a quoted DOT label.
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Unquoted attribute values are limited to DOT identifier characters
fn escape_attr(s: &str) -> String {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        s.to_string()
    } else {
        format!("\"{}\"", escape_dot(s))
    }
}
