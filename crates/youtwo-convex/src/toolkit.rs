//! Knowledge-graph functions exposed by the YouTwo Convex backend

use serde::Serialize;
use serde_json::Value;

/// A backend function the toolkit knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BriefFunction {
    pub tool_name: &'static str,
    /// `module.js:export`, as reported by `functionSpec`
    pub identifier: &'static str,
    pub description: &'static str,
}

impl BriefFunction {
    /// Name accepted by the `run` tool (`module:export`)
    pub fn function_name(&self) -> String {
        to_function_name(self.identifier)
    }
}

pub const KG_TOOLKIT: &[BriefFunction] = &[
    BriefFunction {
        tool_name: "get_entities",
        identifier: "entities.js:getBriefEntities",
        description: "Get a brief list of entities",
    },
    BriefFunction {
        tool_name: "view_graph",
        identifier: "knowledge.js:readGraph",
        description: "Read the graph of the knowledge base",
    },
    BriefFunction {
        tool_name: "create_entities",
        identifier: "entities.js:createEntities",
        description: "Create entities",
    },
    BriefFunction {
        tool_name: "delete_entities",
        identifier: "entities.js:deleteEntities",
        description: "Delete entities (by name)",
    },
    BriefFunction {
        tool_name: "add_observations",
        identifier: "entities.js:addObservations",
        description: "Add observations to an entity (by name)",
    },
    BriefFunction {
        tool_name: "delete_observations",
        identifier: "entities.js:deleteObservations",
        description: "Delete observations from an entity (by name)",
    },
    BriefFunction {
        tool_name: "create_relations",
        identifier: "relations.js:createRelations",
        description: "Create relations between entities (by name)",
    },
    BriefFunction {
        tool_name: "delete_relations",
        identifier: "relations.js:deleteRelations",
        description: "Delete relations between entities (by name)",
    },
];

/// Function that returns the whole graph
pub const READ_GRAPH_FUNCTION: &str = "knowledge:readGraph";

pub fn by_identifier(identifier: &str) -> Option<&'static BriefFunction> {
    KG_TOOLKIT.iter().find(|f| f.identifier == identifier)
}

pub fn by_tool_name(tool_name: &str) -> Option<&'static BriefFunction> {
    KG_TOOLKIT.iter().find(|f| f.tool_name == tool_name)
}

/// `entities.js:createEntities` → `entities:createEntities`
pub fn to_function_name(identifier: &str) -> String {
    match identifier.split_once(':') {
        Some((module, export)) => {
            format!("{}:{}", module.strip_suffix(".js").unwrap_or(module), export)
        }
        None => identifier.to_string(),
    }
}

/// A toolkit function present on the deployment, with its argument validator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolkitFunction {
    pub identifier: String,
    pub function_args: Value,
    pub tool_name: String,
    pub description: String,
}

/// Keep only `functionSpec` entries that belong to the toolkit
pub fn filter_function_spec(spec: &[Value]) -> Vec<ToolkitFunction> {
    spec.iter()
        .filter_map(|func| {
            let identifier = func.get("identifier")?.as_str()?;
            let known = by_identifier(identifier)?;
            Some(ToolkitFunction {
                identifier: identifier.to_string(),
                function_args: func.get("args").cloned().unwrap_or(Value::Null),
                tool_name: known.tool_name.to_string(),
                description: known.description.to_string(),
            })
        })
        .collect()
}
