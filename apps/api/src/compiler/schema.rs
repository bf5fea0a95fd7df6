//! Schema graph — the formal description of the exact output shape handed
//! to the generation backend.
//!
//! The graph is a root object node whose properties reference one named
//! node per output group; group nodes reference the two shared primitive
//! nodes. Assembly validates the reference structure (no duplicate node
//! names, no dangling references) so a malformed graph can never reach the
//! backend. The JSON rendering is a single self-contained JSON Schema
//! document with `$defs` / `$ref`.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Name of the shared unconstrained-string node.
pub const TEXT_NODE: &str = "Text";
/// Name of the shared bounded string-array node.
pub const TEXT_LIST_NODE: &str = "TextList";
/// Hard cap on text-list length. Guards against unbounded model output.
pub const TEXT_LIST_MAX_ITEMS: usize = 10;

/// A schema graph that failed structural validation at assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("duplicate schema node {0:?}")]
    DuplicateNode(String),

    #[error("dangling schema reference {0:?}")]
    DanglingReference(String),
}

/// What a property points at: one of the two primitives, or a named node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRef {
    Text,
    TextList,
    Node(String),
}

impl SchemaRef {
    /// The referenced node's name as it appears under `$defs`.
    pub fn target(&self) -> &str {
        match self {
            SchemaRef::Text => TEXT_NODE,
            SchemaRef::TextList => TEXT_LIST_NODE,
            SchemaRef::Node(name) => name,
        }
    }
}

/// One property of an object node. `description` carries the semantic
/// guidance shown to the model for this slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProperty {
    pub name: String,
    pub description: String,
    pub reference: SchemaRef,
}

/// A named object node with ordered properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub name: String,
    pub properties: Vec<SchemaProperty>,
}

/// The assembled, validated graph: a root node plus its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGraph {
    root: SchemaNode,
    dependencies: Vec<SchemaNode>,
}

impl SchemaGraph {
    /// Assembles a graph from a root node and its dependency list,
    /// validating the reference structure.
    ///
    /// Rejected: a dependency whose name collides with another dependency
    /// or with a primitive node, and any property referencing a node that
    /// is neither a primitive nor in the dependency list.
    pub fn assemble(
        root: SchemaNode,
        dependencies: Vec<SchemaNode>,
    ) -> Result<Self, CompileError> {
        let mut names: Vec<&str> = vec![TEXT_NODE, TEXT_LIST_NODE];
        for node in &dependencies {
            if names.contains(&node.name.as_str()) {
                return Err(CompileError::DuplicateNode(node.name.clone()));
            }
            names.push(node.name.as_str());
        }

        for property in root
            .properties
            .iter()
            .chain(dependencies.iter().flat_map(|n| n.properties.iter()))
        {
            if let SchemaRef::Node(target) = &property.reference {
                if !names.contains(&target.as_str()) {
                    return Err(CompileError::DanglingReference(target.clone()));
                }
            }
        }

        Ok(Self { root, dependencies })
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn dependencies(&self) -> &[SchemaNode] {
        &self.dependencies
    }

    /// Renders the graph as one JSON Schema document: the root object
    /// inline, every dependency and both primitives under `$defs`,
    /// references by name. Property order follows declaration order.
    pub fn to_json(&self) -> Value {
        let mut defs = Map::new();
        defs.insert(TEXT_NODE.to_string(), json!({ "type": "string" }));
        defs.insert(
            TEXT_LIST_NODE.to_string(),
            json!({
                "type": "array",
                "items": { "$ref": format!("#/$defs/{TEXT_NODE}") },
                "minItems": 0,
                "maxItems": TEXT_LIST_MAX_ITEMS,
            }),
        );
        for node in &self.dependencies {
            defs.insert(node.name.clone(), object_json(node));
        }

        let mut document = object_json(&self.root);
        document
            .as_object_mut()
            .expect("object_json always returns an object")
            .insert("$defs".to_string(), Value::Object(defs));
        document
    }
}

/// Renders one object node. Every declared property is required and no
/// undeclared property is allowed — the backend must produce exactly the
/// declared shape.
fn object_json(node: &SchemaNode) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::with_capacity(node.properties.len());
    for property in &node.properties {
        properties.insert(
            property.name.clone(),
            json!({
                "$ref": format!("#/$defs/{}", property.reference.target()),
                "description": property.description,
            }),
        );
        required.push(Value::String(property.name.clone()));
    }

    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
        "additionalProperties": false,
    })
}
