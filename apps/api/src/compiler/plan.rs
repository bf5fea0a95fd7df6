//! Execution plans — the compiled bundle for one template version, and the
//! decoder that pulls declared fields back out of a generic structured
//! response.
//!
//! A plan is immutable once built and shared as `Arc` across concurrent
//! runs. The decode shape is cloned out of the template at compile time, so
//! later edits to a template can never affect a plan already in flight.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::compiler::schema::{
    CompileError, SchemaGraph, SchemaNode, SchemaProperty, SchemaRef, TEXT_LIST_MAX_ITEMS,
};
use crate::models::output::{FieldContent, FieldValue, OutputGroup};
use crate::models::template::{FieldType, Template};

/// Name of the root schema node. Never referenced, so it cannot collide
/// with a group id.
const OUTPUT_NODE: &str = "Output";

/// A structured response that does not match the compiled shape. Never
/// silently defaulted — always surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("response is missing group {0:?}")]
    MissingGroup(String),

    #[error("response is missing field {0:?}")]
    MissingField(String),

    #[error("field {0:?} does not match its declared type")]
    TypeMismatch(String),
}

/// Decode shape of one field, captured at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub key: String,
    pub kind: FieldType,
}

/// Decode shape of one group, captured at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupShape {
    pub id: String,
    pub fields: Vec<FieldShape>,
}

/// The compiled bundle: template identity, version, instructions, schema
/// graph, and the decode shape.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub template_id: Uuid,
    pub version: u32,
    pub instructions: String,
    schema: SchemaGraph,
    groups: Vec<GroupShape>,
}

/// Compiles a template into an execution plan.
///
/// Builds one schema node per group (fields in declaration order, each
/// carrying its `guide` as the property description), then a root node
/// referencing the group nodes by name with group titles as descriptions.
/// Graph assembly enforces reference consistency — two groups sharing an
/// id fail here as a duplicate node.
pub fn compile(template: &Template) -> Result<ExecutionPlan, CompileError> {
    let mut dependencies = Vec::with_capacity(template.groups.len());
    for group in &template.groups {
        let properties = group
            .fields
            .iter()
            .map(|field| SchemaProperty {
                name: field.key.clone(),
                description: field.guide.clone(),
                reference: match field.value_type {
                    FieldType::Text => SchemaRef::Text,
                    FieldType::TextList => SchemaRef::TextList,
                },
            })
            .collect();
        dependencies.push(SchemaNode {
            name: group.id.clone(),
            properties,
        });
    }

    let root = SchemaNode {
        name: OUTPUT_NODE.to_string(),
        properties: template
            .groups
            .iter()
            .map(|group| SchemaProperty {
                name: group.id.clone(),
                description: group.title.clone(),
                reference: SchemaRef::Node(group.id.clone()),
            })
            .collect(),
    };

    let schema = SchemaGraph::assemble(root, dependencies)?;

    let groups = template
        .groups
        .iter()
        .map(|group| GroupShape {
            id: group.id.clone(),
            fields: group
                .fields
                .iter()
                .map(|field| FieldShape {
                    key: field.key.clone(),
                    kind: field.value_type,
                })
                .collect(),
        })
        .collect();

    Ok(ExecutionPlan {
        template_id: template.id,
        version: template.version,
        instructions: template.instructions.clone(),
        schema,
        groups,
    })
}

impl ExecutionPlan {
    /// The schema graph as the JSON Schema document handed to the backend.
    pub fn schema_json(&self) -> Value {
        self.schema.to_json()
    }

    pub fn schema(&self) -> &SchemaGraph {
        &self.schema
    }

    /// Decodes a generic structured response into ordered output groups.
    ///
    /// Output order is always the template's declaration order — groups and
    /// fields are looked up by name, never enumerated in the order the
    /// response happens to carry them.
    pub fn decode(&self, response: &Value) -> Result<Vec<OutputGroup>, DecodeError> {
        let mut output = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let sub = response
                .get(&group.id)
                .and_then(Value::as_object)
                .ok_or_else(|| DecodeError::MissingGroup(group.id.clone()))?;

            let mut fields = Vec::with_capacity(group.fields.len());
            for field in &group.fields {
                let raw = sub
                    .get(&field.key)
                    .ok_or_else(|| DecodeError::MissingField(field.key.clone()))?;
                fields.push(FieldValue {
                    key: field.key.clone(),
                    value: decode_field(raw, field)?,
                });
            }

            output.push(OutputGroup {
                id: group.id.clone(),
                fields,
            });
        }
        Ok(output)
    }
}

/// Coerces one raw value to its declared type. A list longer than the
/// schema bound is outside contract even if the backend let it through.
fn decode_field(raw: &Value, field: &FieldShape) -> Result<FieldContent, DecodeError> {
    match field.kind {
        FieldType::Text => raw
            .as_str()
            .map(|s| FieldContent::Text(s.to_string()))
            .ok_or_else(|| DecodeError::TypeMismatch(field.key.clone())),
        FieldType::TextList => {
            let items = raw
                .as_array()
                .ok_or_else(|| DecodeError::TypeMismatch(field.key.clone()))?;
            if items.len() > TEXT_LIST_MAX_ITEMS {
                return Err(DecodeError::TypeMismatch(field.key.clone()));
            }
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| DecodeError::TypeMismatch(field.key.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldContent::TextList)
        }
    }
}
