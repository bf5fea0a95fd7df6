//! Template data model — the user-authored, versioned description of one
//! input slot and an ordered list of output groups.
//!
//! Field names follow the persisted wire shape: the input slot is the
//! `incidentBeam`, the output groups are the `refractedBeams`. Templates are
//! authored by external tooling and handed to this service read-only; the
//! compiler never mutates one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A runtime-defined structured-output contract.
///
/// `version` is part of the plan cache key and MUST change whenever
/// `groups` or their fields change — a stale version number would silently
/// serve a stale compiled plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    /// Session-level instructions. The only per-template steering channel
    /// besides the per-field `guide` strings.
    pub instructions: String,
    #[serde(rename = "incidentBeam")]
    pub input: InputSpec,
    #[serde(rename = "refractedBeams")]
    pub groups: Vec<GroupSpec>,
    pub version: u32,
    #[serde(rename = "exampleInput", skip_serializing_if = "Option::is_none")]
    pub example_input: Option<String>,
}

/// Describes the single free-text input slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
}

/// The input slot kind. Fixed to free text for this system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    #[default]
    #[serde(rename = "string")]
    Text,
}

/// One named output group: a section of the generated result.
///
/// `id` doubles as the schema property name and the output group's
/// identifier, so it must match `[A-Za-z0-9_]+` (enforced by the validator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
}

/// A single named, typed value within a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    /// Natural-language guidance, carried into the schema as the property
    /// description. This is the entire per-field steering mechanism.
    pub guide: String,
    #[serde(rename = "valueType")]
    pub value_type: FieldType,
}

/// Closed set of field types. Two variants only — the schema shape stays
/// predictable for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    Text,
    #[serde(rename = "stringArray")]
    TextList,
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE_TEMPLATE: &str = r#"{
        "id": "3fa4e9d2-9c1b-4f6a-8f2e-1d0a5b7c9e31",
        "name": "Meeting digest",
        "instructions": "Summarize the meeting notes.",
        "incidentBeam": {
            "type": "string",
            "title": "Notes",
            "description": "Raw meeting notes"
        },
        "refractedBeams": [
            {
                "id": "summary",
                "title": "Summary",
                "fields": [
                    { "key": "headline", "guide": "One-line headline", "valueType": "string" },
                    { "key": "tags", "guide": "Topic tags", "valueType": "stringArray" }
                ]
            }
        ],
        "version": 3,
        "exampleInput": "Alice and Bob discussed the Q3 roadmap."
    }"#;

    #[test]
    fn test_deserialize_wire_shape() {
        let template: Template = serde_json::from_str(WIRE_TEMPLATE).unwrap();
        assert_eq!(template.name, "Meeting digest");
        assert_eq!(template.version, 3);
        assert_eq!(template.input.kind, InputKind::Text);
        assert_eq!(template.input.title.as_deref(), Some("Notes"));
        assert_eq!(template.groups.len(), 1);
        assert_eq!(template.groups[0].id, "summary");
        assert_eq!(template.groups[0].fields[0].value_type, FieldType::Text);
        assert_eq!(template.groups[0].fields[1].value_type, FieldType::TextList);
        assert_eq!(
            template.example_input.as_deref(),
            Some("Alice and Bob discussed the Q3 roadmap.")
        );
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let template: Template = serde_json::from_str(WIRE_TEMPLATE).unwrap();
        let value = serde_json::to_value(&template).unwrap();
        assert!(value.get("incidentBeam").is_some());
        assert!(value.get("refractedBeams").is_some());
        assert!(value.get("exampleInput").is_some());
        assert_eq!(value["incidentBeam"]["type"], "string");
        assert_eq!(
            value["refractedBeams"][0]["fields"][1]["valueType"],
            "stringArray"
        );
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let mut template: Template = serde_json::from_str(WIRE_TEMPLATE).unwrap();
        template.example_input = None;
        template.input.title = None;
        let value = serde_json::to_value(&template).unwrap();
        assert!(value.get("exampleInput").is_none());
        assert!(value["incidentBeam"].get("title").is_none());
    }

    #[test]
    fn test_round_trip() {
        let template: Template = serde_json::from_str(WIRE_TEMPLATE).unwrap();
        let json = serde_json::to_string(&template).unwrap();
        let again: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_value(&template).unwrap(), serde_json::to_value(&again).unwrap());
    }
}
