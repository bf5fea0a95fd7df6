//! Execution results — ordered output groups produced per run.
//!
//! Values are created fresh per run and owned by the caller; they do not
//! outlive the request that produced them. The presentation layer matches
//! groups and fields back to template guidance by `id` / `key`, so those
//! identifiers echo the declaring `GroupSpec` / `FieldSpec` exactly.

use serde::{Deserialize, Serialize};

/// One decoded output section, in template declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputGroup {
    pub id: String,
    pub fields: Vec<FieldValue>,
}

/// One decoded field within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub key: String,
    pub value: FieldContent,
}

/// The decoded value. Serialized untagged: plain string for text, array of
/// strings for a text list — the consumer branches on the declared type it
/// already knows from the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldContent {
    Text(String),
    TextList(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_content_serializes_untagged() {
        let text = FieldContent::Text("ok".to_string());
        assert_eq!(serde_json::to_value(&text).unwrap(), serde_json::json!("ok"));

        let list = FieldContent::TextList(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            serde_json::json!(["a", "b"])
        );
    }

    #[test]
    fn test_output_group_wire_shape() {
        let group = OutputGroup {
            id: "summary".to_string(),
            fields: vec![FieldValue {
                key: "headline".to_string(),
                value: FieldContent::Text("ok".to_string()),
            }],
        };
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["id"], "summary");
        assert_eq!(value["fields"][0]["key"], "headline");
        assert_eq!(value["fields"][0]["value"], "ok");
    }
}
