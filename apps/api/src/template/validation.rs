//! Template validation — structural invariants checked before a template is
//! registered or compiled.
//!
//! Pure and deterministic: no side effects, fail-fast on the first
//! violation. Registration refuses any template that fails here, so the
//! compiler downstream only ever sees structurally sound input (it still
//! guards the schema graph itself — see `compiler::schema`).

use std::collections::HashSet;

use thiserror::Error;

use crate::models::template::Template;

/// A structural defect in an authored template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("template name is empty")]
    EmptyName,

    #[error("template declares no output groups")]
    EmptyGroups,

    #[error("invalid identifier {0:?} (expected [A-Za-z0-9_]+)")]
    InvalidId(String),

    #[error("duplicate field keys in group {0:?}")]
    DuplicateKeys(String),
}

/// Checks a template's structural invariants, in order:
///
/// 1. `name` non-empty after trimming.
/// 2. At least one output group.
/// 3. Every group id matches `[A-Za-z0-9_]+`.
/// 4. Every field key matches the same pattern and is unique within its
///    owning group.
///
/// Group ids are NOT checked for uniqueness across the template here; two
/// groups sharing an id surface as a duplicate schema node at compile time.
pub fn validate(template: &Template) -> Result<(), ValidationError> {
    if template.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if template.groups.is_empty() {
        return Err(ValidationError::EmptyGroups);
    }

    for group in &template.groups {
        if !is_identifier(&group.id) {
            return Err(ValidationError::InvalidId(group.id.clone()));
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(group.fields.len());
        for field in &group.fields {
            if !is_identifier(&field.key) {
                return Err(ValidationError::InvalidId(field.key.clone()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(ValidationError::DuplicateKeys(group.id.clone()));
            }
        }
    }

    Ok(())
}

/// True for non-empty `[A-Za-z0-9_]+` strings.
fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{FieldSpec, FieldType, GroupSpec, InputKind, InputSpec};
    use uuid::Uuid;

    fn make_field(key: &str, value_type: FieldType) -> FieldSpec {
        FieldSpec {
            key: key.to_string(),
            guide: format!("guide for {key}"),
            value_type,
        }
    }

    fn make_group(id: &str, fields: Vec<FieldSpec>) -> GroupSpec {
        GroupSpec {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            fields,
        }
    }

    fn make_template(name: &str, groups: Vec<GroupSpec>) -> Template {
        Template {
            id: Uuid::new_v4(),
            name: name.to_string(),
            instructions: "Extract the requested fields.".to_string(),
            input: InputSpec {
                kind: InputKind::Text,
                title: None,
                description: "Free text input".to_string(),
            },
            groups,
            version: 1,
            example_input: None,
        }
    }

    #[test]
    fn test_valid_template_passes() {
        let template = make_template(
            "Digest",
            vec![make_group(
                "summary",
                vec![
                    make_field("headline", FieldType::Text),
                    make_field("tags", FieldType::TextList),
                ],
            )],
        );
        assert_eq!(validate(&template), Ok(()));
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let template = make_template("   ", vec![make_group("g", vec![])]);
        assert_eq!(validate(&template), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_zero_groups_rejected() {
        let template = make_template("Digest", vec![]);
        assert_eq!(validate(&template), Err(ValidationError::EmptyGroups));
    }

    #[test]
    fn test_bad_group_id_rejected() {
        let template = make_template("Digest", vec![make_group("bad id!", vec![])]);
        assert_eq!(
            validate(&template),
            Err(ValidationError::InvalidId("bad id!".to_string()))
        );
    }

    #[test]
    fn test_bad_field_key_rejected() {
        let template = make_template(
            "Digest",
            vec![make_group("summary", vec![make_field("head line", FieldType::Text)])],
        );
        assert_eq!(
            validate(&template),
            Err(ValidationError::InvalidId("head line".to_string()))
        );
    }

    #[test]
    fn test_duplicate_field_keys_rejected() {
        let template = make_template(
            "Digest",
            vec![make_group(
                "summary",
                vec![
                    make_field("text", FieldType::Text),
                    make_field("text", FieldType::Text),
                ],
            )],
        );
        assert_eq!(
            validate(&template),
            Err(ValidationError::DuplicateKeys("summary".to_string()))
        );
    }

    #[test]
    fn test_duplicate_keys_scoped_per_group() {
        // The same key in two different groups is fine.
        let template = make_template(
            "Digest",
            vec![
                make_group("summary", vec![make_field("text", FieldType::Text)]),
                make_group("details", vec![make_field("text", FieldType::Text)]),
            ],
        );
        assert_eq!(validate(&template), Ok(()));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let template = make_template("Digest", vec![make_group("", vec![])]);
        assert_eq!(
            validate(&template),
            Err(ValidationError::InvalidId(String::new()))
        );
    }

    #[test]
    fn test_name_check_precedes_group_check() {
        // Fail-fast ordering: empty name wins over empty groups.
        let template = make_template("  ", vec![]);
        assert_eq!(validate(&template), Err(ValidationError::EmptyName));
    }
}
