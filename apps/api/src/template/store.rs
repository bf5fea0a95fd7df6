//! In-memory template registry.
//!
//! Durable persistence and multi-device sync are external collaborators;
//! this registry stands in for them behind the same read/write surface.
//! Callers MUST validate a template before registering it — the store
//! trusts its input (producer-side contract).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::template::Template;

/// One registry row: the template plus registry metadata.
#[derive(Debug, Clone, Serialize)]
pub struct StoredTemplate {
    #[serde(flatten)]
    pub template: Template,
    #[serde(rename = "registeredAt")]
    pub registered_at: DateTime<Utc>,
}

/// Listing row — enough for a picker UI without shipping full templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub name: String,
    pub version: u32,
    pub groups: usize,
    #[serde(rename = "registeredAt")]
    pub registered_at: DateTime<Utc>,
}

/// Registry keyed by template id. One row per id — registering an existing
/// id replaces the previous version.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: RwLock<HashMap<Uuid, StoredTemplate>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the template for its id. Returns the stored row.
    pub async fn upsert(&self, template: Template) -> StoredTemplate {
        let stored = StoredTemplate {
            template,
            registered_at: Utc::now(),
        };
        let mut templates = self.templates.write().await;
        templates.insert(stored.template.id, stored.clone());
        stored
    }

    pub async fn get(&self, id: Uuid) -> Option<Template> {
        let templates = self.templates.read().await;
        templates.get(&id).map(|stored| stored.template.clone())
    }

    pub async fn list(&self) -> Vec<TemplateSummary> {
        let templates = self.templates.read().await;
        let mut summaries: Vec<TemplateSummary> = templates
            .values()
            .map(|stored| TemplateSummary {
                id: stored.template.id,
                name: stored.template.name.clone(),
                version: stored.template.version,
                groups: stored.template.groups.len(),
                registered_at: stored.registered_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Removes the template for `id`. Returns whether a row existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut templates = self.templates.write().await;
        templates.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{
        FieldSpec, FieldType, GroupSpec, InputKind, InputSpec,
    };

    fn make_template(id: Uuid, name: &str, version: u32) -> Template {
        Template {
            id,
            name: name.to_string(),
            instructions: "Extract.".to_string(),
            input: InputSpec {
                kind: InputKind::Text,
                title: None,
                description: "input".to_string(),
            },
            groups: vec![GroupSpec {
                id: "summary".to_string(),
                title: "Summary".to_string(),
                description: None,
                fields: vec![FieldSpec {
                    key: "headline".to_string(),
                    guide: "guide".to_string(),
                    value_type: FieldType::Text,
                }],
            }],
            version,
            example_input: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = TemplateStore::new();
        let id = Uuid::new_v4();
        store.upsert(make_template(id, "Digest", 1)).await;

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.name, "Digest");
        assert_eq!(fetched.version, 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_previous_version() {
        let store = TemplateStore::new();
        let id = Uuid::new_v4();
        store.upsert(make_template(id, "Digest", 1)).await;
        store.upsert(make_template(id, "Digest", 2)).await;

        assert_eq!(store.get(id).await.unwrap().version, 2);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let store = TemplateStore::new();
        store
            .upsert(make_template(Uuid::new_v4(), "Zeta", 1))
            .await;
        store
            .upsert(make_template(Uuid::new_v4(), "Alpha", 1))
            .await;

        let names: Vec<String> = store.list().await.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Alpha".to_string(), "Zeta".to_string()]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = TemplateStore::new();
        let id = Uuid::new_v4();
        store.upsert(make_template(id, "Digest", 1)).await;

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
    }
}
