//! Plan cache — memoizes compilation per (template id, version).
//!
//! The cache is the only shared mutable state in this core. One async mutex
//! guards the map, and a miss compiles and stores while still holding it,
//! so concurrent misses for the same key serialize: exactly one compile
//! reaches storage and every loser observes the winner's plan. Compilation
//! is synchronous and does no I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::compiler::plan::{compile, ExecutionPlan};
use crate::compiler::schema::CompileError;
use crate::models::template::Template;

type PlanKey = (Uuid, u32);

/// Exclusive-access map from (template id, version) to its compiled plan.
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: Mutex<HashMap<PlanKey, Arc<ExecutionPlan>>>,
    compiles: AtomicU64,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached plan for `(template.id, template.version)`,
    /// compiling and storing it on a miss. A failed compile is returned to
    /// the caller and never stored.
    pub async fn get_or_compile(
        &self,
        template: &Template,
    ) -> Result<Arc<ExecutionPlan>, CompileError> {
        let key = (template.id, template.version);
        let mut plans = self.plans.lock().await;
        if let Some(plan) = plans.get(&key) {
            return Ok(Arc::clone(plan));
        }

        let plan = Arc::new(compile(template)?);
        self.compiles.fetch_add(1, Ordering::Relaxed);
        debug!(
            template_id = %template.id,
            version = template.version,
            "compiled execution plan"
        );
        plans.insert(key, Arc::clone(&plan));
        Ok(plan)
    }

    /// Removes every cached plan for `template_id`, regardless of version.
    pub async fn invalidate(&self, template_id: Uuid) {
        let mut plans = self.plans.lock().await;
        plans.retain(|(id, _), _| *id != template_id);
    }

    /// Drops all cached plans.
    pub async fn clear(&self) {
        self.plans.lock().await.clear();
    }

    /// Number of compiles that reached storage. Used by tests to assert the
    /// one-compile-per-key guarantee.
    pub fn compile_count(&self) -> u64 {
        self.compiles.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{
        FieldSpec, FieldType, GroupSpec, InputKind, InputSpec, Template,
    };

    fn make_template(id: Uuid, version: u32) -> Template {
        Template {
            id,
            name: "Digest".to_string(),
            instructions: "Extract the requested fields.".to_string(),
            input: InputSpec {
                kind: InputKind::Text,
                title: None,
                description: "Free text input".to_string(),
            },
            groups: vec![GroupSpec {
                id: "summary".to_string(),
                title: "Summary".to_string(),
                description: None,
                fields: vec![FieldSpec {
                    key: "headline".to_string(),
                    guide: "One-line headline".to_string(),
                    value_type: FieldType::Text,
                }],
            }],
            version,
            example_input: None,
        }
    }

    #[tokio::test]
    async fn test_second_get_is_a_hit() {
        let cache = PlanCache::new();
        let template = make_template(Uuid::new_v4(), 1);

        let first = cache.get_or_compile(&template).await.unwrap();
        let second = cache.get_or_compile(&template).await.unwrap();

        assert_eq!(cache.compile_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_new_version_compiles_again() {
        let cache = PlanCache::new();
        let id = Uuid::new_v4();

        cache.get_or_compile(&make_template(id, 1)).await.unwrap();
        cache.get_or_compile(&make_template(id, 2)).await.unwrap();

        assert_eq!(cache.compile_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_drops_all_versions() {
        let cache = PlanCache::new();
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();

        cache.get_or_compile(&make_template(id, 1)).await.unwrap();
        cache.get_or_compile(&make_template(id, 2)).await.unwrap();
        cache
            .get_or_compile(&make_template(other, 1))
            .await
            .unwrap();

        cache.invalidate(id).await;

        // Both versions of `id` recompile; `other` is still cached.
        cache.get_or_compile(&make_template(id, 1)).await.unwrap();
        cache.get_or_compile(&make_template(id, 2)).await.unwrap();
        cache
            .get_or_compile(&make_template(other, 1))
            .await
            .unwrap();

        assert_eq!(cache.compile_count(), 5);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = PlanCache::new();
        let template = make_template(Uuid::new_v4(), 1);

        cache.get_or_compile(&template).await.unwrap();
        cache.clear().await;
        cache.get_or_compile(&template).await.unwrap();

        assert_eq!(cache.compile_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_compile_not_stored() {
        let cache = PlanCache::new();
        let mut template = make_template(Uuid::new_v4(), 1);
        // Two groups with the same id: compiles to a duplicate schema node.
        template.groups.push(template.groups[0].clone());

        assert!(cache.get_or_compile(&template).await.is_err());
        assert_eq!(cache.compile_count(), 0);

        // The failure did not poison the key: a fixed template compiles.
        template.groups.pop();
        assert!(cache.get_or_compile(&template).await.is_ok());
        assert_eq!(cache.compile_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_compile_once() {
        let cache = Arc::new(PlanCache::new());
        let template = make_template(Uuid::new_v4(), 1);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let template = template.clone();
            handles.push(tokio::spawn(async move {
                cache.get_or_compile(&template).await.unwrap()
            }));
        }

        let plans: Vec<Arc<ExecutionPlan>> = {
            let mut out = Vec::new();
            for handle in handles {
                out.push(handle.await.unwrap());
            }
            out
        };

        assert_eq!(cache.compile_count(), 1);
        for plan in &plans[1..] {
            assert!(Arc::ptr_eq(&plans[0], plan));
        }
    }
}
