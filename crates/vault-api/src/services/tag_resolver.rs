//! Service for resolving tag names to shared tag records.
//!
//! Names are normalized (trimmed, de-duplicated, validated) and then
//! looked up or created. Tags are global: two users writing the tag `rust`
//! share one record.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use vault_core::{normalize_tag_names, Result, Tag, TagRepository};

/// Resolves tag names to records, creating missing tags on the way.
#[derive(Clone)]
pub struct TagResolver {
    tags: Arc<dyn TagRepository>,
}

impl TagResolver {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    /// Normalize `names` and return one record per distinct name, in input order.
    pub async fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Tag>> {
        let names = normalize_tag_names(names)?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let tags = self.tags.resolve(&names).await?;
        debug!(
            subsystem = "api",
            component = "tag_resolver",
            tag_count = tags.len(),
            "Resolved tags"
        );
        Ok(tags)
    }

    /// Resolve and return only the ids.
    pub async fn resolve_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Uuid>> {
        Ok(self.resolve(names).await?.into_iter().map(|t| t.id).collect())
    }

    /// Tags used by at least one of the owner's notes, sorted by name.
    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Tag>> {
        self.tags.list_for_owner(owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_db::MemoryStore;

    #[tokio::test]
    async fn test_resolve_normalizes_and_reuses() {
        let store = Arc::new(MemoryStore::new());
        let resolver = TagResolver::new(store.clone());

        let first = resolver.resolve(&[" rust", "db", "rust"]).await.unwrap();
        assert_eq!(
            first.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["rust", "db"]
        );

        let again = resolver.resolve_ids(&["db"]).await.unwrap();
        assert_eq!(again, vec![first[1].id]);
        assert_eq!(store.tag_count().await, 2);
    }

    #[tokio::test]
    async fn test_resolve_empty_skips_storage() {
        let store = Arc::new(MemoryStore::new());
        let resolver = TagResolver::new(store.clone());
        let empty: Vec<String> = vec!["  ".to_string()];
        assert!(resolver.resolve(&empty).await.unwrap().is_empty());
        assert_eq!(store.tag_count().await, 0);
    }
}
