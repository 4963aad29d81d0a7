use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{LinkStore, StoreResult};
use crate::models::IdentityLink;

/// In-memory link store keyed by platform user id.
///
/// Single-node only; intended for local development and tests. Duplicate
/// links for one directory identity can be seeded deliberately to exercise
/// the too-many-links path.
#[derive(Default)]
pub struct MemoryLinkStore {
    links: DashMap<String, Vec<IdentityLink>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a link. Existing links for the same platform user id are kept,
    /// so seeding the same id twice produces a duplicate-link state.
    pub fn insert(&self, link: IdentityLink) {
        self.links
            .entry(link.platform_user_id.clone())
            .or_default()
            .push(link);
    }

    pub fn len(&self) -> usize {
        self.links.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn find_links_by_directory_id(
        &self,
        object_id: Uuid,
    ) -> StoreResult<Vec<IdentityLink>> {
        Ok(self
            .links
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|link| link.directory_object_id == object_id)
            .collect())
    }

    async fn find_links_by_platform_ids(&self, ids: &[String]) -> StoreResult<Vec<IdentityLink>> {
        let mut found = Vec::new();
        for id in ids {
            if let Some(entry) = self.links.get(id) {
                found.extend(entry.value().clone());
            }
        }
        Ok(found)
    }
}
