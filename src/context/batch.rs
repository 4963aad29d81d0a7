//! Bulk link resolution.
//!
//! Large organizations cannot load thousands of links in one storage round
//! trip; ids are partitioned into fixed-size chunks, queried concurrently,
//! and merged back onto the originating handles by platform id.

use std::{collections::HashMap, sync::Arc};

use futures::future::{join_all, try_join_all};

use super::{ContextError, ContextResult, ResolutionContext, UserHandle};
use crate::store::StoreError;

/// Upper bound on ids per storage query.
pub const LINK_QUERY_CHUNK_SIZE: usize = 200;

impl ResolutionContext {
    /// Make sure system links are loaded for a set of users.
    ///
    /// Every handle must carry a non-empty id. Chunks are queried
    /// concurrently and the batch fails fast on the first chunk failure;
    /// handles with no stored link are left unlinked.
    pub async fn load_links_for_users(&self, users: &[Arc<UserHandle>]) -> ContextResult<()> {
        let mut ids = Vec::with_capacity(users.len());
        for user in users {
            if user.id().is_empty() {
                return Err(ContextError::MissingIdentifier);
            }
            ids.push(user.id().to_string());
        }

        let fetches = ids.chunks(LINK_QUERY_CHUNK_SIZE).map(|chunk| async move {
            self.store()
                .find_links_by_platform_ids(chunk)
                .await
                .map_err(wrap_storage_error)
        });
        let results = try_join_all(fetches).await?;

        // Merge by id so attachment is deterministic regardless of chunk
        // completion order.
        let links: HashMap<String, _> = results
            .into_iter()
            .flatten()
            .map(|link| (link.platform_user_id.clone(), link))
            .collect();
        for user in users {
            if let Some(link) = links.get(user.id()) {
                user.set_link(link.clone());
            }
        }
        Ok(())
    }

    /// Translate a list of ids into memoized user handles with their system
    /// links loaded.
    pub async fn users_and_links_from_ids(
        &self,
        ids: &[String],
    ) -> ContextResult<Vec<Arc<UserHandle>>> {
        let users: Vec<Arc<UserHandle>> = ids.iter().map(|id| self.user(id)).collect();
        self.load_links_for_users(&users).await?;
        Ok(users)
    }

    /// Translate a username → id mapping into handles with system links and
    /// live profile details loaded.
    ///
    /// Links and details are fetched concurrently. A per-user detail-fetch
    /// failure means the user left the platform and is not a batch failure;
    /// a link-resolution failure aborts the batch.
    pub async fn complete_users_from_username_map(
        &self,
        usernames_to_ids: &HashMap<String, String>,
    ) -> ContextResult<HashMap<String, Arc<UserHandle>>> {
        let mut users = HashMap::with_capacity(usernames_to_ids.len());
        let mut list = Vec::with_capacity(usernames_to_ids.len());
        for (username, id) in usernames_to_ids {
            let user = self.user_with_login(id, username);
            users.insert(username.clone(), user.clone());
            list.push(user);
        }

        let links = self.load_links_for_users(&list);
        let details = async {
            join_all(list.iter().map(|user| async move {
                if let Err(error) = user.load_profile_by_login(self.gateway()).await {
                    tracing::debug!(
                        user = user.id(),
                        %error,
                        "profile fetch failed during batch completion; user may have left the platform"
                    );
                }
            }))
            .await;
            Ok::<(), ContextError>(())
        };
        tokio::try_join!(links, details)?;

        Ok(users)
    }
}

fn wrap_storage_error(error: StoreError) -> ContextError {
    if let StoreError::Http { status, .. } = &error {
        ContextError::Storage {
            status: *status,
            source: error,
        }
    } else {
        ContextError::Store(error)
    }
}
