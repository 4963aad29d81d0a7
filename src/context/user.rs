use parking_lot::RwLock;

use crate::{
    gateway::{GatewayResult, PlatformGateway, UserProfile},
    models::IdentityLink,
    store::{LinkStore, StoreResult},
};

/// Context-scoped proxy for a platform user.
///
/// Carries the platform user id plus lazily-populated state: a pinned login,
/// the user's identity link, and live profile details. Handles obtained
/// through the context accessor are memoized: the same id yields the same
/// instance for the life of the context.
pub struct UserHandle {
    id: String,
    state: RwLock<UserState>,
}

#[derive(Default)]
struct UserState {
    login: Option<String>,
    link: Option<IdentityLink>,
    profile: Option<UserProfile>,
}

impl UserHandle {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(UserState::default()),
        }
    }

    /// Platform user id. Immutable after construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The login pinned on this handle, from construction, an adopted link,
    /// or fetched profile details.
    pub fn login(&self) -> Option<String> {
        self.state.read().login.clone()
    }

    pub(crate) fn set_login(&self, login: &str) {
        self.state.write().login = Some(login.to_string());
    }

    /// The identity link attached to this handle, if resolved.
    pub fn link(&self) -> Option<IdentityLink> {
        self.state.read().link.clone()
    }

    pub(crate) fn set_link(&self, link: IdentityLink) {
        let mut state = self.state.write();
        if state.login.is_none() {
            state.login = Some(link.platform_username.clone());
        }
        state.link = Some(link);
    }

    /// Profile details, if fetched.
    pub fn profile(&self) -> Option<UserProfile> {
        self.state.read().profile.clone()
    }

    /// Resolve this user's stored link, memoized for the context lifetime.
    pub(crate) async fn load_link(
        &self,
        store: &dyn LinkStore,
    ) -> StoreResult<Option<IdentityLink>> {
        if let Some(link) = self.link() {
            return Ok(Some(link));
        }
        let links = store
            .find_links_by_platform_ids(std::slice::from_ref(&self.id))
            .await?;
        let link = links
            .into_iter()
            .find(|link| link.platform_user_id == self.id);
        if let Some(link) = &link {
            self.set_link(link.clone());
        }
        Ok(link)
    }

    /// Fetch live profile details by the pinned login, memoized for the
    /// context lifetime. Returns `None` without a gateway call when no login
    /// is pinned.
    pub(crate) async fn load_profile_by_login(
        &self,
        gateway: &dyn PlatformGateway,
    ) -> GatewayResult<Option<UserProfile>> {
        if let Some(profile) = self.profile() {
            return Ok(Some(profile));
        }
        let Some(login) = self.login() else {
            return Ok(None);
        };
        let profile = gateway.user_by_username(&login).await?;
        self.state.write().profile = Some(profile.clone());
        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        store::MemoryLinkStore,
        tests::fixtures::{FakeGateway, link},
    };

    #[tokio::test]
    async fn test_load_link_matches_own_id() {
        let store = MemoryLinkStore::new();
        store.insert(link("7", "grace", "grace@contoso.com"));

        let user = UserHandle::new("7");
        let found = user.load_link(&store).await.unwrap();
        assert_eq!(found.unwrap().platform_username, "grace");
        // Adopting the link pins the login too.
        assert_eq!(user.login().as_deref(), Some("grace"));
    }

    #[tokio::test]
    async fn test_load_link_absent_leaves_handle_unlinked() {
        let store = MemoryLinkStore::new();
        let user = UserHandle::new("7");
        assert!(user.load_link(&store).await.unwrap().is_none());
        assert!(user.link().is_none());
    }

    #[tokio::test]
    async fn test_profile_fetch_is_memoized() {
        let gateway = Arc::new(FakeGateway::new());
        gateway.add_profile("grace", "7");

        let user = UserHandle::new("7");
        user.set_login("grace");
        let first = user.load_profile_by_login(gateway.as_ref()).await.unwrap();
        let second = user.load_profile_by_login(gateway.as_ref()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.profile_calls(), 1);
    }

    #[tokio::test]
    async fn test_profile_fetch_without_login_is_a_no_op() {
        let gateway = Arc::new(FakeGateway::new());
        let user = UserHandle::new("7");
        let profile = user.load_profile_by_login(gateway.as_ref()).await.unwrap();
        assert!(profile.is_none());
        assert_eq!(gateway.profile_calls(), 0);
    }
}
