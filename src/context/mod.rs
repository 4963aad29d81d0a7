//! Per-request resolution context.
//!
//! One context exists per inbound authenticated request (or per batch
//! operation). Construction reconciles the request's dual-provider claims
//! against the link store; afterwards the context hands out memoized
//! org/user handles and composes batch and aggregation operations over
//! them. Contexts are destroyed at the end of the request; their caches
//! are never shared across requests.

mod aggregate;
mod batch;
mod error;
mod org;
mod team;
mod user;

use std::sync::Arc;

pub use aggregate::Maintainer;
pub use batch::LINK_QUERY_CHUNK_SIZE;
use dashmap::DashMap;
pub use error::{ContextError, ContextResult, Remediation};
pub use org::OrgHandle;
use parking_lot::RwLock;
pub use team::TeamHandle;
pub use user::UserHandle;

use crate::{
    config::PortalConfig,
    gateway::{OrgMembershipState, PlatformGateway},
    models::{IdentityLink, RequestClaims},
    store::LinkStore,
};

/// Directory-provider identity fields resolved onto a context.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIdentity {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub object_id: Option<uuid::Uuid>,
}

/// Platform-provider identity fields resolved onto a context.
#[derive(Debug, Clone, Default)]
pub struct PlatformIdentity {
    /// Platform numeric user id, stringified.
    pub id: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// OAuth tokens adopted from the resolved link.
#[derive(Clone, Default)]
pub struct AccessTokens {
    pub standard: Option<String>,
    pub elevated: Option<String>,
}

/// The caller's membership record in the primary organization, once known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryMembership {
    pub org: String,
    pub state: OrgMembershipState,
}

/// Construction input for a resolution context: an already-known link, or
/// an inbound request's claims, never both.
#[derive(Debug, Default)]
pub struct ContextOptions {
    pub link: Option<IdentityLink>,
    pub claims: Option<RequestClaims>,
}

impl ContextOptions {
    pub fn from_link(link: IdentityLink) -> Self {
        Self {
            link: Some(link),
            claims: None,
        }
    }

    pub fn from_claims(claims: RequestClaims) -> Self {
        Self {
            link: None,
            claims: Some(claims),
        }
    }
}

/// Per-request orchestrator holding the resolved identity, the handle
/// caches, and the current link.
pub struct ResolutionContext {
    config: Arc<PortalConfig>,
    store: Arc<dyn LinkStore>,
    gateway: Arc<dyn PlatformGateway>,

    directory: DirectoryIdentity,
    platform: PlatformIdentity,
    tokens: AccessTokens,
    link: Option<IdentityLink>,
    platform_user: Option<Arc<UserHandle>>,
    primary_membership: RwLock<Option<PrimaryMembership>>,

    org_handles: DashMap<String, Arc<OrgHandle>>,
    user_handles: DashMap<String, Arc<UserHandle>>,
}

impl ResolutionContext {
    /// Build a context from either a known link or inbound request claims.
    ///
    /// Passing both fails with [`ContextError::InvalidInput`]; passing
    /// neither fails with [`ContextError::NotInitialized`].
    pub async fn resolve(
        config: Arc<PortalConfig>,
        store: Arc<dyn LinkStore>,
        gateway: Arc<dyn PlatformGateway>,
        options: ContextOptions,
    ) -> ContextResult<Self> {
        let mut context = Self::empty(config, store, gateway);
        match (options.link, options.claims) {
            (Some(_), Some(_)) => Err(ContextError::InvalidInput),
            (Some(link), None) => {
                context.apply_link(link);
                Ok(context)
            }
            (None, Some(claims)) => {
                context.resolve_from_claims(claims).await?;
                Ok(context)
            }
            (None, None) => Err(ContextError::NotInitialized),
        }
    }

    fn empty(
        config: Arc<PortalConfig>,
        store: Arc<dyn LinkStore>,
        gateway: Arc<dyn PlatformGateway>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            directory: DirectoryIdentity::default(),
            platform: PlatformIdentity::default(),
            tokens: AccessTokens::default(),
            link: None,
            platform_user: None,
            primary_membership: RwLock::new(None),
            org_handles: DashMap::new(),
            user_handles: DashMap::new(),
        }
    }

    /// Populate the context from an inbound request's claims.
    async fn resolve_from_claims(&mut self, claims: RequestClaims) -> ContextResult<()> {
        if let Some(platform) = &claims.platform {
            self.platform.id = Some(platform.id.clone());
            self.platform.username = Some(platform.username.clone());
            self.platform.display_name = platform.display_name.clone();
            self.platform.avatar_url = platform.avatar_url.clone();
        }
        if let Some(directory) = &claims.directory {
            self.directory.username = directory.username.clone();
            self.directory.display_name = directory.display_name.clone();
            self.directory.object_id = directory.object_id;
        }

        let directory_oid = claims.directory.as_ref().and_then(|d| d.object_id);
        if self.config.authentication.scheme.is_directory_primary() {
            if let Some(object_id) = directory_oid {
                let mut links = self.store.find_links_by_directory_id(object_id).await?;
                if links.len() > 1 {
                    return Err(ContextError::TooManyLinks { links });
                }
                let Some(link) = links.pop() else {
                    // No link yet; the caller provisions the linking flow.
                    return Ok(());
                };
                if let Some(platform) = &claims.platform {
                    if !platform.username.is_empty()
                        && link.platform_username != platform.username
                        && link.platform_user_id != platform.id
                    {
                        return Err(ContextError::conflicting_identity(
                            &link,
                            platform,
                            self.end_user_label(),
                        ));
                    }
                }
                self.apply_link(link);
                return Ok(());
            }
        }

        // Not directory-driven (or no object-id): fall back to the platform
        // id already present on the context.
        let Some(platform_id) = self.platform.id.clone() else {
            tracing::error!("link resolution fell through every claim path");
            return Err(ContextError::Logic);
        };
        let handle = self.create_platform_user(&platform_id, self.platform.username.clone());
        if let Some(link) = handle.load_link(self.store.as_ref()).await? {
            self.apply_link(link);
        }
        Ok(())
    }

    /// Adopt a link: copy its identity fields and tokens onto the context
    /// and attach it to the platform-identity user handle.
    fn apply_link(&mut self, link: IdentityLink) {
        self.platform.username = Some(link.platform_username.clone());
        self.platform.id = Some(link.platform_user_id.clone());
        self.platform.avatar_url = link.platform_avatar_url.clone();
        self.directory.username = Some(link.directory_username.clone());
        self.directory.display_name = link.directory_display_name.clone();
        self.tokens.standard = link.platform_access_token.clone();
        self.tokens.elevated = link.platform_elevated_token.clone();

        if self.platform_user.is_none() {
            self.create_platform_user(&link.platform_user_id, Some(link.platform_username.clone()));
        }
        if let Some(user) = &self.platform_user {
            user.set_link(link.clone());
        }
        self.link = Some(link);
    }

    fn create_platform_user(&mut self, id: &str, login: Option<String>) -> Arc<UserHandle> {
        let handle = Arc::new(UserHandle::new(id));
        if let Some(login) = login {
            handle.set_login(&login);
        }
        self.platform_user = Some(handle.clone());
        handle
    }

    fn end_user_label(&self) -> String {
        self.directory
            .display_name
            .clone()
            .or_else(|| self.directory.username.clone())
            .unwrap_or_else(|| "Unknown user".to_string())
    }

    // ========================================================================
    // Resolved identity accessors
    // ========================================================================

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &dyn LinkStore {
        self.store.as_ref()
    }

    pub(crate) fn gateway(&self) -> &dyn PlatformGateway {
        self.gateway.as_ref()
    }

    pub fn directory(&self) -> &DirectoryIdentity {
        &self.directory
    }

    pub fn platform(&self) -> &PlatformIdentity {
        &self.platform
    }

    pub fn tokens(&self) -> &AccessTokens {
        &self.tokens
    }

    /// The resolved link, if resolution found one.
    pub fn link(&self) -> Option<&IdentityLink> {
        self.link.as_ref()
    }

    /// The user handle for the request's own platform identity, created
    /// during reconciliation.
    pub fn platform_user(&self) -> Option<Arc<UserHandle>> {
        self.platform_user.clone()
    }

    pub fn primary_membership(&self) -> Option<PrimaryMembership> {
        self.primary_membership.read().clone()
    }

    pub fn set_primary_membership(&self, membership: PrimaryMembership) {
        *self.primary_membership.write() = Some(membership);
    }

    // ========================================================================
    // Handle accessors
    // ========================================================================

    /// The org handle for `name`, memoized per context. An empty or absent
    /// name resolves to the primary (first-configured) organization.
    pub fn org(&self, name: Option<&str>) -> ContextResult<Arc<OrgHandle>> {
        let name = match name {
            Some(name) if !name.is_empty() => name.to_lowercase(),
            _ => self
                .config
                .primary_organization()
                .ok_or_else(|| ContextError::OrganizationNotConfigured(String::new()))?
                .key(),
        };
        if let Some(handle) = self.org_handles.get(&name) {
            return Ok(handle.clone());
        }
        let settings = self
            .config
            .organization(&name)
            .ok_or_else(|| ContextError::OrganizationNotConfigured(name.clone()))?
            .clone();
        let handle = self
            .org_handles
            .entry(name)
            .or_insert_with(|| Arc::new(OrgHandle::new(settings)));
        Ok(handle.clone())
    }

    /// Handles for every configured organization, in configuration order.
    pub fn orgs(&self) -> Vec<Arc<OrgHandle>> {
        self.config
            .organizations
            .iter()
            .filter_map(|org| self.org(Some(&org.name)).ok())
            .collect()
    }

    /// The user handle for a platform user id, memoized per context.
    pub fn user(&self, id: &str) -> Arc<UserHandle> {
        if let Some(handle) = self.user_handles.get(id) {
            return handle.clone();
        }
        let handle = self
            .user_handles
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(UserHandle::new(id)));
        handle.clone()
    }

    /// The memoized user handle for an id, with its login pinned.
    pub fn user_with_login(&self, id: &str, login: &str) -> Arc<UserHandle> {
        let handle = self.user(id);
        handle.set_login(login);
        handle
    }

    /// A single team by id: a bare (org-less, unmemoized) handle with its
    /// details hydrated.
    pub async fn team(&self, team_id: u64) -> ContextResult<Arc<TeamHandle>> {
        let team = Arc::new(TeamHandle::bare(team_id));
        team.load_details(self.gateway.as_ref())
            .await
            .map_err(|source| ContextError::TeamUnavailable {
                id: team_id,
                source,
            })?;
        Ok(team)
    }

    /// A set of teams by id; aborts on the first hydration failure.
    pub async fn team_set(&self, team_ids: &[u64]) -> ContextResult<Vec<Arc<TeamHandle>>> {
        futures::future::try_join_all(team_ids.iter().map(|id| self.team(*id))).await
    }

    // ========================================================================
    // Administrator check
    // ========================================================================

    /// Whether the caller belongs to the portal sudoers team on the primary
    /// organization.
    ///
    /// A query failure is returned as [`ContextError::AdminCheckFailed`],
    /// never as a negative result; callers must not conflate the two.
    pub async fn is_portal_administrator(&self) -> ContextResult<bool> {
        let org = self.org(None)?;
        let team_id =
            org.settings()
                .sudoers_team_id
                .ok_or_else(|| ContextError::MissingSudoersTeam {
                    org: org.name().to_string(),
                })?;
        let user_id = self
            .platform
            .id
            .as_deref()
            .ok_or(ContextError::MissingIdentifier)?;
        let is_member = self
            .gateway
            .is_team_member(team_id, user_id)
            .await
            .map_err(|source| ContextError::AdminCheckFailed { source })?;
        Ok(is_member)
    }
}
