//! Fakes and fixture builders shared across the test suites.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    config::{AuthScheme, AuthenticationConfig, OrganizationConfig, PortalConfig},
    context::{ContextOptions, ResolutionContext},
    gateway::{
        GatewayError, GatewayResult, OrgMembershipState, PlatformGateway, TeamDetails,
        TeamMember, TeamRole, TeamSummary, UserProfile,
    },
    models::{DirectoryClaims, IdentityLink, PlatformClaims, RequestClaims},
    store::{LinkStore, MemoryLinkStore, StoreError, StoreResult},
};

/// The default sudoers team id configured on the primary test org.
pub(crate) const SUDOERS_TEAM_ID: u64 = 310;

// ============================================================================
// Fixture builders
// ============================================================================

/// A link with a fresh directory object-id and a standard-scope token.
pub(crate) fn link(platform_id: &str, platform_username: &str, upn: &str) -> IdentityLink {
    IdentityLink {
        directory_object_id: Uuid::new_v4(),
        directory_username: upn.to_string(),
        directory_display_name: None,
        platform_user_id: platform_id.to_string(),
        platform_username: platform_username.to_string(),
        platform_avatar_url: None,
        platform_access_token: Some(format!("gho_{platform_id}")),
        platform_elevated_token: None,
    }
}

pub(crate) fn member(id: &str, login: &str) -> TeamMember {
    TeamMember {
        id: id.to_string(),
        login: login.to_string(),
        avatar_url: None,
    }
}

pub(crate) fn team_summary(id: u64, name: &str) -> TeamSummary {
    TeamSummary {
        id,
        name: name.to_string(),
        slug: Some(name.to_string()),
        description: None,
    }
}

pub(crate) fn org_config(name: &str, sudoers_team_id: Option<u64>) -> OrganizationConfig {
    OrganizationConfig {
        name: name.to_string(),
        description: None,
        sudoers_team_id,
    }
}

// ============================================================================
// Fake platform gateway
// ============================================================================

/// Scripted [`PlatformGateway`] with per-entity failure switches and call
/// counters. Unseeded member lists and team lists are empty, not errors;
/// unseeded memberships are "no record".
#[derive(Default)]
pub(crate) struct FakeGateway {
    profiles: DashMap<String, UserProfile>,
    org_memberships: DashMap<(String, String), OrgMembershipState>,
    org_teams: DashMap<String, Vec<TeamSummary>>,
    team_details: DashMap<u64, TeamDetails>,
    team_members: DashMap<(u64, TeamRole), Vec<TeamMember>>,
    team_memberships: DashMap<(u64, String), bool>,

    failed_orgs: DashMap<String, ()>,
    failed_org_teams: DashMap<String, ()>,
    failed_team_members: DashMap<u64, ()>,
    fail_team_membership: AtomicBool,

    profile_calls: AtomicUsize,
    org_membership_calls: AtomicUsize,
    org_team_calls: AtomicUsize,
    team_member_calls: AtomicUsize,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_profile(&self, login: &str, id: &str) {
        self.profiles.insert(
            login.to_string(),
            UserProfile {
                id: id.to_string(),
                login: login.to_string(),
                name: None,
                avatar_url: None,
            },
        );
    }

    pub(crate) fn set_org_membership(&self, org: &str, username: &str, state: OrgMembershipState) {
        self.org_memberships
            .insert((org.to_string(), username.to_string()), state);
    }

    pub(crate) fn add_org_teams(&self, org: &str, teams: Vec<TeamSummary>) {
        self.org_teams.insert(org.to_string(), teams);
    }

    pub(crate) fn add_team_details(&self, id: u64, name: &str, organization: Option<&str>) {
        self.team_details.insert(
            id,
            TeamDetails {
                id,
                name: name.to_string(),
                slug: Some(name.to_string()),
                description: None,
                organization: organization.map(str::to_string),
            },
        );
    }

    pub(crate) fn add_team_members(&self, team_id: u64, role: TeamRole, members: Vec<TeamMember>) {
        self.team_members.insert((team_id, role), members);
    }

    pub(crate) fn set_team_membership(&self, team_id: u64, user_id: &str, is_member: bool) {
        self.team_memberships
            .insert((team_id, user_id.to_string()), is_member);
    }

    pub(crate) fn fail_org(&self, org: &str) {
        self.failed_orgs.insert(org.to_string(), ());
    }

    pub(crate) fn fail_org_teams(&self, org: &str) {
        self.failed_org_teams.insert(org.to_string(), ());
    }

    pub(crate) fn fail_team_members(&self, team_id: u64) {
        self.failed_team_members.insert(team_id, ());
    }

    pub(crate) fn fail_team_membership(&self) {
        self.fail_team_membership.store(true, Ordering::SeqCst);
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn org_membership_calls(&self) -> usize {
        self.org_membership_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn org_team_calls(&self) -> usize {
        self.org_team_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn team_member_calls(&self) -> usize {
        self.team_member_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformGateway for FakeGateway {
    async fn user_by_username(&self, username: &str) -> GatewayResult<UserProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .get(username)
            .map(|profile| profile.clone())
            .ok_or(GatewayError::NotFound)
    }

    async fn org_membership(
        &self,
        org: &str,
        username: &str,
        _allow_cached: bool,
    ) -> GatewayResult<Option<OrgMembershipState>> {
        self.org_membership_calls.fetch_add(1, Ordering::SeqCst);
        if self.failed_orgs.contains_key(org) {
            return Err(GatewayError::Http {
                status: 500,
                message: "membership query failed".to_string(),
            });
        }
        Ok(self
            .org_memberships
            .get(&(org.to_string(), username.to_string()))
            .map(|state| *state))
    }

    async fn org_teams(&self, org: &str) -> GatewayResult<Vec<TeamSummary>> {
        self.org_team_calls.fetch_add(1, Ordering::SeqCst);
        if self.failed_org_teams.contains_key(org) {
            return Err(GatewayError::Http {
                status: 502,
                message: "team enumeration failed".to_string(),
            });
        }
        Ok(self
            .org_teams
            .get(org)
            .map(|teams| teams.clone())
            .unwrap_or_default())
    }

    async fn team_by_id(&self, team_id: u64) -> GatewayResult<TeamDetails> {
        self.team_details
            .get(&team_id)
            .map(|details| details.clone())
            .ok_or(GatewayError::NotFound)
    }

    async fn team_members(
        &self,
        team_id: u64,
        role: TeamRole,
    ) -> GatewayResult<Vec<TeamMember>> {
        self.team_member_calls.fetch_add(1, Ordering::SeqCst);
        if self.failed_team_members.contains_key(&team_id) {
            return Err(GatewayError::Http {
                status: 500,
                message: "member list failed".to_string(),
            });
        }
        Ok(self
            .team_members
            .get(&(team_id, role))
            .map(|members| members.clone())
            .unwrap_or_default())
    }

    async fn is_team_member(&self, team_id: u64, user_id: &str) -> GatewayResult<bool> {
        if self.fail_team_membership.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "membership endpoint unreachable".to_string(),
            ));
        }
        Ok(self
            .team_memberships
            .get(&(team_id, user_id.to_string()))
            .map(|is_member| *is_member)
            .unwrap_or(false))
    }
}

// ============================================================================
// Store wrappers
// ============================================================================

/// Delegating store that records the size of every platform-ids query.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: MemoryLinkStore,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl CountingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> &MemoryLinkStore {
        &self.inner
    }

    pub(crate) fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().clone()
    }
}

#[async_trait]
impl LinkStore for CountingStore {
    async fn find_links_by_directory_id(
        &self,
        object_id: Uuid,
    ) -> StoreResult<Vec<IdentityLink>> {
        self.inner.find_links_by_directory_id(object_id).await
    }

    async fn find_links_by_platform_ids(&self, ids: &[String]) -> StoreResult<Vec<IdentityLink>> {
        self.chunk_sizes.lock().push(ids.len());
        self.inner.find_links_by_platform_ids(ids).await
    }
}

/// Store whose every query fails with an HTTP-style transport error.
pub(crate) struct FailingStore {
    status: u16,
}

impl FailingStore {
    pub(crate) fn http(status: u16) -> Self {
        Self { status }
    }

    fn error(&self) -> StoreError {
        StoreError::Http {
            status: self.status,
            body: "storage error".to_string(),
        }
    }
}

#[async_trait]
impl LinkStore for FailingStore {
    async fn find_links_by_directory_id(
        &self,
        _object_id: Uuid,
    ) -> StoreResult<Vec<IdentityLink>> {
        Err(self.error())
    }

    async fn find_links_by_platform_ids(
        &self,
        _ids: &[String],
    ) -> StoreResult<Vec<IdentityLink>> {
        Err(self.error())
    }
}

// ============================================================================
// Portal harness
// ============================================================================

/// A configured portal with a seeded memory store and a fake gateway,
/// ready to mint resolution contexts.
pub(crate) struct TestPortal {
    config: Arc<PortalConfig>,
    store: Arc<dyn LinkStore>,
    memory: Arc<MemoryLinkStore>,
    gateway: Arc<FakeGateway>,
}

impl TestPortal {
    fn with_scheme_and_orgs(scheme: AuthScheme, orgs: &[&str]) -> Self {
        let organizations = orgs
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let sudoers = (index == 0).then_some(SUDOERS_TEAM_ID);
                org_config(name, sudoers)
            })
            .collect();
        let config = PortalConfig {
            authentication: AuthenticationConfig { scheme },
            organizations,
        };
        let memory = Arc::new(MemoryLinkStore::new());
        Self {
            config: Arc::new(config),
            store: memory.clone(),
            memory,
            gateway: Arc::new(FakeGateway::new()),
        }
    }

    pub(crate) fn github() -> Self {
        Self::with_scheme_and_orgs(AuthScheme::Github, &["contoso"])
    }

    pub(crate) fn github_with_orgs(orgs: &[&str]) -> Self {
        Self::with_scheme_and_orgs(AuthScheme::Github, orgs)
    }

    pub(crate) fn aad() -> Self {
        Self::with_scheme_and_orgs(AuthScheme::Aad, &["contoso"])
    }

    /// Replace the link store (e.g. with a counting or failing store).
    pub(crate) fn with_store(mut self, store: Arc<dyn LinkStore>) -> Self {
        self.store = store;
        self
    }

    /// The default memory store; only meaningful while the store has not
    /// been replaced.
    pub(crate) fn store(&self) -> &MemoryLinkStore {
        &self.memory
    }

    pub(crate) fn gateway(&self) -> &FakeGateway {
        &self.gateway
    }

    pub(crate) async fn resolve(
        &self,
        options: ContextOptions,
    ) -> Result<ResolutionContext, crate::context::ContextError> {
        ResolutionContext::resolve(
            self.config.clone(),
            self.store.clone(),
            self.gateway.clone(),
            options,
        )
        .await
    }

    /// A context minted from a known link (no claims).
    pub(crate) async fn context_from_link(&self, link: IdentityLink) -> ResolutionContext {
        self.resolve(ContextOptions::from_link(link))
            .await
            .expect("context from link")
    }

    /// A context minted from platform-only claims.
    pub(crate) async fn context_from_platform_claims(
        &self,
        id: &str,
        username: &str,
    ) -> ResolutionContext {
        self.resolve(ContextOptions::from_claims(platform_claims(id, username)))
            .await
            .expect("context from platform claims")
    }

    /// A directory-only context with no stored link and hence no platform
    /// identity. Forces the directory scheme regardless of this portal's.
    pub(crate) async fn context_from_directory_claims_unlinked(&self) -> ResolutionContext {
        let mut config = (*self.config).clone();
        config.authentication.scheme = AuthScheme::Aad;
        let claims = RequestClaims {
            platform: None,
            directory: Some(DirectoryClaims {
                username: Some("ghost@contoso.com".to_string()),
                display_name: None,
                object_id: Some(Uuid::new_v4()),
            }),
        };
        ResolutionContext::resolve(
            Arc::new(config),
            self.store.clone(),
            self.gateway.clone(),
            ContextOptions::from_claims(claims),
        )
        .await
        .expect("unlinked directory context")
    }
}

/// Platform-only claims for the given identity.
pub(crate) fn platform_claims(id: &str, username: &str) -> RequestClaims {
    RequestClaims {
        platform: Some(PlatformClaims {
            id: id.to_string(),
            username: username.to_string(),
            display_name: None,
            avatar_url: None,
        }),
        directory: None,
    }
}

/// Dual-provider claims for the given identities.
pub(crate) fn dual_claims(
    platform_id: &str,
    platform_username: &str,
    object_id: Uuid,
    upn: &str,
) -> RequestClaims {
    RequestClaims {
        platform: Some(PlatformClaims {
            id: platform_id.to_string(),
            username: platform_username.to_string(),
            display_name: None,
            avatar_url: None,
        }),
        directory: Some(DirectoryClaims {
            username: Some(upn.to_string()),
            display_name: Some("Test User".to_string()),
            object_id: Some(object_id),
        }),
    }
}

/// Directory-only claims for the given identity.
pub(crate) fn directory_claims(object_id: Uuid, upn: &str) -> RequestClaims {
    RequestClaims {
        platform: None,
        directory: Some(DirectoryClaims {
            username: Some(upn.to_string()),
            display_name: Some("Test User".to_string()),
            object_id: Some(object_id),
        }),
    }
}
