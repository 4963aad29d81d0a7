//! External platform gateway boundary.
//!
//! All calls against the code-hosting platform API go through
//! [`PlatformGateway`]. The HTTP client, its authentication, caching, and
//! retry/timeout policy live behind this trait; the core only states what
//! it needs. Every method is a suspension point and is subject to external
//! rate limiting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced by the platform gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The platform API answered with a failure status.
    #[error("platform API returned an HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The requested entity does not exist (or is not visible).
    #[error("platform entity not found")]
    NotFound,

    /// The platform API could not be reached at all.
    #[error("platform API unavailable: {0}")]
    Unavailable(String),
}

/// Public profile of a platform user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Platform numeric user id, stringified.
    pub id: String,

    /// Platform login.
    pub login: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// One team as enumerated from an organization's team list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamSummary {
    pub id: u64,
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Full team details as fetched directly by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamDetails {
    pub id: u64,
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Login of the owning organization, when the API reports one.
    #[serde(default)]
    pub organization: Option<String>,
}

/// One member of a team, as returned by the member-list query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMember {
    /// Platform numeric user id, stringified.
    pub id: String,

    /// Platform login.
    pub login: String,

    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Role filter for team member queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Member,
    Maintainer,
}

impl TeamRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamRole::Member => "member",
            TeamRole::Maintainer => "maintainer",
        }
    }
}

/// A user's membership state within an organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrgMembershipState {
    /// Confirmed member.
    Active,

    /// Invited but not yet accepted.
    Pending,

    /// No membership on record.
    #[default]
    NotMember,
}

impl OrgMembershipState {
    pub fn is_member(self) -> bool {
        matches!(self, OrgMembershipState::Active)
    }
}

/// Authenticated queries against the code-hosting platform.
///
/// Implementations may cache; queries that must observe fresh state (e.g.
/// during onboarding) pass `allow_cached = false`.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Live profile details for a user, by login.
    async fn user_by_username(&self, username: &str) -> GatewayResult<UserProfile>;

    /// Membership state of `username` in `org`, or `None` when the user has
    /// no membership on record.
    async fn org_membership(
        &self,
        org: &str,
        username: &str,
        allow_cached: bool,
    ) -> GatewayResult<Option<OrgMembershipState>>;

    /// All teams of an organization, including secret teams.
    async fn org_teams(&self, org: &str) -> GatewayResult<Vec<TeamSummary>>;

    /// Team details by id.
    async fn team_by_id(&self, team_id: u64) -> GatewayResult<TeamDetails>;

    /// Member list of a team, filtered by role.
    async fn team_members(&self, team_id: u64, role: TeamRole)
    -> GatewayResult<Vec<TeamMember>>;

    /// Whether the platform user id is a member of the team.
    async fn is_team_member(&self, team_id: u64, user_id: &str) -> GatewayResult<bool>;
}
