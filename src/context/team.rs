use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use parking_lot::RwLock;

use super::org::OrgHandle;
use crate::gateway::{GatewayResult, PlatformGateway, TeamMember, TeamRole, TeamSummary};

/// Context-scoped proxy for a platform team.
///
/// Teams enumerated through an organization carry a back-reference to their
/// org handle; teams constructed directly by id are bare (no org
/// back-reference) and are not memoized by the context.
pub struct TeamHandle {
    id: u64,
    org: Option<Weak<OrgHandle>>,
    state: RwLock<TeamState>,
}

#[derive(Default)]
struct TeamState {
    name: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    members: HashMap<TeamRole, Arc<Vec<TeamMember>>>,
}

impl TeamHandle {
    pub(crate) fn from_summary(summary: TeamSummary, org: Weak<OrgHandle>) -> Self {
        Self {
            id: summary.id,
            org: Some(org),
            state: RwLock::new(TeamState {
                name: Some(summary.name),
                slug: summary.slug,
                description: summary.description,
                members: HashMap::new(),
            }),
        }
    }

    /// A team reference from just an id, with no owning organization.
    pub(crate) fn bare(id: u64) -> Self {
        Self {
            id,
            org: None,
            state: RwLock::new(TeamState::default()),
        }
    }

    /// Team id. Immutable after construction.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The owning organization, absent for bare teams (and for teams that
    /// outlive their context's org cache).
    pub fn org(&self) -> Option<Arc<OrgHandle>> {
        self.org.as_ref().and_then(Weak::upgrade)
    }

    pub fn name(&self) -> Option<String> {
        self.state.read().name.clone()
    }

    pub fn slug(&self) -> Option<String> {
        self.state.read().slug.clone()
    }

    pub fn description(&self) -> Option<String> {
        self.state.read().description.clone()
    }

    /// Hydrate name/slug/description from the gateway.
    pub(crate) async fn load_details(&self, gateway: &dyn PlatformGateway) -> GatewayResult<()> {
        let details = gateway.team_by_id(self.id).await?;
        let mut state = self.state.write();
        state.name = Some(details.name);
        state.slug = details.slug;
        state.description = details.description;
        Ok(())
    }

    /// Member list for a role, fetched once per context per role.
    ///
    /// This is the cache that keeps cross-team aggregation affordable: N
    /// teams cost at most N member queries per role per context.
    pub(crate) async fn members_cached(
        &self,
        gateway: &dyn PlatformGateway,
        role: TeamRole,
    ) -> GatewayResult<Arc<Vec<TeamMember>>> {
        if let Some(members) = self.state.read().members.get(&role) {
            return Ok(members.clone());
        }
        let members = Arc::new(gateway.team_members(self.id, role).await?);
        self.state.write().members.insert(role, members.clone());
        Ok(members)
    }
}
