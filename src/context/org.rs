use std::sync::Arc;

use parking_lot::RwLock;

use super::team::TeamHandle;
use crate::{
    config::OrganizationConfig,
    gateway::{GatewayResult, OrgMembershipState, PlatformGateway},
};

/// Context-scoped proxy for a configured organization.
///
/// Memoized by lowercase name in the resolution context: the same name
/// yields the same instance for the life of the context.
pub struct OrgHandle {
    name: String,
    settings: OrganizationConfig,
    state: RwLock<OrgState>,
}

#[derive(Default)]
struct OrgState {
    membership: Option<OrgMembershipState>,
    teams: Option<Vec<Arc<TeamHandle>>>,
}

impl OrgHandle {
    pub(crate) fn new(settings: OrganizationConfig) -> Self {
        Self {
            name: settings.key(),
            settings,
            state: RwLock::new(OrgState::default()),
        }
    }

    /// Lowercased organization name. Immutable after construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration entry this handle was built from.
    pub fn settings(&self) -> &OrganizationConfig {
        &self.settings
    }

    /// The caller's membership state, once a snapshot has recorded it.
    pub fn membership(&self) -> Option<OrgMembershipState> {
        self.state.read().membership
    }

    pub(crate) fn record_membership(&self, state: OrgMembershipState) {
        self.state.write().membership = Some(state);
    }

    /// Query the caller's membership state and record it on the handle.
    /// A missing result defaults to not-a-member.
    pub(crate) async fn query_user_membership(
        &self,
        gateway: &dyn PlatformGateway,
        username: Option<&str>,
        allow_cached: bool,
    ) -> GatewayResult<OrgMembershipState> {
        let Some(username) = username else {
            self.record_membership(OrgMembershipState::NotMember);
            return Ok(OrgMembershipState::NotMember);
        };
        let state = gateway
            .org_membership(&self.name, username, allow_cached)
            .await?
            .unwrap_or_default();
        self.record_membership(state);
        Ok(state)
    }

    /// Teams of this org, enumerated once per context. Includes secret
    /// teams; not specific to the caller.
    pub(crate) async fn teams(
        self: &Arc<Self>,
        gateway: &dyn PlatformGateway,
    ) -> GatewayResult<Vec<Arc<TeamHandle>>> {
        if let Some(teams) = self.state.read().teams.clone() {
            return Ok(teams);
        }
        let summaries = gateway.org_teams(&self.name).await?;
        let teams: Vec<Arc<TeamHandle>> = summaries
            .into_iter()
            .map(|summary| Arc::new(TeamHandle::from_summary(summary, Arc::downgrade(self))))
            .collect();
        // A concurrent enumeration may have landed first; overwriting with
        // an equivalent list is benign.
        self.state.write().teams = Some(teams.clone());
        Ok(teams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{FakeGateway, org_config, team_summary};

    #[tokio::test]
    async fn test_membership_defaults_to_not_member() {
        let gateway = FakeGateway::new();
        let org = OrgHandle::new(org_config("Contoso", None));

        let state = org
            .query_user_membership(&gateway, Some("ghost"), true)
            .await
            .unwrap();
        assert_eq!(state, OrgMembershipState::NotMember);
        assert_eq!(org.membership(), Some(OrgMembershipState::NotMember));
    }

    #[tokio::test]
    async fn test_membership_recorded_on_handle() {
        let gateway = FakeGateway::new();
        gateway.set_org_membership("contoso", "alice", OrgMembershipState::Active);
        let org = OrgHandle::new(org_config("Contoso", None));

        let state = org
            .query_user_membership(&gateway, Some("alice"), true)
            .await
            .unwrap();
        assert!(state.is_member());
        assert_eq!(org.membership(), Some(OrgMembershipState::Active));
    }

    #[tokio::test]
    async fn test_missing_username_skips_the_gateway() {
        let gateway = FakeGateway::new();
        let org = OrgHandle::new(org_config("Contoso", None));

        let state = org.query_user_membership(&gateway, None, true).await.unwrap();
        assert_eq!(state, OrgMembershipState::NotMember);
        assert_eq!(gateway.org_membership_calls(), 0);
    }

    #[tokio::test]
    async fn test_teams_enumerated_once() {
        let gateway = FakeGateway::new();
        gateway.add_org_teams("contoso", vec![team_summary(1, "eng"), team_summary(2, "ops")]);
        let org = Arc::new(OrgHandle::new(org_config("Contoso", None)));

        let teams = org.teams(&gateway).await.unwrap();
        let again = org.teams(&gateway).await.unwrap();
        assert_eq!(teams.len(), 2);
        assert!(Arc::ptr_eq(&teams[0], &again[0]));
        assert_eq!(gateway.org_team_calls(), 1);

        // Enumerated teams point back at their org.
        assert_eq!(teams[0].org().unwrap().name(), "contoso");
    }
}
