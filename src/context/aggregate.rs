//! Cross-organization membership aggregation.
//!
//! These operations walk every configured organization and team, so they
//! lean on the per-context caches (org team enumeration, per-role team
//! member lists) to keep the platform API call count bounded.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use futures::future::{join_all, try_join_all};

use super::{ContextError, ContextResult, OrgHandle, ResolutionContext, TeamHandle, UserHandle};
use crate::gateway::{OrgMembershipState, TeamMember, TeamRole};

/// One cross-org maintainer: the user handle plus the ids of every team the
/// user maintains.
#[derive(Clone)]
pub struct Maintainer {
    pub user: Arc<UserHandle>,
    pub team_ids: BTreeSet<u64>,
}

impl ResolutionContext {
    /// Membership snapshot across every configured organization.
    ///
    /// Each org's state is queried concurrently and recorded on its handle,
    /// defaulting to not-a-member. Per-org failures never abort the
    /// snapshot: the call always succeeds with all org handles, and the
    /// error is dropped non-fatally.
    ///
    /// `allow_caching = false` bypasses gateway-side caching, e.g. during
    /// onboarding.
    pub async fn my_organizations(&self, allow_caching: bool) -> Vec<Arc<OrgHandle>> {
        let username = self.platform().username.clone();
        let orgs = self.orgs();
        join_all(orgs.iter().map(|org| {
            let org = org.clone();
            let username = username.clone();
            async move {
                let result = org
                    .query_user_membership(self.gateway(), username.as_deref(), allow_caching)
                    .await;
                if let Err(error) = result {
                    org.record_membership(OrgMembershipState::NotMember);
                    tracing::debug!(
                        org = org.name(),
                        %error,
                        "org membership query failed; treating as non-member"
                    );
                }
            }
        }))
        .await;
        orgs
    }

    /// Every team across all configured organizations, including secret
    /// teams. Not specific to the caller. Any single organization's failure
    /// aborts the aggregate.
    pub async fn all_organization_teams(&self) -> ContextResult<Vec<Arc<TeamHandle>>> {
        let orgs = self.orgs();
        let fetches = orgs.iter().map(|org| {
            let org = org.clone();
            async move { org.teams(self.gateway()).await }
        });
        let nested = try_join_all(fetches).await?;
        Ok(nested.into_iter().flatten().collect())
    }

    /// Teams in which the target user holds `role`, across all
    /// organizations.
    ///
    /// The target defaults to the caller's own platform id. Heavy use of the
    /// per-team member cache: a cache miss costs one API call per team.
    pub async fn my_team_memberships(
        &self,
        role: TeamRole,
        alternate_user_id: Option<&str>,
    ) -> ContextResult<Vec<Arc<TeamHandle>>> {
        let target = alternate_user_id
            .map(str::to_string)
            .or_else(|| self.platform().id.clone())
            .ok_or(ContextError::MissingIdentifier)?;

        let teams = self.all_organization_teams().await?;
        let checks = teams.iter().map(|team| {
            let team = team.clone();
            let target = target.clone();
            async move {
                let members = team.members_cached(self.gateway(), role).await?;
                Ok::<bool, ContextError>(members.iter().any(|member| member.id == target))
            }
        });
        let included = try_join_all(checks).await?;

        Ok(teams
            .into_iter()
            .zip(included)
            .filter_map(|(team, included)| included.then_some(team))
            .collect())
    }

    /// The full set of team maintainers across all orgs, deduplicated by
    /// user id, each carrying the ids of every team they maintain, with
    /// system links resolved.
    ///
    /// Designed for tooling that needs to reach the people running daily
    /// engineering work through the portal.
    pub async fn all_maintainers(&self) -> ContextResult<Vec<Maintainer>> {
        let teams = self.all_organization_teams().await?;
        let fetches = teams.iter().map(|team| {
            let team = team.clone();
            async move {
                let members = team
                    .members_cached(self.gateway(), TeamRole::Maintainer)
                    .await?;
                Ok::<(u64, Arc<Vec<TeamMember>>), ContextError>((team.id(), members))
            }
        });
        let per_team = try_join_all(fetches).await?;

        // Team associations accumulate in an explicit map, keyed by user id,
        // outside the handles themselves.
        let mut maintainers: HashMap<String, Maintainer> = HashMap::new();
        for (team_id, members) in per_team {
            for member in members.iter() {
                let entry = maintainers
                    .entry(member.id.clone())
                    .or_insert_with(|| Maintainer {
                        user: self.user_with_login(&member.id, &member.login),
                        team_ids: BTreeSet::new(),
                    });
                entry.team_ids.insert(team_id);
            }
        }

        let users: Vec<Arc<UserHandle>> =
            maintainers.values().map(|entry| entry.user.clone()).collect();
        self.load_links_for_users(&users).await?;

        Ok(maintainers.into_values().collect())
    }
}
