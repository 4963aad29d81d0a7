use serde::{Deserialize, Serialize};

/// One organization registered for management with this portal instance.
///
/// The first configured organization is the primary organization: it hosts
/// the sudoers team and is the default for the org accessor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OrganizationConfig {
    /// Organization name on the platform. Compared case-insensitively.
    pub name: String,

    /// Short human-readable description shown in administrative views.
    #[serde(default)]
    pub description: Option<String>,

    /// Team id whose membership confers portal administrator privilege.
    /// Only meaningful on the primary organization.
    #[serde(default)]
    pub sudoers_team_id: Option<u64>,
}

impl OrganizationConfig {
    /// Lowercased name, the canonical cache key for org handles.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}
