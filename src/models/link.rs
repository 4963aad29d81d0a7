use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One confirmed association between a corporate directory identity and a
/// platform identity.
///
/// At most one record exists per directory object-id and at most one per
/// platform user id; violations of either invariant surface as a
/// too-many-links condition during resolution. A record is immutable once
/// read within a context; mutation happens only through the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityLink {
    /// Directory object-id (AAD oid) of the linked corporate identity.
    pub directory_object_id: Uuid,

    /// Directory username (user principal name).
    pub directory_username: String,

    /// Directory display name, if the directory provided one.
    #[serde(default)]
    pub directory_display_name: Option<String>,

    /// Platform numeric user id, stringified.
    pub platform_user_id: String,

    /// Platform login of the linked account.
    pub platform_username: String,

    /// Avatar URL captured when the account was linked.
    #[serde(default)]
    pub platform_avatar_url: Option<String>,

    /// Standard-scope OAuth access token for the platform account.
    #[serde(default)]
    pub platform_access_token: Option<String>,

    /// Elevated-scope token granted for org membership writes.
    #[serde(default)]
    pub platform_elevated_token: Option<String>,
}
