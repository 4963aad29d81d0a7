use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity claims carried by an inbound authenticated request.
///
/// A request may carry either provider's claims, both, or neither; link
/// resolution reconciles whatever is present against the stored link. The
/// wire shape matches what the OAuth strategies hand over:
/// `{"github": {...}, "azure": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RequestClaims {
    /// Claims from the platform OAuth sign-in, if present.
    #[serde(default, rename = "github")]
    pub platform: Option<PlatformClaims>,

    /// Claims from the corporate directory sign-in, if present.
    #[serde(default, rename = "azure")]
    pub directory: Option<DirectoryClaims>,
}

/// Platform-provider claims (GitHub OAuth profile subset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformClaims {
    /// Platform numeric user id, stringified.
    pub id: String,

    /// Platform login.
    pub username: String,

    /// Display name from the platform profile.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Avatar URL from the platform profile.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Directory-provider claims (AAD OIDC profile subset).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryClaims {
    /// Directory username (user principal name).
    #[serde(default)]
    pub username: Option<String>,

    /// Directory display name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Directory object-id. AAD object ids are GUIDs; validated here at the
    /// boundary rather than carried as an opaque string.
    #[serde(default, rename = "oid")]
    pub object_id: Option<Uuid>,
}
