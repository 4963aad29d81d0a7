use crate::{
    gateway::GatewayError,
    models::{IdentityLink, PlatformClaims},
    store::StoreError,
};

/// Where a user with a mismatched platform session is sent to sign out of
/// the platform before re-linking.
pub(crate) const PLATFORM_SIGNOUT_LINK: &str = "/signout/github/?redirect=github";

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// A remediation action attached to a user-facing error: a link the
/// presentation layer renders so the user can resolve the condition
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Remediation {
    pub link: String,
    pub title: String,
}

/// Errors produced by link resolution and the operations built on it.
///
/// Fatal resolution errors prevent any further personalized operation for
/// the request; the caller renders an error view or the attached
/// remediation action rather than partial data.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Resolution invoked with mutually exclusive inputs.
    #[error("the context cannot be set from both a request and a link instance")]
    InvalidInput,

    /// Resolution invoked with no usable claim source.
    #[error("could not initialize the context for the acting user")]
    NotInitialized,

    /// More than one link is recorded for a single directory identity.
    /// Surfaced to an administrative remediation flow with the full match
    /// set attached.
    #[error("this account has {} linked GitHub accounts", .links.len())]
    TooManyLinks { links: Vec<IdentityLink> },

    /// The platform identity on the request does not match the platform
    /// identity on the stored link.
    #[error("{end_user}, there is a different GitHub account linked to your corporate identity")]
    ConflictingIdentity {
        /// Display name (or username) of the signed-in directory user.
        end_user: String,

        /// The platform username the request authenticated with.
        authenticated_username: String,

        /// Half-masked hint of the linked platform username; only its tail
        /// is visible.
        linked_username_hint: String,

        /// Sign-out-and-relink action for the presentation layer.
        remediation: Remediation,
    },

    /// Resolution fell through every claim path. Always fatal, always
    /// logged.
    #[error("logic bug in the user context; resolution cannot continue")]
    Logic,

    /// A batch item carries no platform user id.
    #[error("no id known for this user instance")]
    MissingIdentifier,

    /// The store returned a transport-level failure during a batch query.
    #[error("storage returned an HTTP {status}")]
    Storage {
        status: u16,
        #[source]
        source: StoreError,
    },

    /// The sudoers-membership query failed. Never conflated with a negative
    /// ("not an admin") result.
    #[error(
        "we had trouble querying GitHub for important team management information; \
         please try again later or report this issue"
    )]
    AdminCheckFailed {
        #[source]
        source: GatewayError,
    },

    /// The requested organization is not configured for use.
    #[error("the requested organization \"{0}\" is not configured for use at this time")]
    OrganizationNotConfigured(String),

    /// The primary organization has no sudoers team configured.
    #[error("no sudoers team is configured for the \"{org}\" organization")]
    MissingSudoersTeam { org: String },

    /// Direct-by-id team hydration failed.
    #[error("there was a problem retrieving the details for team {id}; the team may no longer exist")]
    TeamUnavailable {
        id: u64,
        #[source]
        source: GatewayError,
    },

    /// A single (non-batch) store query failed.
    #[error("there was a problem trying to load the link for the active user")]
    Store(#[from] StoreError),

    /// A single (non-aggregate) gateway query failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ContextError {
    /// Whether this is the duplicate-link condition.
    pub fn is_too_many_links(&self) -> bool {
        matches!(self, ContextError::TooManyLinks { .. })
    }

    /// Whether this is the another-account condition (the request's platform
    /// identity differs from the linked one).
    pub fn is_another_account(&self) -> bool {
        matches!(self, ContextError::ConflictingIdentity { .. })
    }

    /// Expected, user-driven conditions that should not be logged as
    /// operational failures.
    pub fn skip_log(&self) -> bool {
        self.is_another_account()
    }

    /// The remediation action to render, when one exists.
    pub fn remediation(&self) -> Option<&Remediation> {
        match self {
            ContextError::ConflictingIdentity { remediation, .. } => Some(remediation),
            _ => None,
        }
    }

    /// Build the conflicting-identity error from the stored link and the
    /// request's platform claims.
    pub(crate) fn conflicting_identity(
        link: &IdentityLink,
        claims: &PlatformClaims,
        end_user: String,
    ) -> Self {
        let visible = link.platform_username.chars().count() / 2;
        ContextError::ConflictingIdentity {
            end_user,
            authenticated_username: claims.username.clone(),
            linked_username_hint: obfuscate(&link.platform_username, visible),
            remediation: Remediation {
                link: PLATFORM_SIGNOUT_LINK.to_string(),
                title: format!("Sign Out {} on GitHub", claims.username),
            },
        }
    }
}

/// Mask all but the trailing `visible` characters of a value.
fn obfuscate(value: &str, visible: usize) -> String {
    let total = value.chars().count();
    let visible = visible.min(total);
    let masked = total - visible;
    let mut result = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        if i < masked {
            result.push('*');
        } else {
            result.push(c);
        }
    }
    result
}
