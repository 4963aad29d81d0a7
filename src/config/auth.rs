use serde::{Deserialize, Serialize};

/// Authentication configuration for the portal.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationConfig {
    /// Primary authentication scheme. Controls which provider's identity
    /// drives link resolution for an inbound request.
    #[serde(default)]
    pub scheme: AuthScheme,
}

/// The identity provider users sign in with first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// The code-hosting platform is the primary provider.
    #[default]
    Github,

    /// The corporate directory (Azure Active Directory) is the primary
    /// provider; links are located by directory object-id.
    Aad,
}

impl AuthScheme {
    /// Whether the corporate directory drives primary sign-in.
    pub fn is_directory_primary(self) -> bool {
        matches!(self, AuthScheme::Aad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_defaults_to_github() {
        let config = AuthenticationConfig::default();
        assert_eq!(config.scheme, AuthScheme::Github);
        assert!(!config.scheme.is_directory_primary());
    }

    #[test]
    fn test_scheme_parses_lowercase() {
        let config: AuthenticationConfig = toml::from_str("scheme = \"aad\"").unwrap();
        assert_eq!(config.scheme, AuthScheme::Aad);
        assert!(config.scheme.is_directory_primary());
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let parsed: Result<AuthenticationConfig, _> = toml::from_str("scheme = \"saml\"");
        assert!(parsed.is_err());
    }
}
