//! Configuration for the portal identity core.
//!
//! The portal is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [authentication]
//! scheme = "aad"
//!
//! [[organizations]]
//! name = "contoso"
//! sudoers_team_id = 310
//!
//! [[organizations]]
//! name = "contoso-labs"
//! ```

mod auth;
mod organizations;

use std::path::Path;

pub use auth::*;
pub use organizations::*;
use serde::{Deserialize, Serialize};

/// Root configuration for the portal identity core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// Primary authentication scheme configuration.
    #[serde(default)]
    pub authentication: AuthenticationConfig,

    /// Ordered list of organizations registered for management.
    /// The first entry is the primary organization.
    #[serde(default)]
    pub organizations: Vec<OrganizationConfig>,
}

impl PortalConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let config: PortalConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.organizations.is_empty() {
            return Err(ConfigError::Validation(
                "at least one organization must be configured".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for org in &self.organizations {
            if org.name.is_empty() {
                return Err(ConfigError::Validation(
                    "no organization name has been provided for one of the configured organizations"
                        .into(),
                ));
            }
            if !seen.insert(org.key()) {
                return Err(ConfigError::Validation(format!(
                    "organization \"{}\" is configured more than once",
                    org.name
                )));
            }
        }

        Ok(())
    }

    /// The primary organization (the first configured entry).
    pub fn primary_organization(&self) -> Option<&OrganizationConfig> {
        self.organizations.first()
    }

    /// Look up an organization by name, case-insensitively.
    pub fn organization(&self, name: &str) -> Option<&OrganizationConfig> {
        let name = name.to_lowercase();
        self.organizations.iter().find(|org| org.key() == name)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR_NAME}` references with environment variable values.
/// Variables appearing after a `#` comment marker are left untouched.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let whole = cap.get(0).expect("capture 0 always present");

            if let Some(pos) = comment_pos {
                if whole.start() >= pos {
                    continue;
                }
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
