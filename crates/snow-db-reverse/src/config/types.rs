//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::schema::Scope;
use crate::rewrite::EnvSubstitution;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Snowflake connection settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// What to extract and where to write it.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Snowflake connection configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Account identifier, e.g. `xy12345.eu-west-1`.
    #[serde(default)]
    pub account: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password. Prompted interactively by the CLI when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Role used for the session.
    #[serde(default)]
    pub role: String,

    /// Optional warehouse for the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .finish()
    }
}

/// Extraction behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Database to reverse-engineer.
    #[serde(default)]
    pub database: String,

    /// Schemas to include (case-insensitive). Empty means all schemas.
    #[serde(default)]
    pub schemas: Vec<String>,

    /// Output folder; emptied and recreated on every run.
    #[serde(default)]
    pub folder: PathBuf,

    /// Literal environment marker to replace in every script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_pattern: Option<String>,

    /// Replacement token for `env_pattern`.
    #[serde(default)]
    pub env_replace_token: String,
}

impl ExtractionConfig {
    /// Split a comma-separated schema list, trimming blanks.
    pub fn parse_schema_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.database.clone())
    }

    pub fn env_substitution(&self) -> EnvSubstitution {
        EnvSubstitution::new(self.env_pattern.clone(), self.env_replace_token.clone())
    }
}
