//! Configuration validation.

use super::Config;
use crate::core::catalog::SYSTEM_SCHEMA;
use crate::core::identifier::{is_safe_path_segment, validate_identifier};
use crate::error::{ReverseError, Result};
use tracing::warn;

/// Validate the configuration.
///
/// The password is not checked: it may still be prompted for.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.account.is_empty() {
        return Err(ReverseError::Config("source.account is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(ReverseError::Config("source.user is required".into()));
    }
    if config.source.role.is_empty() {
        return Err(ReverseError::Config("source.role is required".into()));
    }

    // Extraction validation
    let extraction = &config.extraction;
    if extraction.database.is_empty() {
        return Err(ReverseError::Config(
            "extraction.database is required".into(),
        ));
    }
    validate_identifier(&extraction.database)?;
    if !is_safe_path_segment(&extraction.database) {
        return Err(ReverseError::Config(format!(
            "extraction.database {:?} cannot be used as a file name",
            extraction.database
        )));
    }
    if extraction.folder.as_os_str().is_empty() {
        return Err(ReverseError::Config("extraction.folder is required".into()));
    }
    for schema in &extraction.schemas {
        validate_identifier(schema)?;
        if schema.eq_ignore_ascii_case(SYSTEM_SCHEMA) {
            warn!("{} is never extracted; ignoring it in extraction.schemas", SYSTEM_SCHEMA);
        }
    }
    if extraction.env_pattern.is_none() && !extraction.env_replace_token.is_empty() {
        warn!("extraction.env_replace_token is set without env_pattern and has no effect");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractionConfig, SourceConfig};
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                account: "xy12345.eu-west-1".to_string(),
                user: "deployer".to_string(),
                password: Some("password".to_string()),
                role: "SYSADMIN".to_string(),
                warehouse: None,
            },
            extraction: ExtractionConfig {
                database: "ANALYTICS_DEV".to_string(),
                schemas: vec![],
                folder: PathBuf::from("./ddl"),
                env_pattern: Some("_DEV".to_string()),
                env_replace_token: "_&{ENV}".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_password_is_allowed() {
        let mut config = valid_config();
        config.source.password = None;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_account() {
        let mut config = valid_config();
        config.source.account = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_database() {
        let mut config = valid_config();
        config.extraction.database = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_database_with_separator_rejected() {
        let mut config = valid_config();
        config.extraction.database = "a/b".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_folder() {
        let mut config = valid_config();
        config.extraction.folder = PathBuf::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let mut config = valid_config();
        config.source.password = Some("super_secret_password_123".to_string());
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
source:
  account: xy12345
  user: deployer
  role: SYSADMIN
extraction:
  database: ANALYTICS
  schemas: [SALES, finance]
  folder: ./out
  env_pattern: _PRD
  env_replace_token: "_&{ENV}"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.password, None);
        assert_eq!(config.extraction.schemas, vec!["SALES", "finance"]);
        assert_eq!(config.extraction.env_substitution().apply("T_PRD"), "T_&{ENV}");
    }

    #[test]
    fn test_parse_schema_list() {
        assert_eq!(
            ExtractionConfig::parse_schema_list("SALES, finance,,"),
            vec!["SALES", "finance"]
        );
        assert!(ExtractionConfig::parse_schema_list("").is_empty());
    }
}
