//! Error types for the extraction library.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration errors (missing fields, invalid YAML).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when the Snowflake session cannot be established.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code when the initial schema list cannot be resolved.
pub const EXIT_LISTING_ERROR: u8 = 3;
/// Exit code for file system errors (output root, config file).
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for extraction operations.
#[derive(Error, Debug)]
pub enum ReverseError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snowflake session or statement error
    #[error("Snowflake error: {0}")]
    Snowflake(#[from] snowflake_api::SnowflakeApiError),

    /// Statement succeeded but the result set has an unexpected shape
    #[error("Unexpected result for statement `{statement}`: {message}")]
    ResultShape { statement: String, message: String },

    /// A SHOW listing failed
    #[error("Listing {kind} in {scope} failed: {message}")]
    Listing {
        kind: String,
        scope: String,
        message: String,
    },

    /// GET_DDL failed for a single object
    #[error("Definition lookup failed for {object}: {message}")]
    Definition { object: String, message: String },

    /// Declaration text of a procedure/function has no RETURN clause
    #[error(
        "Cannot extract argument signature for {object}: declaration `{declaration}` has no RETURN clause"
    )]
    MissingReturnClause { object: String, declaration: String },

    /// A listing row lacks a column the resolver needs
    #[error("Listing row for {kind} has no `{column}` column")]
    MissingColumn { kind: String, column: String },

    /// Object name cannot be used as a file name
    #[error("Object name {0:?} is not a safe file name")]
    UnsafeObjectName(String),

    /// Descriptor table conflict (duplicate order/name, unsafe name)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Output root could not be emptied or recreated
    #[error("Cannot recreate output folder {path:?}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReverseError {
    /// Create a Listing error
    pub fn listing(
        kind: impl Into<String>,
        scope: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        ReverseError::Listing {
            kind: kind.into(),
            scope: scope.into(),
            message: message.to_string(),
        }
    }

    /// Create a Definition error
    pub fn definition(object: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ReverseError::Definition {
            object: object.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReverseError::Config(_)
            | ReverseError::Yaml(_)
            | ReverseError::Json(_)
            | ReverseError::Catalog(_) => EXIT_CONFIG_ERROR,
            ReverseError::Snowflake(_) | ReverseError::ResultShape { .. } => {
                EXIT_CONNECTION_ERROR
            }
            ReverseError::Listing { .. } => EXIT_LISTING_ERROR,
            ReverseError::OutputRoot { .. } | ReverseError::Io(_) => EXIT_IO_ERROR,
            ReverseError::Definition { .. }
            | ReverseError::MissingReturnClause { .. }
            | ReverseError::MissingColumn { .. }
            | ReverseError::UnsafeObjectName(_) => EXIT_CONFIG_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ReverseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(ReverseError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            ReverseError::listing("schemas", "database \"DB\"", "denied").exit_code(),
            EXIT_LISTING_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(ReverseError::Io(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = ReverseError::OutputRoot {
            path: PathBuf::from("/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Cannot recreate output folder"));
        assert!(detailed.contains("Caused by:\n  1: read-only"));
    }

    #[test]
    fn test_missing_return_message_names_object() {
        let err = ReverseError::MissingReturnClause {
            object: "\"DB\".\"PUBLIC\".\"P1\"".into(),
            declaration: "P1(NUMBER)".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("P1(NUMBER)"));
        assert!(msg.contains("no RETURN clause"));
    }
}
