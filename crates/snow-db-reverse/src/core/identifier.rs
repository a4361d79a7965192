//! Identifier quoting and validation for generated statements and paths.
//!
//! Snowflake identifiers cannot be bound as statement parameters, so `SHOW`
//! and `GET_DDL` text is assembled dynamically. Names coming back from the
//! metadata listing are validated and quoted here before they are spliced
//! into statements, and checked before they are used as file names.

use crate::error::{ReverseError, Result};

/// Maximum identifier length accepted by Snowflake.
const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding maximum length
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ReverseError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ReverseError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(ReverseError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a Snowflake identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_ident("T1")?, "\"T1\"");
/// assert_eq!(quote_ident("a\"b")?, "\"a\"\"b\"");
/// ```
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Fully qualified `"db"."schema"."object"` key.
pub fn qualify(database: &str, schema: &str, object: &str) -> Result<String> {
    Ok(format!(
        "{}.{}.{}",
        quote_ident(database)?,
        quote_ident(schema)?,
        quote_ident(object)?
    ))
}

/// Escape text for use inside a single-quoted SQL string literal.
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Whether a name can be used verbatim as one path segment.
pub fn is_safe_path_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
