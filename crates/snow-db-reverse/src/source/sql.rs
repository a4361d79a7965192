//! Statement text sent to Snowflake.

use crate::core::identifier::{escape_literal, quote_ident};
use crate::error::Result;

/// Cheap statement run at connect; it performs the login.
pub const SESSION_CHECK: &str = "SELECT CURRENT_VERSION()";

/// Re-reads the previous statement's result as a regular query, so it is
/// returned as Arrow chunks rather than a single inline JSON rowset.
pub const RESULT_SCAN_LAST: &str = "select * from table(result_scan(last_query_id()))";

/// `show <kind> in database "<db>"` or `show <kind> in schema "<db>"."<schema>"`.
pub fn show_statement(kind: &str, database: &str, schema: Option<&str>) -> Result<String> {
    Ok(match schema {
        None => format!("show {} in database {}", kind, quote_ident(database)?),
        Some(schema) => format!(
            "show {} in schema {}.{}",
            kind,
            quote_ident(database)?,
            quote_ident(schema)?
        ),
    })
}

/// `SELECT GET_DDL('<term>','<key>',true)`, requesting fully qualified names.
pub fn get_ddl_statement(type_term: &str, object_key: &str) -> String {
    format!(
        "SELECT GET_DDL('{}','{}',true)",
        escape_literal(type_term),
        escape_literal(object_key)
    )
}
