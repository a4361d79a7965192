//! Scope, schema and listing-row types.

use serde::{Deserialize, Serialize};

use crate::error::{ReverseError, Result};

use super::identifier::quote_ident;

/// Column holding the object name in every `SHOW` result.
pub const NAME_COLUMN: &str = "name";
/// Column holding the schema comment in `SHOW SCHEMAS`.
pub const COMMENT_COLUMN: &str = "comment";
/// Column holding the data retention (days) in `SHOW SCHEMAS`.
pub const RETENTION_COLUMN: &str = "retention_time";
/// Column marking Snowflake-provided procedures/functions.
pub const BUILTIN_COLUMN: &str = "is_builtin";
/// Column holding the declaration text of procedures/functions.
pub const ARGUMENTS_COLUMN: &str = "arguments";

/// The database being extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    database: String,
}

impl Scope {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    /// Database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Quoted database identifier, e.g. `"ANALYTICS"`.
    pub fn qualified(&self) -> Result<String> {
        quote_ident(&self.database)
    }

    /// `CREATE DATABASE IF NOT EXISTS` script for this scope.
    pub fn create_statement(&self) -> Result<String> {
        Ok(format!("CREATE DATABASE IF NOT EXISTS {};", self.qualified()?))
    }
}

/// One row of a `SHOW ...` result, addressable by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRow {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

impl ListingRow {
    /// Build a row from parallel column/value vectors.
    ///
    /// Column names are matched case-insensitively.
    pub fn new(columns: Vec<String>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .unzip();
        Self { columns, values }
    }

    /// Value of a column, `None` when the column is absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|idx| self.values.get(idx))
            .and_then(|v| v.as_deref())
    }

    /// Value at a column position, for single-column scalar results.
    pub fn value_at(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    /// Value of a column that must be present.
    pub fn require(&self, column: &str, kind: &str) -> Result<&str> {
        self.get(column).ok_or_else(|| ReverseError::MissingColumn {
            kind: kind.to_string(),
            column: column.to_string(),
        })
    }

    /// Object name (`name` column).
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_COLUMN)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Schema metadata taken from `SHOW SCHEMAS IN DATABASE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name.
    pub name: String,

    /// Schema comment (empty when unset).
    pub comment: String,

    /// `DATA_RETENTION_TIME_IN_DAYS`, kept verbatim from the listing.
    /// `None` when the listing has no value; the clause is then omitted.
    pub retention_days: Option<String>,
}

impl Schema {
    /// Build a schema from its listing row.
    pub fn from_row(row: &ListingRow) -> Result<Self> {
        Ok(Self {
            name: row.require(NAME_COLUMN, "schemas")?.to_string(),
            comment: row.get(COMMENT_COLUMN).unwrap_or_default().to_string(),
            retention_days: row.get(RETENTION_COLUMN).map(str::to_string),
        })
    }

    /// `CREATE SCHEMA IF NOT EXISTS` script for this schema.
    pub fn create_statement(&self, scope: &Scope) -> Result<String> {
        let retention = self
            .retention_days
            .as_deref()
            .map(|days| format!(" DATA_RETENTION_TIME_IN_DAYS={}", days))
            .unwrap_or_default();
        Ok(format!(
            "CREATE SCHEMA IF NOT EXISTS {}.{}{} COMMENT='{}';",
            scope.qualified()?,
            quote_ident(&self.name)?,
            retention,
            self.comment.replace('\'', "''")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_is_case_insensitive() {
        let row = ListingRow::from_pairs([("NAME", "T1"), ("kind", "TABLE")]);
        assert_eq!(row.name(), Some("T1"));
        assert_eq!(row.get("KIND"), Some("TABLE"));
        assert_eq!(row.get("comment"), None);
    }

    #[test]
    fn test_null_value_reads_as_none() {
        let row = ListingRow::new(
            vec!["name".into(), "comment".into()],
            vec![Some("S".into()), None],
        );
        assert_eq!(row.get("comment"), None);
        assert!(row.require("comment", "schemas").is_err());
    }

    #[test]
    fn test_database_statement() {
        let scope = Scope::new("ANALYTICS");
        assert_eq!(
            scope.create_statement().unwrap(),
            "CREATE DATABASE IF NOT EXISTS \"ANALYTICS\";"
        );
    }

    #[test]
    fn test_schema_statement() {
        let row = ListingRow::from_pairs([
            ("name", "SALES"),
            ("comment", "sales data"),
            ("retention_time", "7"),
        ]);
        let schema = Schema::from_row(&row).unwrap();
        assert_eq!(
            schema.create_statement(&Scope::new("DB")).unwrap(),
            "CREATE SCHEMA IF NOT EXISTS \"DB\".\"SALES\" DATA_RETENTION_TIME_IN_DAYS=7 COMMENT='sales data';"
        );
    }

    #[test]
    fn test_schema_comment_quotes_are_escaped() {
        let schema = Schema {
            name: "S".into(),
            comment: "owner's data".into(),
            retention_days: Some("1".into()),
        };
        let stmt = schema.create_statement(&Scope::new("DB")).unwrap();
        assert!(stmt.ends_with("COMMENT='owner''s data';"));
    }

    #[test]
    fn test_missing_retention_omits_clause() {
        let row = ListingRow::new(
            vec!["name".into(), "comment".into(), "retention_time".into()],
            vec![Some("RAW".into()), None, None],
        );
        let schema = Schema::from_row(&row).unwrap();
        assert_eq!(schema.retention_days, None);
        assert_eq!(
            schema.create_statement(&Scope::new("DB")).unwrap(),
            "CREATE SCHEMA IF NOT EXISTS \"DB\".\"RAW\" COMMENT='';"
        );
    }
}
