//! Snowflake metadata source.

pub mod sql;

use std::future::Future;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use async_trait::async_trait;
use serde_json::Value;
use snowflake_api::{QueryResult, SnowflakeApi};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::schema::ListingRow;
use crate::core::traits::MetadataSource;
use crate::error::{ReverseError, Result};

/// One authenticated Snowflake session, opened at construction and reused
/// for every statement of the run.
pub struct SnowflakeSource {
    api: SnowflakeApi,
    account: String,
    user: String,
    role: String,
}

/// Rows of one statement.
///
/// Arrow results include every downloaded chunk. A JSON rowset is only the
/// first chunk of the result, so it may be missing rows.
#[derive(Debug)]
enum RowSet {
    Complete(Vec<ListingRow>),
    FirstChunk(Vec<ListingRow>),
}

impl RowSet {
    fn into_rows(self) -> Vec<ListingRow> {
        match self {
            RowSet::Complete(rows) | RowSet::FirstChunk(rows) => rows,
        }
    }
}

impl SnowflakeSource {
    /// Open a session with password authentication.
    ///
    /// The first statement also performs the login, so credential and
    /// network problems surface here rather than on the first listing.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let password = config.password.as_deref().ok_or_else(|| {
            ReverseError::Config("source.password is required to connect".to_string())
        })?;

        let api = SnowflakeApi::with_password_auth(
            &config.account,
            config.warehouse.as_deref(),
            None,
            None,
            &config.user,
            Some(&config.role),
            password,
        )?;

        let source = Self {
            api,
            account: config.account.clone(),
            user: config.user.clone(),
            role: config.role.clone(),
        };
        source.query(sql::SESSION_CHECK.to_string()).await?;

        info!(
            "Connected to Snowflake: account={} user={} role={}",
            source.account, source.user, source.role
        );
        Ok(source)
    }

    /// Run one statement and collect its rows.
    async fn query(&self, statement: String) -> Result<RowSet> {
        debug!("Executing: {}", statement);
        match self.api.exec(&statement).await? {
            QueryResult::Arrow(batches) => {
                Ok(RowSet::Complete(rows_from_batches(&statement, &batches)?))
            }
            QueryResult::Json(json) => {
                let columns = json.schema.iter().map(|f| f.name.clone()).collect();
                Ok(RowSet::FirstChunk(rows_from_rowset(
                    &statement,
                    columns,
                    &json.value,
                )?))
            }
            QueryResult::Empty => Ok(RowSet::Complete(Vec::new())),
        }
    }
}

/// Read every row of a `SHOW` statement.
///
/// `SHOW` output may come back as an inline JSON rowset, which holds only
/// the first chunk. In that case the result is read again through
/// `RESULT_SCAN`, which is returned as Arrow chunks. If that still yields
/// JSON the listing fails rather than returning a partial list.
async fn read_listing<F, Fut>(show: &str, mut run: F) -> Result<Vec<ListingRow>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<RowSet>>,
{
    match run(show.to_string()).await? {
        RowSet::Complete(rows) => Ok(rows),
        RowSet::FirstChunk(first) => {
            debug!(
                "{} returned {} inline rows; re-reading the full result",
                show,
                first.len()
            );
            match run(sql::RESULT_SCAN_LAST.to_string()).await? {
                RowSet::Complete(rows) => Ok(rows),
                RowSet::FirstChunk(_) => Err(ReverseError::ResultShape {
                    statement: sql::RESULT_SCAN_LAST.to_string(),
                    message: "result came back as an inline JSON rowset and may be truncated"
                        .to_string(),
                }),
            }
        }
    }
}

#[async_trait]
impl MetadataSource for SnowflakeSource {
    async fn list_objects(
        &self,
        kind: &str,
        database: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ListingRow>> {
        let statement = sql::show_statement(kind, database, schema)?;
        read_listing(&statement, |s| self.query(s)).await.map_err(|e| {
            let scope = match schema {
                Some(s) => format!("schema {}.{}", database, s),
                None => format!("database {}", database),
            };
            ReverseError::listing(kind, scope, e)
        })
    }

    async fn get_definition(&self, type_term: &str, object_key: &str) -> Result<String> {
        let statement = sql::get_ddl_statement(type_term, object_key);
        let rows = self
            .query(statement)
            .await
            .map_err(|e| ReverseError::definition(object_key, e))?
            .into_rows();

        Ok(rows
            .first()
            .and_then(|row| row.value_at(0))
            .unwrap_or_default()
            .to_string())
    }

    fn describe(&self) -> String {
        format!("snowflake://{}@{}", self.user, self.account)
    }
}

/// Convert Arrow batches to rows, rendering every cell as text.
fn rows_from_batches(statement: &str, batches: &[RecordBatch]) -> Result<Vec<ListingRow>> {
    let mut rows = Vec::new();
    for batch in batches {
        let columns: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();

        for idx in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|column| {
                    if column.is_null(idx) {
                        return Ok(None);
                    }
                    array_value_to_string(column.as_ref(), idx)
                        .map(Some)
                        .map_err(|e| ReverseError::ResultShape {
                            statement: statement.to_string(),
                            message: e.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(ListingRow::new(columns.clone(), values));
        }
    }
    Ok(rows)
}

/// Convert a JSON rowset (array of arrays of strings/nulls) to rows.
fn rows_from_rowset(statement: &str, columns: Vec<String>, rowset: &Value) -> Result<Vec<ListingRow>> {
    let rows = match rowset {
        Value::Null => return Ok(Vec::new()),
        Value::Array(rows) => rows,
        other => {
            return Err(ReverseError::ResultShape {
                statement: statement.to_string(),
                message: format!("expected an array of rows, got {}", other),
            })
        }
    };

    rows.iter()
        .map(|row| {
            let cells = row.as_array().ok_or_else(|| ReverseError::ResultShape {
                statement: statement.to_string(),
                message: format!("expected a row array, got {}", row),
            })?;
            let values = cells
                .iter()
                .map(|cell| match cell {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Ok(ListingRow::new(columns.clone(), values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn named_rows(names: &[&str]) -> Vec<ListingRow> {
        names
            .iter()
            .map(|n| ListingRow::from_pairs([("name", *n)]))
            .collect()
    }

    fn schema_batch(names: Vec<&str>, comments: Vec<Option<&str>>, retention: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("comment", DataType::Utf8, true),
            Field::new("retention_time", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(names)),
            Arc::new(StringArray::from(comments)),
            Arc::new(Int64Array::from(retention)),
        ];
        RecordBatch::try_new(schema, columns).unwrap()
    }

    #[test]
    fn test_batches_conversion_spans_chunks() {
        let batches = vec![
            schema_batch(vec!["PUBLIC"], vec![None], vec![7]),
            schema_batch(vec!["SALES", "FINANCE"], vec![Some("sales data"), None], vec![1, 90]),
        ];
        let rows = rows_from_batches("show schemas", &batches).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name(), Some("PUBLIC"));
        assert_eq!(rows[0].get("comment"), None);
        assert_eq!(rows[0].get("retention_time"), Some("7"));
        assert_eq!(rows[1].get("comment"), Some("sales data"));
        assert_eq!(rows[2].name(), Some("FINANCE"));
        assert_eq!(rows[2].get("retention_time"), Some("90"));
    }

    #[tokio::test]
    async fn test_listing_complete_result_is_used_directly() {
        let issued = Mutex::new(Vec::new());
        let rows = read_listing("show tables in schema \"DB\".\"S\"", |s| {
            issued.lock().unwrap().push(s);
            async { Ok::<_, ReverseError>(RowSet::Complete(named_rows(&["T1", "T2"]))) }
        })
        .await
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(issued.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_first_chunk_is_reread_in_full() {
        let issued = Mutex::new(Vec::new());
        let rows = read_listing("show procedures in schema \"DB\".\"S\"", |s| {
            let rescan = s == sql::RESULT_SCAN_LAST;
            issued.lock().unwrap().push(s);
            async move {
                let rows = if rescan {
                    RowSet::Complete(named_rows(&["P1", "P2", "P3"]))
                } else {
                    RowSet::FirstChunk(named_rows(&["P1"]))
                };
                Ok::<_, ReverseError>(rows)
            }
        })
        .await
        .unwrap();

        let names: Vec<_> = rows.iter().filter_map(|r| r.name()).collect();
        assert_eq!(names, vec!["P1", "P2", "P3"]);
        assert_eq!(
            issued.lock().unwrap().last().map(String::as_str),
            Some(sql::RESULT_SCAN_LAST)
        );
    }

    #[tokio::test]
    async fn test_listing_that_stays_partial_fails() {
        let err = read_listing("show tables in schema \"DB\".\"S\"", |_| async {
            Ok::<_, ReverseError>(RowSet::FirstChunk(named_rows(&["T1"])))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ReverseError::ResultShape { .. }));
    }

    #[test]
    fn test_rowset_conversion() {
        let rowset = json!([
            ["2024-01-01", "PUBLIC", null, "7"],
            ["2024-01-02", "SALES", "sales data", "1"],
        ]);
        let rows = rows_from_rowset(
            "show schemas",
            columns(&["created_on", "name", "comment", "retention_time"]),
            &rowset,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name(), Some("PUBLIC"));
        assert_eq!(rows[0].get("comment"), None);
        assert_eq!(rows[1].get("comment"), Some("sales data"));
        assert_eq!(rows[1].get("retention_time"), Some("1"));
    }

    #[test]
    fn test_non_string_cells_are_stringified() {
        let rows = rows_from_rowset("q", columns(&["n"]), &json!([[42]])).unwrap();
        assert_eq!(rows[0].get("n"), Some("42"));
    }

    #[test]
    fn test_null_rowset_is_empty() {
        assert!(rows_from_rowset("q", vec![], &Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rowset_is_error() {
        let err = rows_from_rowset("q", vec![], &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, ReverseError::ResultShape { .. }));
        let err = rows_from_rowset("q", vec![], &json!(["not a row"])).unwrap_err();
        assert!(matches!(err, ReverseError::ResultShape { .. }));
    }
}
