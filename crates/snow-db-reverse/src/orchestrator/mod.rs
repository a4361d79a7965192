//! Extraction orchestrator - main workflow coordinator.
//!
//! Drives the traversal database → schemas → object types (catalog order)
//! → objects, strictly one statement at a time over a single session.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{Config, ExtractionConfig};
use crate::core::catalog::{resolve_scan_list, ObjectCatalog};
use crate::core::descriptor::ObjectTypeDescriptor;
use crate::core::schema::{ListingRow, Schema, Scope};
use crate::core::traits::MetadataSource;
use crate::error::{ReverseError, Result};
use crate::layout::{write_artifact, LayoutPlanner};
use crate::rewrite::{apply_replace_policy, EnvSubstitution};
use crate::source::SnowflakeSource;

/// Extraction orchestrator.
pub struct Extractor {
    scope: Scope,
    schemas: Vec<String>,
    catalog: ObjectCatalog,
    source: Arc<dyn MetadataSource>,
    layout: LayoutPlanner,
    env: EnvSubstitution,
}

/// Result of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: `completed` or `completed_with_errors`.
    pub status: String,

    /// Database that was extracted.
    pub database: String,

    /// Root of the written tree.
    pub output_folder: PathBuf,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Schemas in the scan list.
    pub schemas_scanned: usize,

    /// Scripts written (database, schema and object files).
    pub artifacts_written: usize,

    /// Snowflake-provided procedures left out.
    pub builtins_skipped: usize,

    /// Objects whose definition came back empty.
    pub empty_definitions: usize,

    /// Objects (or listings) that failed and produced no file.
    pub failed_objects: Vec<FailedObject>,
}

/// One object-level failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedObject {
    /// Schema the failure occurred in.
    pub schema: String,
    /// Object type display name (empty for schema-level failures).
    pub kind: String,
    /// Object name (empty when a whole listing failed).
    pub name: String,
    /// Error message.
    pub error: String,
}

impl ExtractionResult {
    /// Convert result to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_objects.is_empty()
    }
}

/// What happened to one listing row.
enum ObjectOutcome {
    Written(PathBuf),
    EmptyDefinition,
    Builtin,
}

/// Mutable counters for one run.
#[derive(Default)]
struct RunTally {
    artifacts_written: usize,
    builtins_skipped: usize,
    empty_definitions: usize,
    failed_objects: Vec<FailedObject>,
    written_paths: HashSet<PathBuf>,
}

impl RunTally {
    /// Counts distinct paths; a rewrite of the same path only warns.
    fn record_written(&mut self, path: PathBuf) {
        if self.written_paths.insert(path.clone()) {
            self.artifacts_written += 1;
        } else {
            warn!(
                "{:?} was written more than once in this run; overloaded objects share one script",
                path
            );
        }
    }

    fn record_failure(&mut self, schema: &str, kind: &str, name: &str, err: &ReverseError) {
        self.failed_objects.push(FailedObject {
            schema: schema.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            error: err.to_string(),
        });
    }
}

/// Whether an error only affects the object (or listing) it came from.
///
/// File system errors while writing are not: the output tree itself is
/// unusable, so the run stops.
fn is_object_scoped(err: &ReverseError) -> bool {
    matches!(
        err,
        ReverseError::Snowflake(_)
            | ReverseError::ResultShape { .. }
            | ReverseError::Listing { .. }
            | ReverseError::Definition { .. }
            | ReverseError::MissingReturnClause { .. }
            | ReverseError::MissingColumn { .. }
            | ReverseError::UnsafeObjectName(_)
            | ReverseError::Config(_)
    )
}

impl Extractor {
    /// Create an extractor connected to Snowflake.
    pub async fn new(config: Config) -> Result<Self> {
        let source = SnowflakeSource::connect(&config.source).await?;
        Self::with_source(config.extraction, Arc::new(source))
    }

    /// Create an extractor over an existing metadata source.
    pub fn with_source(
        extraction: ExtractionConfig,
        source: Arc<dyn MetadataSource>,
    ) -> Result<Self> {
        Ok(Self {
            scope: extraction.scope(),
            schemas: extraction.schemas.clone(),
            catalog: ObjectCatalog::with_builtins()?,
            layout: LayoutPlanner::new(extraction.folder.clone()),
            env: extraction.env_substitution(),
            source,
        })
    }

    /// Replace the descriptor catalog.
    pub fn with_catalog(mut self, catalog: ObjectCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    /// Run the extraction.
    ///
    /// Fails without writing anything when the schema list cannot be
    /// resolved or the output folder cannot be recreated. Failures of a
    /// single object or listing are recorded in the result and the
    /// traversal moves on.
    pub async fn run(&self) -> Result<ExtractionResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Starting extraction run {} of {} from {}",
            run_id,
            self.scope.database(),
            self.source.describe()
        );

        // Phase 1: Resolve the scan list
        info!("Phase 1: Resolving schemas to scan");
        let schemas = resolve_scan_list(self.source.as_ref(), &self.scope, &self.schemas).await?;
        if schemas.is_empty() {
            warn!(
                "No schemas to extract in {} (filter: {:?})",
                self.scope.database(),
                self.schemas
            );
        } else {
            info!("Found {} schemas to extract", schemas.len());
        }

        // Phase 2: Recreate the output folder
        info!("Phase 2: Recreating output folder {:?}", self.layout.root());
        self.layout.reset_root()?;

        let mut tally = RunTally::default();

        let db_path = self.layout.database_file(self.scope.database())?;
        let db_script = self.env.apply(&self.scope.create_statement()?);
        if write_artifact(&db_path, &db_script)? {
            tally.record_written(db_path);
        }

        // Phase 3: Walk schemas and object types
        info!("Phase 3: Extracting object definitions");
        for schema in &schemas {
            let span = info_span!("schema", name = %schema.name);
            self.extract_schema(schema, &mut tally).instrument(span).await?;
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let status = if tally.failed_objects.is_empty() {
            "completed"
        } else {
            "completed_with_errors"
        };

        let result = ExtractionResult {
            run_id,
            status: status.to_string(),
            database: self.scope.database().to_string(),
            output_folder: self.layout.root().to_path_buf(),
            started_at,
            completed_at,
            duration_seconds: duration,
            schemas_scanned: schemas.len(),
            artifacts_written: tally.artifacts_written,
            builtins_skipped: tally.builtins_skipped,
            empty_definitions: tally.empty_definitions,
            failed_objects: tally.failed_objects,
        };

        info!(
            "Extraction {}: {} schemas, {} scripts, {} failures in {:.1}s",
            result.status,
            result.schemas_scanned,
            result.artifacts_written,
            result.failed_objects.len(),
            result.duration_seconds
        );

        Ok(result)
    }

    /// Emit the schema script, then every object type in catalog order.
    async fn extract_schema(&self, schema: &Schema, tally: &mut RunTally) -> Result<()> {
        let prepared = self.layout.schema_file(&schema.name).and_then(|path| {
            schema
                .create_statement(&self.scope)
                .map(|script| (path, script))
        });
        let (path, script) = match prepared {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Skipping schema {}: {}", schema.name, e);
                tally.record_failure(&schema.name, "", "", &e);
                return Ok(());
            }
        };
        if write_artifact(&path, &self.env.apply(&script))? {
            tally.record_written(path);
        }

        for descriptor in self.catalog.ordered() {
            let rows = match self
                .source
                .list_objects(&descriptor.display_name, self.scope.database(), Some(&schema.name))
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Statement error: {}", e);
                    tally.record_failure(&schema.name, &descriptor.display_name, "", &e);
                    continue;
                }
            };
            debug!("{} {} in {}", rows.len(), descriptor.display_name, schema.name);

            for row in &rows {
                let name = row.name().unwrap_or_default().to_string();
                match self.emit_object(&schema.name, descriptor, row).await {
                    Ok(ObjectOutcome::Written(path)) => tally.record_written(path),
                    Ok(ObjectOutcome::EmptyDefinition) => {
                        debug!("No definition for {} {}.{}", descriptor.singular, schema.name, name);
                        tally.empty_definitions += 1;
                    }
                    Ok(ObjectOutcome::Builtin) => {
                        debug!("Skipping built-in {} {}", descriptor.singular, name);
                        tally.builtins_skipped += 1;
                    }
                    Err(e) if is_object_scoped(&e) => {
                        match &e {
                            ReverseError::MissingReturnClause { .. } => error!("{}", e),
                            _ => warn!("Statement error: {}", e),
                        }
                        tally.record_failure(&schema.name, &descriptor.display_name, &name, &e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(())
    }

    /// Resolve, fetch, rewrite and write one object.
    async fn emit_object(
        &self,
        schema: &str,
        descriptor: &ObjectTypeDescriptor,
        row: &ListingRow,
    ) -> Result<ObjectOutcome> {
        if descriptor.is_builtin(row) {
            return Ok(ObjectOutcome::Builtin);
        }

        let name = row.require(crate::core::schema::NAME_COLUMN, &descriptor.display_name)?;
        let path = self.layout.object_file(schema, descriptor, name)?;
        let fragment = descriptor.argument_fragment(row)?;

        if !descriptor.fetches_definition() {
            return Ok(ObjectOutcome::EmptyDefinition);
        }

        let key = descriptor.lookup_key(&self.scope, schema, name, &fragment)?;
        let definition = self.source.get_definition(&descriptor.type_term, &key).await?;
        let definition =
            apply_replace_policy(&definition, &descriptor.singular, descriptor.replace_policy);
        let payload = self.env.apply(&definition);

        if write_artifact(&path, &payload)? {
            Ok(ObjectOutcome::Written(path))
        } else {
            Ok(ObjectOutcome::EmptyDefinition)
        }
    }
}
