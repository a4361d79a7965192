//! Object catalog: the descriptor table and the schema scan list.
//!
//! The [`ObjectCatalog`] is explicitly constructed and handed to the
//! extractor rather than living in a global. It owns the ordered
//! descriptor table; the schema scan list is resolved from a
//! [`MetadataSource`] once per run.

use tracing::debug;

use crate::error::{ReverseError, Result};

use super::descriptor::{builtin_descriptors, ObjectTypeDescriptor};
use super::schema::{Scope, Schema};
use super::traits::MetadataSource;

/// Snowflake's system schema, never scanned.
pub const SYSTEM_SCHEMA: &str = "INFORMATION_SCHEMA";

/// `SHOW` keyword for database-scoped schema listing.
pub const SCHEMAS_KIND: &str = "schemas";

/// Ordered table of object-type descriptors.
///
/// # Example
///
/// ```rust,ignore
/// let mut catalog = ObjectCatalog::with_builtins()?;
/// catalog.register(ObjectTypeDescriptor::new("alerts", 10, ReplacePolicy::Replace)?)?;
/// for descriptor in catalog.ordered() {
///     println!("{}", descriptor.folder_name());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectCatalog {
    descriptors: Vec<ObjectTypeDescriptor>,
}

impl ObjectCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with the built-in Snowflake object kinds.
    pub fn with_builtins() -> Result<Self> {
        let mut catalog = Self::new();
        for descriptor in builtin_descriptors()? {
            catalog.register(descriptor)?;
        }
        Ok(catalog)
    }

    /// Append a descriptor.
    ///
    /// Fails when another descriptor already uses the same
    /// (order token, display name) pair, since both would write into the
    /// same folder.
    pub fn register(&mut self, descriptor: ObjectTypeDescriptor) -> Result<()> {
        if self.descriptors.iter().any(|d| {
            d.order == descriptor.order && d.display_name == descriptor.display_name
        }) {
            return Err(ReverseError::Catalog(format!(
                "object type {} is already registered",
                descriptor.folder_name()
            )));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Descriptors in emission order: by order token, then declaration order.
    pub fn ordered(&self) -> Vec<&ObjectTypeDescriptor> {
        let mut ordered: Vec<&ObjectTypeDescriptor> = self.descriptors.iter().collect();
        // sort_by_key is stable, so equal tokens keep declaration order
        ordered.sort_by_key(|d| d.order);
        ordered
    }

    /// Look up a descriptor by display name.
    pub fn get(&self, display_name: &str) -> Option<&ObjectTypeDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.display_name == display_name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Resolve the schemas to scan, in source order.
///
/// An empty `inclusion` keeps every schema; otherwise names are matched
/// case-insensitively. [`SYSTEM_SCHEMA`] is always dropped. A listing
/// failure is returned as an error; an empty result is not one.
pub async fn resolve_scan_list(
    source: &dyn MetadataSource,
    scope: &Scope,
    inclusion: &[String],
) -> Result<Vec<Schema>> {
    let rows = source
        .list_objects(SCHEMAS_KIND, scope.database(), None)
        .await
        .map_err(|e| match e {
            listing @ ReverseError::Listing { .. } => listing,
            other => ReverseError::listing(
                SCHEMAS_KIND,
                format!("database {}", scope.database()),
                other,
            ),
        })?;

    let wanted: Vec<String> = inclusion.iter().map(|s| s.to_lowercase()).collect();

    let mut schemas = Vec::new();
    for row in &rows {
        let schema = Schema::from_row(row)?;
        if schema.name == SYSTEM_SCHEMA {
            continue;
        }
        if !wanted.is_empty() && !wanted.contains(&schema.name.to_lowercase()) {
            debug!("Schema {} not in inclusion list, skipping", schema.name);
            continue;
        }
        schemas.push(schema);
    }

    Ok(schemas)
}
