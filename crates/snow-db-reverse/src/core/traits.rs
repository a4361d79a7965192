//! The metadata source seam.
//!
//! [`MetadataSource`] is everything the extraction engine needs from the
//! database: listing objects of a kind and fetching one object's normalized
//! definition. Every call returns an explicit [`Result`]; callers decide
//! whether a failure is fatal for the run or only skips one object.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::ListingRow;

/// Read object listings and definitions from a database.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// List objects of `kind` (plural `SHOW` vocabulary such as `"tables"`).
    ///
    /// With `schema == None` the listing is database-scoped (used for
    /// `"schemas"`); otherwise it is scoped to that schema.
    async fn list_objects(
        &self,
        kind: &str,
        database: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ListingRow>>;

    /// Fetch the normalized creation statement for one object.
    ///
    /// `object_key` is the fully qualified, quoted key with any argument
    /// signature already appended. An empty string means the source has no
    /// definition for the object.
    async fn get_definition(&self, type_term: &str, object_key: &str) -> Result<String>;

    /// Short description of the source for logs.
    fn describe(&self) -> String;
}
