//! Core abstractions for schema extraction.
//!
//! - [`schema`]: scope, schema and listing-row types
//! - [`descriptor`]: the object-type descriptor table and per-type resolution
//! - [`catalog`]: ordered descriptor registry and schema scan list
//! - [`traits`]: the [`MetadataSource`] seam implemented by database adapters
//! - [`identifier`]: identifier quoting and path-segment checks
//!
//! The core never talks to Snowflake directly; adapters in
//! [`crate::source`] implement [`MetadataSource`], and tests substitute
//! in-memory sources.

pub mod catalog;
pub mod descriptor;
pub mod identifier;
pub mod schema;
pub mod traits;

pub use catalog::{resolve_scan_list, ObjectCatalog, SCHEMAS_KIND, SYSTEM_SCHEMA};
pub use descriptor::{
    builtin_descriptors, extract_argument_fragment, normalize_type_term, ObjectTypeDescriptor,
    OrderToken, ReplacePolicy,
};
pub use schema::{ListingRow, Schema, Scope};
pub use traits::MetadataSource;
