//! # snow-db-reverse
//!
//! Reverse-engineer a Snowflake database into a deterministic tree of
//! SnowSQL DDL scripts, one file per object:
//!
//! ```text
//! ddl/
//! ├── 00_ANALYTICS.sql
//! └── 01_PUBLIC/
//!     ├── 00_PUBLIC.sql
//!     ├── 03_tables/00_ORDERS.sql
//!     └── 08_procedures/00_LOAD_ORDERS.sql
//! ```
//!
//! - **Ordered layout**: folders carry the object type's emission order
//! - **Idempotent scripts**: `create or replace` is downgraded to
//!   `create ... if not exists` for tables, sequences, pipes and streams
//! - **Environment parameterization**: a literal marker (e.g. `_DEV`) is
//!   swapped for a SnowSQL variable in every script
//!
//! ## Example
//!
//! ```rust,no_run
//! use snow_db_reverse::{Config, Extractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?;
//!     config.validate()?;
//!     let extractor = Extractor::new(config).await?;
//!     let result = extractor.run().await?;
//!     println!("Wrote {} scripts", result.artifacts_written);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod layout;
pub mod orchestrator;
pub mod rewrite;
pub mod source;

// Re-exports for convenient access
pub use config::{Config, ExtractionConfig, SourceConfig};
pub use crate::core::{
    ListingRow, MetadataSource, ObjectCatalog, ObjectTypeDescriptor, ReplacePolicy, Schema, Scope,
};
pub use error::{ReverseError, Result};
pub use layout::{write_artifact, LayoutPlanner, SCRIPT_PREAMBLE};
pub use orchestrator::{ExtractionResult, Extractor, FailedObject};
pub use rewrite::{apply_env_substitution, apply_replace_policy, EnvSubstitution};
pub use source::SnowflakeSource;
