//! Object-type descriptors and the per-type resolution rules.
//!
//! Each kind of schema object is described by one row of a closed table:
//! its plural display name (also the `SHOW` keyword and the folder name),
//! its emission order token, its replace-policy, and the resolver flags
//! that used to be string special cases (lookup term, argument signature,
//! built-in exclusion). New kinds are added by appending a row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReverseError, Result};

use super::identifier::{is_safe_path_segment, qualify};
use super::schema::{ListingRow, Scope, ARGUMENTS_COLUMN, BUILTIN_COLUMN, NAME_COLUMN};

/// Marker splitting a declaration's argument list from its return clause.
const RETURN_MARKER: &str = "RETURN";
/// Lookup term for which definitions are never requested.
const STAGE_TERM: &str = "stage";

/// Two-digit emission order of an object type.
///
/// Several descriptors may share a token; ties keep declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderToken(u8);

impl OrderToken {
    pub fn new(order: u8) -> Result<Self> {
        if order > 99 {
            return Err(ReverseError::Catalog(format!(
                "order token must have two digits, got {}",
                order
            )));
        }
        Ok(Self(order))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Whether `create or replace` may be kept in an object's definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Re-running the script may replace the object.
    Replace,
    /// Must be downgraded to `create ... if not exists`.
    IfNotExists,
}

impl ReplacePolicy {
    pub fn allows_replace(self) -> bool {
        matches!(self, ReplacePolicy::Replace)
    }
}

/// How one kind of schema object is listed, ordered and rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTypeDescriptor {
    /// Plural display name: the `SHOW` keyword and the folder name.
    pub display_name: String,
    /// Singular type word, matched (uppercased) by the replace-policy rewrite.
    pub singular: String,
    /// Term passed as the first `GET_DDL` argument.
    pub type_term: String,
    pub order: OrderToken,
    pub replace_policy: ReplacePolicy,
    /// Listing rows carry a declaration whose argument list disambiguates overloads.
    pub has_signature: bool,
    /// Rows marked `is_builtin = 'Y'` are never emitted.
    pub excludes_builtins: bool,
}

impl ObjectTypeDescriptor {
    /// Create a descriptor, deriving the singular word and lookup term
    /// from the display name.
    pub fn new(display_name: &str, order: u8, replace_policy: ReplacePolicy) -> Result<Self> {
        if !is_safe_path_segment(display_name) {
            return Err(ReverseError::Catalog(format!(
                "display name {:?} cannot be used as a folder name",
                display_name
            )));
        }
        let singular = singularize(display_name);
        let type_term = normalize_type_term(&singular);
        Ok(Self {
            display_name: display_name.to_string(),
            singular,
            type_term,
            order: OrderToken::new(order)?,
            replace_policy,
            has_signature: false,
            excludes_builtins: false,
        })
    }

    /// Mark the kind as carrying an argument signature in its listing rows.
    pub fn with_signature(mut self) -> Self {
        self.has_signature = true;
        self
    }

    /// Mark the kind as filtering out Snowflake-provided rows.
    pub fn excluding_builtins(mut self) -> Self {
        self.excludes_builtins = true;
        self
    }

    /// Folder segment, e.g. `03_tables`.
    pub fn folder_name(&self) -> String {
        format!("{}_{}", self.order, self.display_name)
    }

    /// Whether definitions of this kind are requested at all.
    pub fn fetches_definition(&self) -> bool {
        self.type_term != STAGE_TERM
    }

    /// Whether a listing row is a Snowflake-provided object.
    pub fn is_builtin(&self, row: &ListingRow) -> bool {
        self.excludes_builtins && row.get(BUILTIN_COLUMN) == Some("Y")
    }

    /// Argument fragment appended to the lookup key (empty for most kinds).
    pub fn argument_fragment(&self, row: &ListingRow) -> Result<String> {
        if !self.has_signature {
            return Ok(String::new());
        }
        let name = row.require(NAME_COLUMN, &self.display_name)?;
        let declaration = row.require(ARGUMENTS_COLUMN, &self.display_name)?;
        extract_argument_fragment(name, declaration)
    }

    /// Fully qualified `GET_DDL` key for an object, with its fragment appended.
    pub fn lookup_key(
        &self,
        scope: &Scope,
        schema: &str,
        name: &str,
        fragment: &str,
    ) -> Result<String> {
        Ok(format!(
            "{}{}",
            qualify(scope.database(), schema, name)?,
            fragment
        ))
    }
}

/// The built-in descriptor table, in declaration order.
pub fn builtin_descriptors() -> Result<Vec<ObjectTypeDescriptor>> {
    use ReplacePolicy::{IfNotExists, Replace};

    Ok(vec![
        ObjectTypeDescriptor::new("file formats", 1, Replace)?,
        ObjectTypeDescriptor::new("masking policies", 1, Replace)?,
        ObjectTypeDescriptor::new("row access policies", 1, Replace)?,
        ObjectTypeDescriptor::new("tags", 1, Replace)?,
        ObjectTypeDescriptor::new("sequences", 2, IfNotExists)?,
        ObjectTypeDescriptor::new("tables", 3, IfNotExists)?,
        ObjectTypeDescriptor::new("views", 4, Replace)?,
        ObjectTypeDescriptor::new("pipes", 5, IfNotExists)?,
        ObjectTypeDescriptor::new("streams", 6, IfNotExists)?,
        ObjectTypeDescriptor::new("user functions", 7, Replace)?.with_signature(),
        ObjectTypeDescriptor::new("procedures", 8, Replace)?
            .with_signature()
            .excluding_builtins(),
        ObjectTypeDescriptor::new("tasks", 9, Replace)?,
    ])
}

/// Singular type word for a plural display name.
///
/// Policy kinds all share the `policy` term; other plurals drop their
/// trailing `s`.
pub fn singularize(display_name: &str) -> String {
    if display_name.contains("policies") {
        return "policy".to_string();
    }
    display_name
        .strip_suffix('s')
        .unwrap_or(display_name)
        .to_string()
}

/// Map a singular display type to the term `GET_DDL` expects.
pub fn normalize_type_term(display_type: &str) -> String {
    let lowered = display_type.to_lowercase();
    match lowered.as_str() {
        "user function" => "function".to_string(),
        "file format" => "file_format".to_string(),
        _ => lowered,
    }
}

/// Cut the parenthesized signature out of a declaration.
///
/// Everything from the first `RETURN` on is dropped, then every occurrence
/// of the object's own name is removed:
/// `"MYFUNC (A NUMBER) RETURN NUMBER"` gives `" (A NUMBER) "`.
pub fn extract_argument_fragment(name: &str, declaration: &str) -> Result<String> {
    let end = declaration
        .find(RETURN_MARKER)
        .ok_or_else(|| ReverseError::MissingReturnClause {
            object: name.to_string(),
            declaration: declaration.to_string(),
        })?;
    let head = &declaration[..end];
    if name.is_empty() {
        return Ok(head.to_string());
    }
    Ok(head.replace(name, ""))
}
