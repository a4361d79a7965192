//! Definition post-processing.
//!
//! Two literal substring rewrites are applied to every retrieved
//! definition; the text is never parsed beyond them.

use serde::{Deserialize, Serialize};

use crate::core::descriptor::ReplacePolicy;

/// Downgrade `create or replace` for kinds where replacing is unsafe.
///
/// Only the first `create or replace <TYPE> ` (type word uppercased) is
/// rewritten to `create <TYPE> if not exists `. A definition that does not
/// contain it is returned unchanged.
pub fn apply_replace_policy(definition: &str, display_type: &str, policy: ReplacePolicy) -> String {
    if policy.allows_replace() {
        return definition.to_string();
    }
    let type_word = display_type.to_uppercase();
    definition.replacen(
        &format!("create or replace {} ", type_word),
        &format!("create {} if not exists ", type_word),
        1,
    )
}

/// Replace every occurrence of `pattern` with `replacement`.
///
/// An empty or absent pattern leaves the definition untouched. Applying
/// this twice is only idempotent when `replacement` does not itself
/// contain `pattern`.
pub fn apply_env_substitution(definition: &str, pattern: Option<&str>, replacement: &str) -> String {
    match pattern {
        Some(p) if !p.is_empty() => definition.replace(p, replacement),
        _ => definition.to_string(),
    }
}

/// Environment parameterization applied to every written script.
///
/// Typically the pattern is the environment suffix baked into object names
/// (e.g. `_DEV`) and the replacement a SnowSQL variable (e.g. `&{ENV}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSubstitution {
    pub pattern: Option<String>,
    pub replacement: String,
}

impl EnvSubstitution {
    pub fn new(pattern: Option<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.filter(|p| !p.is_empty()),
            replacement: replacement.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn apply(&self, definition: &str) -> String {
        apply_env_substitution(definition, self.pattern.as_deref(), &self.replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_not_exists_rewrites_once() {
        let ddl = "create or replace TABLE T1 (c number);\n-- create or replace TABLE copy";
        let out = apply_replace_policy(ddl, "table", ReplacePolicy::IfNotExists);
        assert_eq!(
            out,
            "create TABLE if not exists T1 (c number);\n-- create or replace TABLE copy"
        );
    }

    #[test]
    fn test_replace_policy_keeps_definition() {
        let ddl = "create or replace VIEW V AS SELECT 1;";
        assert_eq!(apply_replace_policy(ddl, "view", ReplacePolicy::Replace), ddl);
    }

    #[test]
    fn test_multi_word_type_is_uppercased() {
        let ddl = "create or replace FILE FORMAT F TYPE = CSV;";
        assert_eq!(
            apply_replace_policy(ddl, "file format", ReplacePolicy::IfNotExists),
            "create FILE FORMAT if not exists F TYPE = CSV;"
        );
    }

    #[test]
    fn test_missing_keyword_is_unchanged() {
        let ddl = "CREATE SEQUENCE S START 1;";
        assert_eq!(apply_replace_policy(ddl, "sequence", ReplacePolicy::IfNotExists), ddl);
    }

    #[test]
    fn test_env_substitution_replaces_all() {
        let ddl = "create VIEW V_DEV AS SELECT * FROM T_DEV JOIN U_DEV;";
        assert_eq!(
            apply_env_substitution(ddl, Some("_DEV"), "_&{ENV}"),
            "create VIEW V_&{ENV} AS SELECT * FROM T_&{ENV} JOIN U_&{ENV};"
        );
    }

    #[test]
    fn test_empty_pattern_is_noop() {
        let ddl = "create TABLE T;";
        assert_eq!(apply_env_substitution(ddl, Some(""), "X"), ddl);
        assert_eq!(apply_env_substitution(ddl, None, "X"), ddl);
    }

    #[test]
    fn test_idempotent_when_replacement_lacks_pattern() {
        let once = apply_env_substitution("A_DEV B_DEV", Some("_DEV"), "_&{ENV}");
        let twice = apply_env_substitution(&once, Some("_DEV"), "_&{ENV}");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_not_idempotent_when_replacement_contains_pattern() {
        let once = apply_env_substitution("T_DEV", Some("_DEV"), "_DEV_X");
        let twice = apply_env_substitution(&once, Some("_DEV"), "_DEV_X");
        assert_eq!(once, "T_DEV_X");
        assert_eq!(twice, "T_DEV_X_X");
    }

    #[test]
    fn test_env_substitution_struct() {
        let env = EnvSubstitution::new(Some(String::new()), "X");
        assert!(!env.is_active());
        let env = EnvSubstitution::new(Some("PRD".into()), "&{ENV}");
        assert_eq!(env.apply("DB_PRD.S"), "DB_&{ENV}.S");
    }
}
