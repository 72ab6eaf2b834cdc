use crate::dialect::Dialect;
use serde::Deserialize;

/// Configuration for a [`QueryBuilder`](crate::QueryBuilder) session.
///
/// The defaults are conservative: SQL logging is off and unconditional
/// UPDATE/DELETE statements are refused.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Target dialect.
    pub dialect: Dialect,
    /// Length used for `VARCHAR(n)` when mapping string columns.
    pub varchar_length: u32,
    /// Emit every built statement on the `sqlweave.sql` tracing target.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
    /// Allow UPDATE/DELETE without conditions for every statement in the session.
    pub allow_full_mutation: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            varchar_length: 255,
            log_sql: false,
            max_sql_log_length: Some(200),
            allow_full_mutation: false,
        }
    }
}

impl BuilderConfig {
    /// Create a configuration for `dialect` with defaults.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Set the `VARCHAR(n)` length used by type mapping.
    pub fn with_varchar_length(mut self, len: u32) -> Self {
        self.varchar_length = len;
        self
    }

    /// Enable statement logging.
    pub fn enable_sql_log(mut self) -> Self {
        self.log_sql = true;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }

    /// Allow UPDATE/DELETE without conditions.
    ///
    /// Individual builders can still opt in with `allow_full(true)`.
    pub fn allow_full_mutation(mut self, allow: bool) -> Self {
        self.allow_full_mutation = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BuilderConfig::default();
        assert_eq!(cfg.dialect, Dialect::Postgres);
        assert_eq!(cfg.varchar_length, 255);
        assert!(!cfg.log_sql);
        assert_eq!(cfg.max_sql_log_length, Some(200));
        assert!(!cfg.allow_full_mutation);
    }

    #[test]
    fn deserialize_partial() {
        let cfg: BuilderConfig =
            serde_json::from_str(r#"{"dialect": "mysql", "varchar_length": 64}"#).unwrap();
        assert_eq!(cfg.dialect, Dialect::Mysql);
        assert_eq!(cfg.varchar_length, 64);
        assert_eq!(cfg.max_sql_log_length, Some(200));
    }

    #[test]
    fn deserialize_rejects_unknown_dialect() {
        let err = serde_json::from_str::<BuilderConfig>(r#"{"dialect": "db2"}"#).unwrap_err();
        assert!(err.to_string().contains("db2"));
    }
}
