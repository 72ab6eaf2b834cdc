//! Error types for sqlweave

use thiserror::Error;

/// Result type alias for sqlweave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Structural and validation errors raised while building SQL.
///
/// Every variant is raised before any SQL text is returned; a builder never
/// hands back a partially rendered statement.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Table/column name outside `[A-Za-z0-9_]+`
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Operator outside the supported set
    #[error("Invalid operator: {0:?}")]
    InvalidOperator(String),

    /// Aggregate function outside the supported set
    #[error("Invalid aggregate: {0:?}")]
    InvalidAggregate(String),

    /// Free-text condition that does not follow `IDENT OPERATOR value`
    #[error("Cannot parse condition at offset {offset} near {fragment:?}: {message}")]
    ConditionParse {
        fragment: String,
        offset: usize,
        message: String,
    },

    /// Value count that does not fit the operator (e.g. BETWEEN with one value)
    #[error("Operator {operator} expects {expected} value(s), got {got}")]
    InvalidArity {
        operator: String,
        expected: &'static str,
        got: usize,
    },

    /// Combination expression with bad characters or out-of-range indices
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// Payload is missing required keys
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),

    /// UPDATE/DELETE without conditions and without explicit override
    #[error("Unsafe mutation refused: {0}")]
    UnsafeMutation(String),

    /// Unknown dialect, or an operation the dialect cannot express
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// No rows/columns where at least one is required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Declared SQL type string that fails the type grammar
    #[error("Invalid SQL type: {0:?}")]
    InvalidType(String),

    /// Placeholder without a bound value
    #[error("No value bound for parameter {0:?}")]
    UnboundParameter(String),

    /// Two parameters with the same name in one statement
    #[error("Parameter {0:?} bound twice")]
    DuplicateParameter(String),

    /// Payload of the wrong shape
    #[error("Invalid payload: {0}")]
    Payload(String),

    /// Column metadata could not be obtained for a table
    #[error("Schema lookup failed for {table}: {message}")]
    Schema { table: String, message: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WeaveError {
    /// Create a condition parse error pointing at `offset` in `text`.
    pub fn parse(text: &str, offset: usize, message: impl Into<String>) -> Self {
        let fragment: String = text.get(offset..).unwrap_or("").chars().take(10).collect();
        Self::ConditionParse {
            fragment,
            offset,
            message: message.into(),
        }
    }

    /// Create a missing-field error from a list of keys.
    pub fn missing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingRequiredField(fields.into_iter().map(Into::into).collect())
    }

    /// Create an unsupported-dialect error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedDialect(message.into())
    }

    /// Create a payload shape error.
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload(message.into())
    }

    /// Create a schema lookup error for `table`.
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Check if this is an invalid identifier error
    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, Self::InvalidIdentifier(_))
    }

    /// Check if this is an unsafe mutation error
    pub fn is_unsafe_mutation(&self) -> bool {
        matches!(self, Self::UnsafeMutation(_))
    }

    /// Check if this is an unsupported dialect error
    pub fn is_unsupported_dialect(&self) -> bool {
        matches!(self, Self::UnsupportedDialect(_))
    }

    /// Check if this is a schema lookup error
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

/// A recovered, per-value coercion failure.
///
/// These never abort a batch: the value is nulled (or the column degraded to
/// text) and the warning is logged and returned to the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CoercionWarning {
    pub column: String,
    pub value: Option<String>,
    pub target: String,
    pub message: String,
}

impl CoercionWarning {
    pub fn new(
        column: impl Into<String>,
        value: Option<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let warning = Self {
            column: column.into(),
            value,
            target: target.into(),
            message: message.into(),
        };
        tracing::warn!(
            target: "sqlweave.coerce",
            column = %warning.column,
            value = ?warning.value,
            sql_type = %warning.target,
            "{}",
            warning.message
        );
        warning
    }
}
