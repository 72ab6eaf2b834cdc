//! DDL: CREATE TABLE and ALTER TABLE column changes.

use super::QueryBuilder;
use crate::coerce::{Frame, infer_column_types};
use crate::dialect::{Dialect, SemanticType};
use crate::error::{WeaveError, WeaveResult};
use crate::ident::{Ident, parse_all};
use crate::params::NamedParams;
use crate::query::QueryPlan;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn sql_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]*(\(\s*\d+\s*(,\s*\d+\s*)?\))?$")
            .expect("invalid built-in SQL type regex")
    })
}

/// Check a declared type such as `VARCHAR(50)` or `DOUBLE PRECISION`.
pub fn validate_sql_type(sql_type: &str) -> WeaveResult<&str> {
    let trimmed = sql_type.trim();
    if sql_type_re().is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(WeaveError::InvalidType(sql_type.to_string()))
    }
}

/// Foreign-key ON DELETE / ON UPDATE action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ReferentialAction {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "SET DEFAULT" => Ok(Self::SetDefault),
            "RESTRICT" => Ok(Self::Restrict),
            "NO ACTION" => Ok(Self::NoAction),
            _ => Err(WeaveError::InvalidOperator(format!("referential action {s:?}"))),
        }
    }
}

impl<'de> Deserialize<'de> for ReferentialAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn default_ref_column() -> String {
    "id".to_string()
}

/// `FOREIGN KEY (column) REFERENCES ref_table (ref_column)`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    #[serde(default = "default_ref_column")]
    pub ref_column: String,
    #[serde(default)]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default)]
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    /// Reference `ref_table.id`.
    pub fn new(column: &str, ref_table: &str) -> Self {
        Self {
            column: column.to_string(),
            ref_table: ref_table.to_string(),
            ref_column: default_ref_column(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn ref_column(mut self, column: &str) -> Self {
        self.ref_column = column.to_string();
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    fn render(&self, dialect: Dialect) -> WeaveResult<String> {
        let column = Ident::parse(&self.column)?;
        let ref_table = Ident::parse(&self.ref_table)?;
        let ref_column = Ident::parse(&self.ref_column)?;
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            column.quoted(dialect),
            ref_table.quoted(dialect),
            ref_column.quoted(dialect)
        );
        if let Some(action) = self.on_delete {
            sql.push_str(&format!(" ON DELETE {action}"));
        }
        if let Some(action) = self.on_update {
            sql.push_str(&format!(" ON UPDATE {action}"));
        }
        Ok(sql)
    }
}

/// A column's type: spelled out, or mapped from a semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Declared(String),
    Semantic(SemanticType),
}

/// CREATE TABLE builder.
#[derive(Debug, Clone)]
pub struct CreateTableQb {
    name: String,
    columns: Vec<(String, ColumnType)>,
    primary_keys: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
    if_not_exists: bool,
}

impl CreateTableQb {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            if_not_exists: true,
        }
    }

    /// Add a column with an explicit SQL type.
    pub fn column(mut self, name: &str, sql_type: &str) -> Self {
        self.columns
            .push((name.to_string(), ColumnType::Declared(sql_type.to_string())));
        self
    }

    /// Add a column whose type is mapped from `ty` for the session dialect.
    pub fn semantic_column(mut self, name: &str, ty: SemanticType) -> Self {
        self.columns.push((name.to_string(), ColumnType::Semantic(ty)));
        self
    }

    /// Add one column per frame series, typed by inference over its values.
    pub fn columns_from_frame(mut self, frame: &Frame) -> Self {
        for (name, ty) in infer_column_types(frame) {
            self.columns.push((name, ColumnType::Semantic(ty)));
        }
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Emit `IF NOT EXISTS` (default true; never emitted for Oracle).
    pub fn if_not_exists(mut self, yes: bool) -> Self {
        self.if_not_exists = yes;
        self
    }

    pub fn build(&self, qb: &QueryBuilder) -> WeaveResult<QueryPlan> {
        let dialect = qb.dialect();
        let name = Ident::parse(&self.name)?;
        if self.columns.is_empty() {
            return Err(WeaveError::EmptyInput(format!("table {name} has no columns")));
        }

        let mut lines = Vec::with_capacity(self.columns.len() + 1 + self.foreign_keys.len());
        for (column, ty) in &self.columns {
            let column = Ident::parse(column)?;
            let ty = match ty {
                ColumnType::Declared(t) => validate_sql_type(t)?.to_string(),
                ColumnType::Semantic(t) => dialect.sql_type(*t, qb.config().varchar_length),
            };
            lines.push(format!("{} {ty}", column.quoted(dialect)));
        }
        if !self.primary_keys.is_empty() {
            let pk = parse_all(&self.primary_keys)?
                .iter()
                .map(|k| k.quoted(dialect))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("PRIMARY KEY ({pk})"));
        }
        for fk in &self.foreign_keys {
            lines.push(fk.render(dialect)?);
        }

        let ine = if self.if_not_exists && dialect.profile().create_if_not_exists {
            "IF NOT EXISTS "
        } else {
            ""
        };
        let sql = format!(
            "CREATE TABLE {ine}{} (\n  {}\n)",
            name.quoted(dialect),
            lines.join(",\n  ")
        );
        qb.finish("create_table", sql, NamedParams::new())
    }
}

/// Add a column (`forced = false`) or change its type (`forced = true`).
///
/// Only PostgreSQL gets an `IF NOT EXISTS` guard on the add; MySQL rejects
/// that form, so there and in the remaining dialects adding an existing
/// column fails at execution.
///
/// SQLite cannot change a column type in place and fails with
/// `UnsupportedDialect` when `forced` is set.
pub fn alter_column(
    qb: &QueryBuilder,
    table: &str,
    column: &str,
    sql_type: &str,
    forced: bool,
) -> WeaveResult<QueryPlan> {
    let dialect = qb.dialect();
    let t = Ident::parse(table)?.quoted(dialect);
    let c = Ident::parse(column)?.quoted(dialect);
    let ty = validate_sql_type(sql_type)?;

    let sql = match (dialect, forced) {
        (Dialect::Postgres, true) => {
            format!("ALTER TABLE {t} ALTER COLUMN {c} TYPE {ty} USING {c}::{ty}")
        }
        (Dialect::Postgres, false) => format!("ALTER TABLE {t} ADD COLUMN IF NOT EXISTS {c} {ty}"),
        (Dialect::Oracle, true) => format!("ALTER TABLE {t} MODIFY {c} {ty}"),
        (Dialect::Oracle, false) => format!("ALTER TABLE {t} ADD ({c} {ty})"),
        (Dialect::Mysql, true) => format!("ALTER TABLE {t} MODIFY COLUMN {c} {ty}"),
        (Dialect::Mysql, false) => format!("ALTER TABLE {t} ADD COLUMN {c} {ty}"),
        (Dialect::Mssql, true) => format!("ALTER TABLE {t} ALTER COLUMN {c} {ty}"),
        (Dialect::Mssql, false) => format!("ALTER TABLE {t} ADD {c} {ty}"),
        (Dialect::Sqlite, true) => {
            return Err(WeaveError::unsupported(
                "sqlite cannot change a column type in place",
            ));
        }
        (Dialect::Sqlite, false) => format!("ALTER TABLE {t} ADD COLUMN {c} {ty}"),
    };
    qb.finish("alter_column", sql, NamedParams::new())
}
