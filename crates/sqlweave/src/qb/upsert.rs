//! Insert-or-update builder.
//!
//! - postgres / sqlite: `INSERT ... ON CONFLICT (keys) DO UPDATE SET c = EXCLUDED.c`
//! - mysql: `INSERT ... ON DUPLICATE KEY UPDATE c = VALUES(c)`
//! - mssql: `MERGE INTO t T USING (VALUES (...)) S (cols) ON (...) WHEN MATCHED ... WHEN NOT MATCHED ...;`
//! - oracle: the same MERGE with `USING (SELECT ... FROM DUAL) S`
//!
//! Parameters are named after the columns themselves (`:id`, `:v`).

use super::QueryBuilder;
use crate::dialect::{Dialect, UpsertStrategy};
use crate::error::{WeaveError, WeaveResult};
use crate::ident::{Ident, parse_all};
use crate::params::NamedParams;
use crate::query::QueryPlan;
use crate::row::Row;
use crate::value::SqlValue;

/// What to do when a row with the same key already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictAction {
    /// Overwrite every non-key column.
    #[default]
    Update,
    /// Keep the existing row.
    Nothing,
}

/// Insert-or-update builder keyed by primary-key columns.
#[derive(Clone, Debug)]
pub struct UpsertQb {
    table: String,
    keys: Vec<String>,
    data: Row,
    action: ConflictAction,
}

impl UpsertQb {
    pub fn new<I, S>(table: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.to_string(),
            keys: keys.into_iter().map(Into::into).collect(),
            data: Row::new(),
            action: ConflictAction::default(),
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.data.insert(column, value);
        self
    }

    /// Set every column of `row`.
    pub fn row(mut self, row: Row) -> Self {
        for (column, value) in row {
            self.data.insert(column, value);
        }
        self
    }

    /// Choose the conflict action (default: update).
    pub fn on_conflict(mut self, action: ConflictAction) -> Self {
        self.action = action;
        self
    }

    /// Validate, render and adapt the statement for the session dialect.
    pub fn build(&self, qb: &QueryBuilder) -> WeaveResult<QueryPlan> {
        let dialect = qb.dialect();
        let table = Ident::parse(&self.table)?;
        if self.data.is_empty() {
            return Err(WeaveError::EmptyInput("upsert row has no columns".into()));
        }
        if self.keys.is_empty() {
            return Err(WeaveError::EmptyInput("upsert requires at least one key column".into()));
        }
        let columns = parse_all(self.data.columns())?;
        let keys = parse_all(&self.keys)?;

        let missing: Vec<&str> = keys
            .iter()
            .map(Ident::as_str)
            .filter(|k| !self.data.contains(k))
            .collect();
        if !missing.is_empty() {
            return Err(WeaveError::missing(missing));
        }

        tracing::warn!(
            target: "sqlweave.upsert",
            table = %table,
            keys = ?self.keys,
            "ensure key columns are unique; the upsert relies on a unique constraint"
        );

        let non_keys: Vec<&Ident> = columns.iter().filter(|c| !keys.contains(c)).collect();
        let q = |i: &Ident| i.quoted(dialect);
        let col_list = columns.iter().map(q).collect::<Vec<_>>().join(", ");
        let marks = columns
            .iter()
            .map(|c| format!(":{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let key_list = keys.iter().map(q).collect::<Vec<_>>().join(", ");
        let table_q = table.quoted(dialect);
        let update = self.action == ConflictAction::Update && !non_keys.is_empty();

        let sql = match dialect.upsert_strategy() {
            UpsertStrategy::OnConflict => {
                let tail = if update {
                    let sets = non_keys
                        .iter()
                        .map(|c| format!("{0} = EXCLUDED.{0}", q(c)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("DO UPDATE SET {sets}")
                } else {
                    "DO NOTHING".to_string()
                };
                format!(
                    "INSERT INTO {table_q} ({col_list}) VALUES ({marks}) ON CONFLICT ({key_list}) {tail}"
                )
            }
            UpsertStrategy::OnDuplicateKey => match self.action {
                ConflictAction::Nothing => {
                    format!("INSERT IGNORE INTO {table_q} ({col_list}) VALUES ({marks})")
                }
                ConflictAction::Update => {
                    let sets = if non_keys.is_empty() {
                        // Every column is a key: a no-op assignment keeps the row.
                        let k = q(&keys[0]);
                        format!("{k} = {k}")
                    } else {
                        non_keys
                            .iter()
                            .map(|c| format!("{0} = VALUES({0})", q(c)))
                            .collect::<Vec<_>>()
                            .join(", ")
                    };
                    format!(
                        "INSERT INTO {table_q} ({col_list}) VALUES ({marks}) ON DUPLICATE KEY UPDATE {sets}"
                    )
                }
            },
            UpsertStrategy::Merge => {
                let source = match dialect {
                    // Oracle has no table value constructor; a one-row SELECT
                    // from DUAL stands in for USING (VALUES ...).
                    Dialect::Oracle => {
                        let select = columns
                            .iter()
                            .map(|c| format!(":{c} {}", q(c)))
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("(SELECT {select} FROM DUAL) S")
                    }
                    _ => format!("(VALUES ({marks})) S ({col_list})"),
                };
                let on = keys
                    .iter()
                    .map(|k| format!("T.{0} = S.{0}", q(k)))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                let mut sql = format!("MERGE INTO {table_q} T USING {source} ON ({on})");
                if update {
                    let sets = non_keys
                        .iter()
                        .map(|c| format!("T.{0} = S.{0}", q(c)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" WHEN MATCHED THEN UPDATE SET {sets}"));
                }
                let s_vals = columns
                    .iter()
                    .map(|c| format!("S.{}", q(c)))
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!(
                    " WHEN NOT MATCHED THEN INSERT ({col_list}) VALUES ({s_vals})"
                ));
                if dialect == Dialect::Mssql {
                    sql.push(';');
                }
                sql
            }
        };

        let params: NamedParams = self
            .data
            .iter()
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect();
        qb.finish("upsert", sql, params)
    }
}
