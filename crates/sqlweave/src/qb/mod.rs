//! Statement builders for every supported dialect.
//!
//! A [`QueryBuilder`] is the session: it carries the target dialect, the
//! [`BuilderConfig`] and the [`IdSequence`] used to name condition
//! parameters. Statement builders are plain consuming builders that only
//! collect input; `build(&session)` validates every identifier, renders the
//! statement with canonical `:name` placeholders and returns a plan already
//! adapted to the session dialect.
//!
//! # Usage
//!
//! ```
//! use sqlweave::qb::{self, QueryBuilder};
//! use sqlweave::Dialect;
//!
//! let session = QueryBuilder::new(Dialect::Postgres);
//! let plan = qb::select("users")
//!     .columns(["id", "name"])
//!     .filter("age > 30")
//!     .order_by("name", "asc")
//!     .limit(10)
//!     .build(&session)?;
//! assert!(plan.sql.starts_with(r#"SELECT "id", "name" FROM "users" WHERE "age" > %(age_"#));
//! # Ok::<(), sqlweave::WeaveError>(())
//! ```

mod delete;
mod insert;
mod select;
mod table;
mod update;
mod upsert;

pub use delete::DeleteQb;
pub use insert::{InsertQb, MSSQL_MAX_ROWS};
pub use select::SelectQb;
pub use table::{ColumnType, CreateTableQb, ForeignKey, ReferentialAction, alter_column};
pub use update::UpdateQb;
pub use upsert::{ConflictAction, UpsertQb};

use crate::adapt::adapt;
use crate::condition::{ConditionInput, Fragment, IdSequence, compile, compile_into, normalize};
use crate::config::BuilderConfig;
use crate::dialect::Dialect;
use crate::error::WeaveResult;
use crate::params::NamedParams;
use crate::query::QueryPlan;
use crate::row::Row;
use std::sync::Arc;

/// A builder session bound to one dialect.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: BuilderConfig,
    ids: Arc<IdSequence>,
}

impl QueryBuilder {
    /// Create a session for `dialect` with default configuration.
    pub fn new(dialect: Dialect) -> Self {
        Self::with_config(BuilderConfig::new(dialect))
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            ids: Arc::new(IdSequence::new()),
        }
    }

    /// Share an id sequence with other sessions.
    pub fn with_ids(mut self, ids: Arc<IdSequence>) -> Self {
        self.ids = ids;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn ids(&self) -> &IdSequence {
        &self.ids
    }

    /// Normalize and compile conditions for this session.
    pub fn compile_conditions(
        &self,
        conditions: &[ConditionInput],
        expression: Option<&str>,
    ) -> WeaveResult<Option<Fragment>> {
        let conditions = normalize(conditions.iter().cloned())?;
        compile(&conditions, expression, self.dialect(), &self.ids)
    }

    /// Normalize and compile conditions, binding into the statement's `params`.
    pub fn compile_conditions_into(
        &self,
        conditions: &[ConditionInput],
        expression: Option<&str>,
        params: &mut NamedParams,
    ) -> WeaveResult<Option<String>> {
        let conditions = normalize(conditions.iter().cloned())?;
        compile_into(&conditions, expression, self.dialect(), &self.ids, params)
    }

    /// Build `INSERT` statements for `rows`, one per batch.
    pub fn insert_bulk<I>(&self, table: &str, rows: I) -> WeaveResult<Vec<QueryPlan>>
    where
        I: IntoIterator<Item = Row>,
    {
        insert(table).rows(rows).build_batches(self)
    }

    /// Adapt canonical SQL to the session dialect and log it.
    pub(crate) fn finish(
        &self,
        kind: &'static str,
        sql: String,
        params: NamedParams,
    ) -> WeaveResult<QueryPlan> {
        let plan = adapt(&sql, params, self.dialect())?;
        if self.config.log_sql {
            tracing::debug!(
                target: "sqlweave.sql",
                dialect = %self.dialect(),
                kind,
                params = plan.params.len(),
                sql = %self.truncate_sql(&plan.sql),
                "built statement"
            );
        }
        Ok(plan)
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.config.max_sql_log_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// WHERE-clause input shared by SELECT, UPDATE and DELETE.
#[derive(Debug, Clone, Default)]
pub(crate) struct Filter {
    conditions: Vec<ConditionInput>,
    expression: Option<String>,
}

impl Filter {
    fn push(&mut self, cond: ConditionInput) {
        self.conditions.push(cond);
    }

    fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn render_into(
        &self,
        qb: &QueryBuilder,
        params: &mut NamedParams,
    ) -> WeaveResult<Option<String>> {
        qb.compile_conditions_into(&self.conditions, self.expression.as_deref(), params)
    }
}

/// Create a SELECT query builder for the given table.
pub fn select(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// # Safety
/// DELETE without conditions is refused with `UnsafeMutation` unless
/// `allow_full(true)` is set on the builder or the session config.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

/// Create an insert-or-update builder keyed by `keys`.
pub fn upsert<I, S>(table: &str, keys: I) -> UpsertQb
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    UpsertQb::new(table, keys)
}

/// Create a CREATE TABLE builder.
pub fn create_table(name: &str) -> CreateTableQb {
    CreateTableQb::new(name)
}
