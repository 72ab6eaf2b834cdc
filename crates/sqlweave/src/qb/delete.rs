//! DELETE query builder.

use super::{Filter, QueryBuilder};
use crate::condition::ConditionInput;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::params::NamedParams;
use crate::query::QueryPlan;

/// DELETE query builder.
///
/// Without conditions the build fails with `UnsafeMutation` unless
/// `allow_full(true)` is set here or in the session config.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    filter: Filter,
    allow_full: bool,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filter: Filter::default(),
            allow_full: false,
        }
    }

    /// Add a WHERE condition.
    pub fn filter(mut self, cond: impl Into<ConditionInput>) -> Self {
        self.filter.push(cond.into());
        self
    }

    /// Add several WHERE conditions.
    pub fn filters<I, C>(mut self, conds: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ConditionInput>,
    {
        for c in conds {
            self.filter.push(c.into());
        }
        self
    }

    /// Combine WHERE conditions with an index expression.
    pub fn expression(mut self, expr: impl Into<String>) -> Self {
        self.filter.expression = Some(expr.into());
        self
    }

    /// Allow deleting all rows.
    pub fn allow_full(mut self, allow: bool) -> Self {
        self.allow_full = allow;
        self
    }

    /// Validate, render and adapt the statement for the session dialect.
    pub fn build(&self, qb: &QueryBuilder) -> WeaveResult<QueryPlan> {
        let dialect = qb.dialect();
        let table = Ident::parse(&self.table)?;
        if self.filter.is_empty() && !(self.allow_full || qb.config().allow_full_mutation) {
            return Err(WeaveError::UnsafeMutation(format!(
                "DELETE FROM {table} without conditions; set allow_full(true) if intended"
            )));
        }

        let mut sql = format!("DELETE FROM {}", table.quoted(dialect));
        let mut params = NamedParams::new();
        if let Some(clause) = self.filter.render_into(qb, &mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        qb.finish("delete", sql, params)
    }
}
