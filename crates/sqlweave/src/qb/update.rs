//! UPDATE query builder.

use super::{Filter, QueryBuilder};
use crate::condition::ConditionInput;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::params::NamedParams;
use crate::query::QueryPlan;
use crate::row::Row;
use crate::value::SqlValue;

/// UPDATE query builder.
///
/// Each assigned column binds a parameter named `set_{column}`.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    sets: Row,
    filter: Filter,
    allow_full: bool,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Row::new(),
            filter: Filter::default(),
            allow_full: false,
        }
    }

    /// Assign a column value.
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.sets.insert(column, value);
        self
    }

    /// Assign every column of `row`.
    pub fn set_row(mut self, row: Row) -> Self {
        for (column, value) in row {
            self.sets.insert(column, value);
        }
        self
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

    /// Allow an UPDATE without conditions.
    pub fn allow_full(mut self, allow: bool) -> Self {
        self.allow_full = allow;
        self
    }

    fn render(&self, qb: &QueryBuilder) -> WeaveResult<(String, NamedParams)> {
        let dialect = qb.dialect();
        let table = Ident::parse(&self.table)?;
        if self.sets.is_empty() {
            return Err(WeaveError::EmptyInput("UPDATE has no columns to set".into()));
        }
        if self.filter.is_empty() && !(self.allow_full || qb.config().allow_full_mutation) {
            return Err(WeaveError::UnsafeMutation(format!(
                "UPDATE {table} without conditions; set allow_full(true) if intended"
            )));
        }

        let mut params = NamedParams::new();
        let mut assignments = Vec::with_capacity(self.sets.len());
        for (column, value) in self.sets.iter() {
            let column = Ident::parse(column)?;
            let name = format!("set_{column}");
            assignments.push(format!("{} = :{name}", column.quoted(dialect)));
            params.insert(name, value.clone());
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            table.quoted(dialect),
            assignments.join(", ")
        );
        if let Some(clause) = self.filter.render_into(qb, &mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        Ok((sql, params))
    }

    /// Validate, render and adapt the statement for the session dialect.
    pub fn build(&self, qb: &QueryBuilder) -> WeaveResult<QueryPlan> {
        let (sql, params) = self.render(qb)?;
        qb.finish("update", sql, params)
    }
}
