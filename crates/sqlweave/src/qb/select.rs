//! SELECT query builder.

use super::{Filter, QueryBuilder};
use crate::condition::ConditionInput;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::{Ident, parse_all};
use crate::params::NamedParams;
use crate::query::QueryPlan;

/// SELECT query builder with WHERE, GROUP BY/HAVING, ORDER BY and paging.
#[derive(Clone, Debug)]
pub struct SelectQb {
    /// Table name
    table: String,
    /// SELECT columns (empty means `*`)
    columns: Vec<String>,
    /// WHERE conditions
    filter: Filter,
    /// GROUP BY columns
    group_by: Vec<String>,
    /// HAVING conditions (only rendered with GROUP BY)
    having: Filter,
    /// ORDER BY (column, direction)
    order_by: Vec<(String, String)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filter: Filter::default(),
            group_by: Vec::new(),
            having: Filter::default(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Set the selected columns (replaces any previous list).
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
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

    /// Combine WHERE conditions with an index expression such as `(1 OR 2) AND 3`.
    pub fn expression(mut self, expr: impl Into<String>) -> Self {
        self.filter.expression = Some(expr.into());
        self
    }

    /// Set GROUP BY columns.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a HAVING condition.
    ///
    /// HAVING is only rendered together with `group_by`; otherwise it is
    /// dropped with a warning.
    pub fn having(mut self, cond: impl Into<ConditionInput>) -> Self {
        self.having.push(cond.into());
        self
    }

    /// Combine HAVING conditions with an index expression.
    pub fn having_expression(mut self, expr: impl Into<String>) -> Self {
        self.having.expression = Some(expr.into());
        self
    }

    /// Add an ORDER BY column; `direction` must be `ASC` or `DESC`.
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.order_by.push((column.to_string(), direction.to_string()));
        self
    }

    /// Add an `ORDER BY column ASC` clause.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, "ASC")
    }

    /// Add an `ORDER BY column DESC` clause.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, "DESC")
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Set LIMIT and OFFSET for page-based pagination (1-based page).
    pub fn page(self, page: u64, per_page: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit(per_page).offset(offset)
    }

    fn render(&self, qb: &QueryBuilder) -> WeaveResult<(String, NamedParams)> {
        let dialect = qb.dialect();
        let table = Ident::parse(&self.table)?;

        let cols = if self.columns.is_empty() {
            "*".to_string()
        } else {
            parse_all(&self.columns)?
                .iter()
                .map(|c| c.quoted(dialect))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {cols} FROM {}", table.quoted(dialect));
        let mut params = NamedParams::new();

        // WHERE
        if let Some(clause) = self.filter.render_into(qb, &mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        // GROUP BY / HAVING
        if !self.group_by.is_empty() {
            let groups: Vec<String> = parse_all(&self.group_by)?
                .iter()
                .map(|g| g.quoted(dialect))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));

            if let Some(clause) = self.having.render_into(qb, &mut params)? {
                sql.push_str(" HAVING ");
                sql.push_str(&clause);
            }
        } else if !self.having.is_empty() {
            tracing::warn!(
                target: "sqlweave.select",
                table = %table,
                "HAVING without GROUP BY is ignored"
            );
        }

        // ORDER BY
        if !self.order_by.is_empty() {
            let mut clauses = Vec::with_capacity(self.order_by.len());
            for (column, direction) in &self.order_by {
                let column = Ident::parse(column)?;
                let direction = direction.trim().to_ascii_uppercase();
                if direction != "ASC" && direction != "DESC" {
                    return Err(WeaveError::InvalidOperator(format!(
                        "order direction {direction:?}"
                    )));
                }
                clauses.push(format!("{} {direction}", column.quoted(dialect)));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&clauses.join(", "));
        }

        sql.push_str(&dialect.render_pagination(self.offset, self.limit));
        Ok((sql, params))
    }

    /// Validate, render and adapt the statement for the session dialect.
    pub fn build(&self, qb: &QueryBuilder) -> WeaveResult<QueryPlan> {
        let (sql, params) = self.render(qb)?;
        qb.finish("select", sql, params)
    }
}
