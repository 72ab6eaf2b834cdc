//! INSERT query builder (single and multi-row).

use super::QueryBuilder;
use crate::dialect::Dialect;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::{Ident, parse_all};
use crate::params::NamedParams;
use crate::query::QueryPlan;
use crate::row::Row;
use crate::value::SqlValue;

/// SQL Server accepts at most this many row constructors per `VALUES` list.
pub const MSSQL_MAX_ROWS: usize = 1000;

/// INSERT query builder.
///
/// The column set is taken from the first row; later rows missing a column
/// bind `NULL` for it and extra keys are ignored. Each cell gets its own
/// parameter named `{column}_{row_index}`.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    rows: Vec<Row>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows: Vec::new(),
        }
    }

    /// Add one row.
    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Add several rows.
    pub fn rows<I: IntoIterator<Item = Row>>(mut self, rows: I) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Set a column value on the first row (creating it if needed).
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        if self.rows.is_empty() {
            self.rows.push(Row::new());
        }
        self.rows[0].insert(column, value);
        self
    }

    /// Number of rows collected so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn validate(&self) -> WeaveResult<(Ident, Vec<Ident>)> {
        let table = Ident::parse(&self.table)?;
        let first = self
            .rows
            .first()
            .ok_or_else(|| WeaveError::EmptyInput("no rows provided for insert".into()))?;
        if first.is_empty() {
            return Err(WeaveError::EmptyInput("insert row has no columns".into()));
        }
        let columns = parse_all(first.columns())?;
        Ok((table, columns))
    }

    /// Render the given slice of rows; `start` is the index of its first row.
    fn render_rows(
        &self,
        dialect: Dialect,
        table: &Ident,
        columns: &[Ident],
        start: usize,
        rows: &[Row],
    ) -> (String, NamedParams) {
        let col_list = columns
            .iter()
            .map(|c| c.quoted(dialect))
            .collect::<Vec<_>>()
            .join(", ");
        let mut params = NamedParams::new();
        let mut tuples = Vec::with_capacity(rows.len());

        for (offset, row) in rows.iter().enumerate() {
            let idx = start + offset;
            let marks: Vec<String> = columns
                .iter()
                .map(|c| {
                    let name = format!("{c}_{idx}");
                    let value = row.get(c.as_str()).cloned().unwrap_or(SqlValue::Null);
                    let mark = format!(":{name}");
                    params.insert(name, value);
                    mark
                })
                .collect();
            tuples.push(format!("({})", marks.join(", ")));
        }

        let table = table.quoted(dialect);
        let sql = match dialect {
            Dialect::Oracle => {
                let into: Vec<String> = tuples
                    .iter()
                    .map(|t| format!("INTO {table} ({col_list}) VALUES {t}"))
                    .collect();
                format!("INSERT ALL\n{}\nSELECT * FROM DUAL", into.join(" "))
            }
            Dialect::Mssql | Dialect::Mysql | Dialect::Postgres | Dialect::Sqlite => {
                format!("INSERT INTO {table} ({col_list}) VALUES {}", tuples.join(", "))
            }
        };
        (sql, params)
    }

    /// Build every statement needed for the collected rows.
    ///
    /// This is a single statement for every dialect except SQL Server, where
    /// rows are split into batches of [`MSSQL_MAX_ROWS`].
    pub fn build_batches(&self, qb: &QueryBuilder) -> WeaveResult<Vec<QueryPlan>> {
        let (table, columns) = self.validate()?;
        let dialect = qb.dialect();
        let batch = match dialect {
            Dialect::Mssql => MSSQL_MAX_ROWS,
            _ => self.rows.len(),
        };

        let mut plans = Vec::new();
        for (n, chunk) in self.rows.chunks(batch).enumerate() {
            let (sql, params) = self.render_rows(dialect, &table, &columns, n * batch, chunk);
            plans.push(qb.finish("insert", sql, params)?);
        }
        Ok(plans)
    }

    /// Build a single statement.
    ///
    /// Fails with `UnsupportedDialect` when SQL Server would need more than one
    /// batch; use [`build_batches`](Self::build_batches) for large inputs.
    pub fn build(&self, qb: &QueryBuilder) -> WeaveResult<QueryPlan> {
        if qb.dialect() == Dialect::Mssql && self.rows.len() > MSSQL_MAX_ROWS {
            return Err(WeaveError::unsupported(format!(
                "mssql accepts at most {MSSQL_MAX_ROWS} rows per INSERT, got {}",
                self.rows.len()
            )));
        }
        let mut plans = self.build_batches(qb)?;
        plans
            .pop()
            .ok_or_else(|| WeaveError::EmptyInput("no rows provided for insert".into()))
    }
}
