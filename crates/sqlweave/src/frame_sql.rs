//! Per-row statement generation from tabular data.
//!
//! Columns are given as [`ColumnSpec`]s. Plain columns are projected; filter
//! columns are projected too and contribute one condition per row, built from
//! that row's value. Conditions are always structured, never interpolated
//! into text.

use crate::coerce::{Frame, cast_frame};
use crate::condition::{Condition, Op};
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::{self, QueryBuilder};
use crate::query::QueryPlan;
use crate::row::Row;
use crate::value::SqlValue;
use std::str::FromStr;

/// A projected column, optionally filtered with an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpec {
    Plain(Ident),
    Filter(Ident, Op),
}

impl ColumnSpec {
    pub fn name(&self) -> &Ident {
        match self {
            ColumnSpec::Plain(c) | ColumnSpec::Filter(c, _) => c,
        }
    }

    /// A filter column from a name and operator text.
    pub fn filter(column: &str, op: &str) -> WeaveResult<Self> {
        Ok(ColumnSpec::Filter(Ident::parse(column)?, op.parse()?))
    }
}

impl FromStr for ColumnSpec {
    type Err = WeaveError;

    /// `"name"` is a plain column; `"name op?"` filters with `op`, and
    /// `"name?"` filters with `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_suffix('?') {
            None => Ok(ColumnSpec::Plain(Ident::parse(s)?)),
            Some(head) => {
                let head = head.trim();
                let split = head
                    .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
                    .unwrap_or(head.len());
                let (name, op) = head.split_at(split);
                let op = op.trim();
                ColumnSpec::filter(name, if op.is_empty() { "=" } else { op })
            }
        }
    }
}

/// Statement kinds [`frame_sql`] can emit per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOp {
    Select,
    Update,
    Insert,
    Upsert,
    Delete,
}

impl FromStr for FrameOp {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(FrameOp::Select),
            "update" => Ok(FrameOp::Update),
            "insert" => Ok(FrameOp::Insert),
            "upsert" => Ok(FrameOp::Upsert),
            "delete" => Ok(FrameOp::Delete),
            other => Err(WeaveError::InvalidOperator(format!("statement kind {other:?}"))),
        }
    }
}

/// Options for [`frame_sql`].
#[derive(Debug, Clone)]
pub struct FrameSqlOptions {
    /// Index expression combining the filter conditions.
    pub expression: Option<String>,
    /// Upsert keys; the projected columns when empty.
    pub primary_keys: Vec<String>,
    /// Emit an upsert instead of update + insert when `Upsert` is requested.
    pub use_upsert: bool,
    pub ops: Vec<FrameOp>,
}

impl Default for FrameSqlOptions {
    fn default() -> Self {
        Self {
            expression: None,
            primary_keys: Vec::new(),
            use_upsert: false,
            ops: vec![FrameOp::Select, FrameOp::Update, FrameOp::Insert, FrameOp::Delete],
        }
    }
}

impl FrameSqlOptions {
    pub fn ops<I: IntoIterator<Item = FrameOp>>(mut self, ops: I) -> Self {
        self.ops = ops.into_iter().collect();
        self
    }

    pub fn expression(mut self, expr: impl Into<String>) -> Self {
        self.expression = Some(expr.into());
        self
    }

    pub fn upsert<I, S>(mut self, primary_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_upsert = true;
        self.primary_keys = primary_keys.into_iter().map(Into::into).collect();
        self
    }

    fn wants(&self, op: FrameOp) -> bool {
        self.ops.contains(&op)
    }
}

/// Generate statements for every row of `frame`.
///
/// Text columns are type-inferred first. When `Insert` is requested without
/// upsert, the result is a single group holding the bulk insert (batched
/// where the dialect requires). Otherwise there is one group per row, in
/// the order select, upsert or update + insert, delete.
pub fn frame_sql(
    frame: Frame,
    table: &str,
    columns: &[ColumnSpec],
    opts: &FrameSqlOptions,
    session: &QueryBuilder,
) -> WeaveResult<Vec<Vec<QueryPlan>>> {
    if frame.is_empty() {
        return Ok(Vec::new());
    }
    let frame = cast_frame(frame).frame;
    let proj: Vec<&str> = columns.iter().map(|c| c.name().as_str()).collect();
    let rows = frame.to_rows();

    if opts.wants(FrameOp::Insert) && !opts.use_upsert {
        let projected = rows.iter().map(|r| project(r, &proj));
        return Ok(vec![session.insert_bulk(table, projected)?]);
    }

    let keys: Vec<String> = if opts.primary_keys.is_empty() {
        proj.iter().map(|c| c.to_string()).collect()
    } else {
        opts.primary_keys.clone()
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let conds = row_conditions(row, columns)?;
        let data = project(row, &proj);
        let mut group = Vec::new();

        if opts.wants(FrameOp::Select) {
            let mut q = qb::select(table).columns(proj.iter().copied()).filters(conds.clone());
            if let Some(expr) = &opts.expression {
                q = q.expression(expr.clone());
            }
            group.push(q.build(session)?);
        }
        if opts.use_upsert && opts.wants(FrameOp::Upsert) {
            group.push(qb::upsert(table, keys.iter().cloned()).row(row.clone()).build(session)?);
        } else {
            if opts.wants(FrameOp::Update) {
                let mut q = qb::update(table).set_row(data).filters(conds.clone());
                if let Some(expr) = &opts.expression {
                    q = q.expression(expr.clone());
                }
                group.push(q.build(session)?);
            }
            if opts.wants(FrameOp::Insert) {
                group.push(qb::insert(table).row(row.clone()).build(session)?);
            }
        }
        if opts.wants(FrameOp::Delete) {
            let mut q = qb::delete(table).filters(conds);
            if let Some(expr) = &opts.expression {
                q = q.expression(expr.clone());
            }
            group.push(q.build(session)?);
        }
        out.push(group);
    }
    Ok(out)
}

fn project(row: &Row, columns: &[&str]) -> Row {
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.to_string(), v.clone())))
        .collect()
}

fn row_conditions(row: &Row, columns: &[ColumnSpec]) -> WeaveResult<Vec<Condition>> {
    columns
        .iter()
        .filter_map(|c| match c {
            ColumnSpec::Plain(_) => None,
            ColumnSpec::Filter(col, op) => Some((col, *op)),
        })
        .map(|(col, op)| {
            if op.is_null_test() {
                return Condition::new(col, op, Vec::<SqlValue>::new());
            }
            // `col = NULL` never matches; null equality becomes a null test.
            match (row.get(col.as_str()), op) {
                (Some(SqlValue::Null) | None, Op::Eq) => Condition::is_null(col),
                (Some(SqlValue::Null) | None, Op::Ne | Op::NotEqual) => Condition::is_not_null(col),
                (Some(SqlValue::Null) | None, _) => Err(WeaveError::missing([col.as_str()])),
                (Some(value), _) => Condition::single(col, op, value.clone()),
            }
        })
        .collect()
}
