//! Query conditions for WHERE and HAVING clauses.
//!
//! A [`Condition`] is a validated `field OPERATOR values` triple with an
//! optional aggregate. Conditions come from three input shapes, unified by
//! [`ConditionInput`]:
//!
//! - a structured record `{"field", "operator", "value"?, "aggregate"?}`
//! - free text such as `age > 30` or `name IN ('a', 'b')`
//! - a positional tuple `(field, operator, values)`
//!
//! [`compile`] turns a list of conditions into a SQL fragment with named
//! parameters `{field}_{id}[_suffix]`, drawing ids from an [`IdSequence`].
//!
//! # Example
//! ```
//! use sqlweave::condition::{compile, Condition, IdSequence};
//! use sqlweave::Dialect;
//!
//! let ids = IdSequence::new();
//! let cond = Condition::from_text("age > 30")?;
//! let frag = compile(&[cond], None, Dialect::Postgres, &ids)?.unwrap();
//! assert_eq!(frag.sql, r#""age" > :age_1"#);
//! # Ok::<(), sqlweave::WeaveError>(())
//! ```

mod compile;
mod lexer;
mod parse;

pub use compile::{Fragment, compile, compile_into, compile_one};

use crate::error::{WeaveError, WeaveResult};
use crate::ident::{Ident, IntoIdent};
use crate::value::SqlValue;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Condition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    NotEqual,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
    Like,
    Ilike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

impl Op {
    pub const ALL: [Op; 14] = [
        Op::Eq,
        Op::Ne,
        Op::NotEqual,
        Op::Lt,
        Op::Gt,
        Op::Lte,
        Op::Gte,
        Op::Like,
        Op::Ilike,
        Op::In,
        Op::NotIn,
        Op::Between,
        Op::IsNull,
        Op::IsNotNull,
    ];

    /// The SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::NotEqual => "<>",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Lte => "<=",
            Op::Gte => ">=",
            Op::Like => "LIKE",
            Op::Ilike => "ILIKE",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Between => "BETWEEN",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }

    /// `= != <> < > <= >=`
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Op::Eq | Op::Ne | Op::NotEqual | Op::Lt | Op::Gt | Op::Lte | Op::Gte
        )
    }

    pub fn is_null_test(self) -> bool {
        matches!(self, Op::IsNull | Op::IsNotNull)
    }

    /// Check that `n` values fit this operator.
    fn check_arity(self, n: usize) -> WeaveResult<()> {
        let ok = match self {
            Op::IsNull | Op::IsNotNull => true,
            Op::Between => n == 2,
            Op::In | Op::NotIn => n >= 1,
            _ => n == 1,
        };
        if ok {
            Ok(())
        } else {
            let expected = match self {
                Op::Between => "exactly 2",
                Op::In | Op::NotIn => "at least 1",
                _ => "exactly 1",
            };
            Err(WeaveError::InvalidArity {
                operator: self.as_sql().to_string(),
                expected,
                got: n,
            })
        }
    }
}

impl FromStr for Op {
    type Err = WeaveError;

    /// Parse an operator case-insensitively; inner whitespace is normalized so
    /// `"not  in"` is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        Op::ALL
            .into_iter()
            .find(|op| op.as_sql() == normalized)
            .ok_or_else(|| WeaveError::InvalidOperator(s.to_string()))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Aggregate applied to a condition's column (`HAVING SUM("x") > ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn as_sql(self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

impl FromStr for Aggregate {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Aggregate::Count),
            "SUM" => Ok(Aggregate::Sum),
            "AVG" => Ok(Aggregate::Avg),
            "MIN" => Ok(Aggregate::Min),
            "MAX" => Ok(Aggregate::Max),
            _ => Err(WeaveError::InvalidAggregate(s.to_string())),
        }
    }
}

/// A canonical condition: validated field, operator and values.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: Ident,
    op: Op,
    values: Vec<SqlValue>,
    aggregate: Option<Aggregate>,
}

impl Condition {
    /// Create a condition, validating the field and the value count.
    ///
    /// Values given to a null test are dropped.
    pub fn new(
        field: impl IntoIdent,
        op: Op,
        values: impl IntoIterator<Item = impl Into<SqlValue>>,
    ) -> WeaveResult<Self> {
        let field = field.into_ident()?;
        let mut values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        if op.is_null_test() {
            values.clear();
        }
        op.check_arity(values.len())?;
        Ok(Self {
            field,
            op,
            values,
            aggregate: None,
        })
    }

    /// Create a condition with a single value.
    pub fn single(field: impl IntoIdent, op: Op, value: impl Into<SqlValue>) -> WeaveResult<Self> {
        Self::new(field, op, [value.into()])
    }

    /// `field IS NULL`
    pub fn is_null(field: impl IntoIdent) -> WeaveResult<Self> {
        Self::new(field, Op::IsNull, Vec::<SqlValue>::new())
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(field: impl IntoIdent) -> WeaveResult<Self> {
        Self::new(field, Op::IsNotNull, Vec::<SqlValue>::new())
    }

    /// Parse free text such as `age > 30`.
    pub fn from_text(text: &str) -> WeaveResult<Self> {
        parse::parse_condition(text)
    }

    /// Wrap the column reference in an aggregate.
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn field(&self) -> &Ident {
        &self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        self.aggregate
    }
}

/// Values of a positional tuple condition.
#[derive(Debug, Clone, PartialEq)]
pub enum TupleValues {
    /// Comma-separated text, split and trimmed (not coerced).
    Text(String),
    List(Vec<SqlValue>),
}

impl TupleValues {
    fn into_values(self) -> Vec<SqlValue> {
        match self {
            TupleValues::Text(s) => s
                .split(',')
                .map(|part| SqlValue::Text(part.trim().to_string()))
                .collect(),
            TupleValues::List(v) => v,
        }
    }
}

impl<'de> Deserialize<'de> for TupleValues {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => TupleValues::Text(s),
            serde_json::Value::Array(items) => {
                TupleValues::List(items.into_iter().map(SqlValue::from).collect())
            }
            scalar => TupleValues::List(vec![SqlValue::from(scalar)]),
        })
    }
}

/// Structured condition record as found in JSON payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionRecord {
    pub field: String,
    pub operator: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub value: Vec<SqlValue>,
    #[serde(default)]
    pub aggregate: Option<String>,
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<SqlValue>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items.into_iter().map(SqlValue::from).collect(),
        scalar => vec![SqlValue::from(scalar)],
    })
}

/// Any accepted condition input shape.
#[derive(Debug, Clone)]
pub enum ConditionInput {
    Record(ConditionRecord),
    Text(String),
    Tuple(String, String, TupleValues),
    Prebuilt(Condition),
}

impl ConditionInput {
    /// Normalize into a canonical [`Condition`].
    pub fn into_condition(self) -> WeaveResult<Condition> {
        match self {
            ConditionInput::Record(r) => {
                let op: Op = r.operator.parse()?;
                let cond = Condition::new(r.field, op, r.value)?;
                match r.aggregate {
                    Some(agg) => Ok(cond.with_aggregate(agg.parse()?)),
                    None => Ok(cond),
                }
            }
            ConditionInput::Text(text) => Condition::from_text(&text),
            ConditionInput::Tuple(field, op, values) => {
                Condition::new(field, op.parse()?, values.into_values())
            }
            ConditionInput::Prebuilt(c) => Ok(c),
        }
    }
}

/// Normalize a list of inputs, failing on the first bad one.
pub fn normalize<I>(inputs: I) -> WeaveResult<Vec<Condition>>
where
    I: IntoIterator<Item = ConditionInput>,
{
    inputs.into_iter().map(ConditionInput::into_condition).collect()
}

impl From<Condition> for ConditionInput {
    fn from(c: Condition) -> Self {
        ConditionInput::Prebuilt(c)
    }
}

impl From<&str> for ConditionInput {
    fn from(s: &str) -> Self {
        ConditionInput::Text(s.to_string())
    }
}

impl From<String> for ConditionInput {
    fn from(s: String) -> Self {
        ConditionInput::Text(s)
    }
}

impl From<ConditionRecord> for ConditionInput {
    fn from(r: ConditionRecord) -> Self {
        ConditionInput::Record(r)
    }
}

impl<F: Into<String>, O: Into<String>> From<(F, O, TupleValues)> for ConditionInput {
    fn from((field, op, values): (F, O, TupleValues)) -> Self {
        ConditionInput::Tuple(field.into(), op.into(), values)
    }
}

// Tuple is tried first: a derived struct also accepts a JSON array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawInput {
    Tuple(String, String, TupleValues),
    Text(String),
    Record(ConditionRecord),
}

impl<'de> Deserialize<'de> for ConditionInput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawInput::deserialize(deserializer)? {
            RawInput::Tuple(f, o, v) => ConditionInput::Tuple(f, o, v),
            RawInput::Text(s) => ConditionInput::Text(s),
            RawInput::Record(r) => ConditionInput::Record(r),
        })
    }
}

/// Monotonic source of condition instance ids.
///
/// Every compiled condition draws one id, so two conditions on the same field
/// never produce the same parameter name. The sequence is atomic and can be
/// shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct IdSequence(AtomicU64);

impl IdSequence {
    /// A sequence starting at 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self(AtomicU64::new(first))
    }

    /// Draw the next id.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
