//! Value-level conversions behind each [`Coercion`].

use super::temporal::{EpochUnit, from_epoch, parse_interval, parse_timestamp};
use crate::dialect::{Coercion, SemanticType};
use crate::value::{SqlValue, parse_bool_token};
use chrono::{NaiveTime, TimeDelta};

impl Coercion {
    /// Convert `value` to this coercion's target type.
    ///
    /// `Null` passes through. Returns `None` when the value cannot be
    /// represented; callers null it and record a warning.
    pub fn apply(self, value: &SqlValue) -> Option<SqlValue> {
        if value.is_null() {
            return Some(SqlValue::Null);
        }
        match self {
            Coercion::Text => value.to_text().map(SqlValue::Text),
            Coercion::Integer => to_int(value).map(SqlValue::Int),
            Coercion::Float32 => to_float(value).map(|f| SqlValue::Float(f64::from(f as f32))),
            Coercion::Float64 => to_float(value).map(SqlValue::Float),
            Coercion::Boolean => to_bool(value).map(SqlValue::Bool),
            Coercion::DateTime { day_first } => to_timestamp(value, day_first),
            Coercion::Interval => to_interval(value).map(SqlValue::Interval),
        }
    }

    /// The semantic type a column of this coercion holds.
    pub fn semantic_type(self) -> SemanticType {
        match self {
            Coercion::Text => SemanticType::String,
            Coercion::Integer => SemanticType::Integer,
            Coercion::Float32 | Coercion::Float64 => SemanticType::Float,
            Coercion::Boolean => SemanticType::Boolean,
            Coercion::DateTime { .. } => SemanticType::Timestamp,
            Coercion::Interval => SemanticType::Interval,
        }
    }
}

fn to_int(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Int(i) => Some(*i),
        SqlValue::Bool(b) => Some(i64::from(*b)),
        SqlValue::Float(f) => integral(*f),
        SqlValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18).then_some(f as i64)
}

fn to_float(value: &SqlValue) -> Option<f64> {
    match value {
        SqlValue::Text(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
}

fn to_bool(value: &SqlValue) -> Option<bool> {
    match value {
        SqlValue::Bool(b) => Some(*b),
        SqlValue::Int(0) => Some(false),
        SqlValue::Int(1) => Some(true),
        SqlValue::Text(s) => parse_bool_token(s),
        _ => None,
    }
}

fn to_timestamp(value: &SqlValue, day_first: bool) -> Option<SqlValue> {
    let ts = match value {
        SqlValue::Timestamp(ts) => *ts,
        SqlValue::Date(d) => d.and_time(NaiveTime::MIN),
        SqlValue::Int(_) | SqlValue::Float(_) => {
            let n = value.as_f64()?;
            from_epoch(n, EpochUnit::for_magnitude(n.abs()))?
        }
        SqlValue::Text(s) => parse_timestamp(s, day_first)?,
        _ => return None,
    };
    Some(SqlValue::Timestamp(ts))
}

fn to_interval(value: &SqlValue) -> Option<TimeDelta> {
    match value {
        SqlValue::Interval(d) => Some(*d),
        SqlValue::Int(i) => TimeDelta::try_seconds(*i),
        SqlValue::Float(f) => parse_interval(&f.to_string()),
        SqlValue::Text(s) => parse_interval(s),
        _ => None,
    }
}
