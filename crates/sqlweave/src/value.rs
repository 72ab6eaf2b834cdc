//! Scalar values carried by conditions, rows and frames.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Serialize, Serializer};
use std::fmt;

/// A loosely-typed scalar bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Interval(TimeDelta),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text payload, if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value (`Bool` counts as 0/1).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Render the value the way a loosely typed caller would see it as text.
    ///
    /// Returns `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => Some(t.format("%H:%M:%S%.f").to_string()),
            Self::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Self::Interval(d) => Some(interval_seconds(d).to_string()),
        }
    }

    /// Short type tag used in logs and warnings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::Interval(_) => "interval",
        }
    }
}

fn interval_seconds(d: &TimeDelta) -> f64 {
    d.num_microseconds()
        .map_or(d.num_seconds() as f64, |us| us as f64 / 1_000_000.0)
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => serializer.serialize_str(&t.format("%H:%M:%S%.f").to_string()),
            Self::Timestamp(ts) => {
                serializer.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Self::Interval(d) => serializer.serialize_f64(interval_seconds(d)),
        }
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

impl<'de> serde::Deserialize<'de> for SqlValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<TimeDelta> for SqlValue {
    fn from(v: TimeDelta) -> Self {
        Self::Interval(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Coerce a free-text literal: boolean tokens first, then integer, then float,
/// else the trimmed text itself.
///
/// `"1"` and `"0"` are booleans under this rule, matching the token set used
/// by tabular boolean inference.
pub fn coerce_literal(raw: &str) -> SqlValue {
    let s = raw.trim();
    if let Some(b) = parse_bool_token(s) {
        return SqlValue::Bool(b);
    }
    if let Ok(i) = s.parse::<i64>() {
        return SqlValue::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return SqlValue::Float(f);
        }
    }
    SqlValue::Text(s.to_string())
}

/// Case-insensitive boolean token: `true/yes/y/1` or `false/no/n/0`.
pub fn parse_bool_token(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "yes", "y", "1"];
    const FALSE: [&str; 4] = ["false", "no", "n", "0"];
    let s = s.trim();
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_coercion_order() {
        assert_eq!(coerce_literal("30"), SqlValue::Int(30));
        assert_eq!(coerce_literal(" 2.5 "), SqlValue::Float(2.5));
        assert_eq!(coerce_literal("YES"), SqlValue::Bool(true));
        assert_eq!(coerce_literal("n"), SqlValue::Bool(false));
        assert_eq!(coerce_literal("1"), SqlValue::Bool(true));
        assert_eq!(coerce_literal("abc"), SqlValue::Text("abc".into()));
        assert_eq!(coerce_literal("inf"), SqlValue::Text("inf".into()));
    }

    #[test]
    fn json_conversion() {
        let v: SqlValue = serde_json::json!(3).into();
        assert_eq!(v, SqlValue::Int(3));
        let v: SqlValue = serde_json::json!(1.5).into();
        assert_eq!(v, SqlValue::Float(1.5));
        let v: SqlValue = serde_json::json!({"a": 1}).into();
        assert_eq!(v, SqlValue::Text(r#"{"a":1}"#.into()));
    }

    #[test]
    fn serializes_dates_as_iso() {
        let d = NaiveDate::from_ymd_opt(2021, 6, 15).unwrap();
        let json = serde_json::to_string(&SqlValue::Date(d)).unwrap();
        assert_eq!(json, r#""2021-06-15""#);
        let ts = d.and_hms_opt(8, 30, 0).unwrap();
        let json = serde_json::to_string(&SqlValue::Timestamp(ts)).unwrap();
        assert_eq!(json, r#""2021-06-15T08:30:00""#);
    }
}
