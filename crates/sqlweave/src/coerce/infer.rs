//! Semantic type inference over untyped tabular data.

use super::frame::{Frame, Series};
use super::patterns::classify;
use super::temporal::{EpochUnit, from_epoch, parse_date, parse_time, parse_timestamp};
use crate::dialect::SemanticType;
use crate::error::CoercionWarning;
use crate::value::{SqlValue, parse_bool_token};
use serde::Serialize;

/// Result of [`cast_frame`].
#[derive(Debug, Clone, Serialize)]
pub struct CastReport {
    pub frame: Frame,
    /// Type chosen for every column that was examined.
    pub inferred: Vec<(String, SemanticType)>,
    pub warnings: Vec<CoercionWarning>,
}

impl CastReport {
    pub fn inferred_type(&self, column: &str) -> Option<SemanticType> {
        self.inferred
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }
}

fn has_text(series: &Series) -> bool {
    series.values.iter().any(|v| matches!(v, SqlValue::Text(_)))
}

fn samples(series: &Series) -> Vec<String> {
    series
        .non_null()
        .filter_map(SqlValue::to_text)
        .map(|s| s.trim().to_string())
        .collect()
}

/// Infer the semantic type of a column holding text.
///
/// Returns `None` when the column is already typed (no text values) or has
/// no non-null values. A text column matching no pattern is `String`.
pub fn infer_type(series: &Series) -> Option<SemanticType> {
    if !has_text(series) {
        return None;
    }
    let samples = samples(series);
    if samples.is_empty() {
        return None;
    }
    Some(classify(samples.iter().map(String::as_str)).unwrap_or(SemanticType::String))
}

/// Type of an already typed column, from the kinds of its values.
fn observed_type(series: &Series) -> SemanticType {
    let mut ty: Option<SemanticType> = None;
    for v in series.non_null() {
        let this = match v {
            SqlValue::Bool(_) => SemanticType::Boolean,
            SqlValue::Int(_) => SemanticType::Integer,
            SqlValue::Float(_) => SemanticType::Float,
            SqlValue::Date(_) => SemanticType::Date,
            SqlValue::Time(_) => SemanticType::Time,
            SqlValue::Timestamp(_) => SemanticType::Timestamp,
            SqlValue::Interval(_) => SemanticType::Interval,
            SqlValue::Text(_) | SqlValue::Null => SemanticType::String,
        };
        ty = Some(match (ty, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(SemanticType::Integer), SemanticType::Float)
            | (Some(SemanticType::Float), SemanticType::Integer) => SemanticType::Float,
            (Some(SemanticType::Date), SemanticType::Timestamp)
            | (Some(SemanticType::Timestamp), SemanticType::Date) => SemanticType::Timestamp,
            _ => return SemanticType::String,
        });
    }
    ty.unwrap_or(SemanticType::String)
}

/// A semantic type for every column, for DDL generation.
///
/// Text columns are classified by pattern; typed columns by their values;
/// all-null columns default to `String`.
pub fn infer_column_types(frame: &Frame) -> Vec<(String, SemanticType)> {
    frame
        .iter()
        .map(|s| {
            let ty = infer_type(s).unwrap_or_else(|| observed_type(s));
            (s.name.clone(), ty)
        })
        .collect()
}

/// Infer and cast every text column of `frame`.
///
/// Unparseable dates, times and epochs become `Null`. A column whose
/// numeric cast fails is kept as text and reported in the warnings.
pub fn cast_frame(mut frame: Frame) -> CastReport {
    let mut inferred = Vec::new();
    let mut warnings = Vec::new();

    for series in frame.iter_mut() {
        let Some(ty) = infer_type(series) else {
            continue;
        };
        let ty = match cast_series(series, ty) {
            Ok(()) => ty,
            Err(warning) => {
                warnings.push(warning);
                to_text(series);
                SemanticType::String
            }
        };
        tracing::debug!(target: "sqlweave.coerce", column = %series.name, inferred = %ty, "cast column");
        inferred.push((series.name.clone(), ty));
    }

    CastReport {
        frame,
        inferred,
        warnings,
    }
}

fn to_text(series: &mut Series) {
    for v in &mut series.values {
        if let Some(s) = v.to_text() {
            *v = SqlValue::Text(s);
        }
    }
}

fn map_values<F>(series: &mut Series, mut f: F)
where
    F: FnMut(&str) -> Option<SqlValue>,
{
    for v in &mut series.values {
        if let Some(s) = v.to_text() {
            *v = f(s.trim()).unwrap_or(SqlValue::Null);
        }
    }
}

fn cast_series(series: &mut Series, ty: SemanticType) -> Result<(), CoercionWarning> {
    match ty {
        SemanticType::Date => map_values(series, |s| parse_date(s, false).map(SqlValue::Date)),
        SemanticType::Time => map_values(series, |s| parse_time(s).map(SqlValue::Time)),
        SemanticType::Timestamp => {
            map_values(series, |s| parse_timestamp(s, false).map(SqlValue::Timestamp))
        }
        SemanticType::EpochTime => {
            let max = series
                .non_null()
                .filter_map(|v| v.to_text()?.trim().parse::<f64>().ok())
                .fold(0.0_f64, |m, n| m.max(n.abs()));
            let unit = EpochUnit::for_magnitude(max);
            map_values(series, |s| {
                let n = s.parse::<f64>().ok()?;
                from_epoch(n, unit).map(SqlValue::Timestamp)
            });
        }
        SemanticType::Integer => {
            let parsed = parse_all(series, "integer", |s| s.parse::<i64>().ok().map(SqlValue::Int))?;
            series.values = parsed;
        }
        SemanticType::Float => {
            let parsed = parse_all(series, "float", |s| {
                s.parse::<f64>().ok().filter(|f| f.is_finite()).map(SqlValue::Float)
            })?;
            series.values = parsed;
        }
        SemanticType::Boolean => map_values(series, |s| parse_bool_token(s).map(SqlValue::Bool)),
        SemanticType::Uuid => map_values(series, |s| {
            uuid::Uuid::parse_str(s)
                .ok()
                .map(|u| SqlValue::Text(u.hyphenated().to_string()))
        }),
        SemanticType::Email
        | SemanticType::Url
        | SemanticType::Json
        | SemanticType::Interval
        | SemanticType::String => to_text(series),
    }
    Ok(())
}

/// Parse every non-null value, failing on the first that does not parse.
fn parse_all<F>(series: &Series, target: &str, f: F) -> Result<Vec<SqlValue>, CoercionWarning>
where
    F: Fn(&str) -> Option<SqlValue>,
{
    series
        .values
        .iter()
        .map(|v| match v.to_text() {
            None => Ok(SqlValue::Null),
            Some(s) => f(s.trim()).ok_or_else(|| {
                CoercionWarning::new(
                    &series.name,
                    Some(s.clone()),
                    target,
                    format!("cannot cast {s:?} to {target}; column kept as text"),
                )
            }),
        })
        .collect()
}
