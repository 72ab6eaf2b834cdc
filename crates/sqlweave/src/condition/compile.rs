//! Rendering conditions into SQL fragments with named parameters.

use super::{Condition, IdSequence, Op};
use crate::dialect::Dialect;
use crate::error::{WeaveError, WeaveResult};
use crate::params::NamedParams;
use crate::value::SqlValue;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// A rendered WHERE/HAVING body and the parameters it references.
///
/// Placeholders are in canonical `:name` form; the adapter rewrites them for
/// the target dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: NamedParams,
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}(?: \d{2}:\d{2}:\d{2})?$")
            .expect("invalid built-in datetime regex")
    })
}

fn expression_charset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\sANDOR()]+$").expect("invalid built-in expression regex"))
}

fn expression_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\b").expect("invalid built-in expression regex"))
}

/// Compile a single condition using instance id `id`.
pub fn compile_one(cond: &Condition, dialect: Dialect, id: u64) -> Fragment {
    let mut params = NamedParams::new();
    let sql = render(cond, dialect, id, &mut params);
    Fragment { sql, params }
}

/// Render `cond`, binding its values into `params`.
///
/// Names follow `{field}_{id}` (with `_{i}`, `_min` or `_max` suffixes). A name
/// already present in `params` gets a numeric suffix instead of replacing it.
fn render(cond: &Condition, dialect: Dialect, id: u64, params: &mut NamedParams) -> String {
    let mut col = cond.field.quoted(dialect);
    if let Some(agg) = cond.aggregate {
        col = format!("{}({col})", agg.as_sql());
    }
    let base = format!("{}_{id}", cond.field);
    let values = &cond.values;

    match cond.op {
        Op::IsNull | Op::IsNotNull => format!("{col} {}", cond.op),
        Op::Between => {
            let lo = params.claim(format!("{base}_min"), values[0].clone());
            let hi = params.claim(format!("{base}_max"), values[1].clone());
            format!("{col} BETWEEN :{lo} AND :{hi}")
        }
        Op::In | Op::NotIn => {
            let marks: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(i, v)| format!(":{}", params.claim(format!("{base}_{i}"), v.clone())))
                .collect();
            format!("{col} {} ({})", cond.op, marks.join(","))
        }
        Op::Like | Op::Ilike => {
            let name = params.claim(base, values[0].clone());
            format!("{col} {} :{name}", cond.op)
        }
        Op::Eq | Op::Ne | Op::NotEqual | Op::Lt | Op::Gt | Op::Lte | Op::Gte => {
            let mark = format!(":{}", params.claim(base, values[0].clone()));
            let rhs = match &values[0] {
                SqlValue::Text(s) if datetime_re().is_match(s) => {
                    dialect.wrap_datetime(&mark).unwrap_or(mark)
                }
                _ => mark,
            };
            format!("{col} {} {rhs}", cond.op)
        }
    }
}

/// Compile a list of conditions into one fragment.
///
/// Without an expression the fragments are joined with `AND`. With an
/// expression such as `(1 OR 2) AND 3`, each integer is replaced by the
/// 1-based fragment it names. The expression is checked only for its
/// character set and index range; parentheses are passed through as written.
///
/// Returns `Ok(None)` for an empty list.
pub fn compile(
    conditions: &[Condition],
    expression: Option<&str>,
    dialect: Dialect,
    ids: &IdSequence,
) -> WeaveResult<Option<Fragment>> {
    let mut params = NamedParams::new();
    let sql = compile_into(conditions, expression, dialect, ids, &mut params)?;
    Ok(sql.map(|sql| Fragment { sql, params }))
}

/// Like [`compile`], but binds into `params`, which may already hold
/// parameters of the enclosing statement. Returns only the SQL.
pub fn compile_into(
    conditions: &[Condition],
    expression: Option<&str>,
    dialect: Dialect,
    ids: &IdSequence,
    params: &mut NamedParams,
) -> WeaveResult<Option<String>> {
    if conditions.is_empty() {
        return Ok(None);
    }

    let parts: Vec<String> = conditions
        .iter()
        .map(|cond| render(cond, dialect, ids.next_id(), params))
        .collect();

    let sql = match expression {
        None => parts.join(" AND "),
        Some(expr) => substitute(expr, &parts)?,
    };
    Ok(Some(sql))
}

fn substitute(expr: &str, parts: &[String]) -> WeaveResult<String> {
    if !expression_charset_re().is_match(expr) {
        return Err(WeaveError::InvalidExpression(format!(
            "invalid characters in {expr:?}"
        )));
    }

    let mut bad: Option<String> = None;
    let out = expression_index_re().replace_all(expr, |caps: &Captures<'_>| {
        let raw = &caps[0];
        match raw.parse::<usize>() {
            Ok(n) if (1..=parts.len()).contains(&n) => parts[n - 1].clone(),
            _ => {
                bad.get_or_insert_with(|| raw.to_string());
                String::new()
            }
        }
    });

    match bad {
        Some(raw) => Err(WeaveError::InvalidExpression(format!(
            "index {raw} out of range 1..={}",
            parts.len()
        ))),
        None => Ok(out.into_owned()),
    }
}
