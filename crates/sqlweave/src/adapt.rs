//! Rewriting named placeholders into a dialect's native binding shape.
//!
//! Builders render every parameter as `:name`. [`adapt`] rewrites those markers
//! for the target dialect and, for positional dialects, flattens the mapping
//! into a sequence with one element per placeholder occurrence.
//!
//! The scanner understands `:name`, `@name` and `%(name)s` so an already
//! adapted named plan can be re-targeted. Text inside single-quoted literals
//! and double-quoted identifiers is never rewritten, and `::type` casts are
//! left alone.

use crate::dialect::{Dialect, PlaceholderStyle};
use crate::error::{WeaveError, WeaveResult};
use crate::params::{NamedParams, Params};
use crate::query::QueryPlan;
use regex::{Captures, Regex};
use std::sync::OnceLock;

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_word(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

fn word_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
    }
    end
}

/// Split `sql` into literal text and placeholder names.
fn scan(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        // (marker start, name start, name end, marker end)
        let found = match b {
            b'\'' | b'"' => {
                quote = Some(b);
                None
            }
            b':' => {
                let prev_colon = i > 0 && bytes[i - 1] == b':';
                let end = word_end(bytes, i + 1);
                (!prev_colon && end > i + 1).then_some((i, i + 1, end, end))
            }
            b'@' => {
                let end = word_end(bytes, i + 1);
                (end > i + 1).then_some((i, i + 1, end, end))
            }
            b'%' if bytes.get(i + 1) == Some(&b'(') => {
                let end = word_end(bytes, i + 2);
                let closed = bytes.get(end) == Some(&b')') && bytes.get(end + 1) == Some(&b's');
                (end > i + 2 && closed).then_some((i, i + 2, end, end + 2))
            }
            _ => None,
        };

        match found {
            Some((start, name_start, name_end, marker_end)) => {
                if start > text_start {
                    out.push(Segment::Text(&sql[text_start..start]));
                }
                out.push(Segment::Placeholder(&sql[name_start..name_end]));
                text_start = marker_end;
                i = marker_end;
            }
            None => i += 1,
        }
    }
    if text_start < sql.len() {
        out.push(Segment::Text(&sql[text_start..]));
    }
    out
}

fn fetch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*OFFSET (\d+) ROWS(?: FETCH NEXT (\d+) ROWS ONLY)?")
            .expect("invalid built-in pagination regex")
    })
}

/// Rewrite `OFFSET n ROWS [FETCH NEXT m ROWS ONLY]` into `LIMIT`/`OFFSET`.
fn rewrite_pagination(sql: &str, dialect: Dialect) -> String {
    if !matches!(dialect, Dialect::Postgres | Dialect::Mysql | Dialect::Sqlite) {
        return sql.to_string();
    }
    fetch_re()
        .replace_all(sql, |caps: &Captures<'_>| {
            let off = &caps[1];
            match (caps.get(2), dialect) {
                (Some(lim), _) => format!(" LIMIT {} OFFSET {off}", lim.as_str()),
                // MySQL cannot express OFFSET without LIMIT.
                (None, Dialect::Mysql) => format!(" LIMIT 18446744073709551615 OFFSET {off}"),
                (None, _) => format!(" OFFSET {off}"),
            }
        })
        .into_owned()
}

/// Adapt canonical SQL and named parameters to `dialect`.
///
/// Named dialects keep the mapping as-is; positional dialects receive one
/// sequence element per placeholder occurrence. A placeholder without a bound
/// value fails with [`WeaveError::UnboundParameter`].
pub fn adapt(sql: &str, params: NamedParams, dialect: Dialect) -> WeaveResult<QueryPlan> {
    let style = dialect.placeholder_style();
    let mut out = String::with_capacity(sql.len() + 16);
    let mut positional = Vec::new();

    for segment in scan(sql) {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Placeholder(name) => {
                let value = params
                    .get(name)
                    .ok_or_else(|| WeaveError::UnboundParameter(name.to_string()))?;
                if style == PlaceholderStyle::Positional {
                    positional.push(value.clone());
                }
                out.push_str(&dialect.placeholder(name));
            }
        }
    }

    let sql = rewrite_pagination(&out, dialect);
    let params = if style.is_named() {
        Params::Named(params)
    } else {
        Params::Positional(positional)
    };
    Ok(QueryPlan::new(sql, params, dialect))
}

/// Like [`adapt`], with the dialect given by name.
pub fn adapt_named(sql: &str, params: NamedParams, dialect: &str) -> WeaveResult<QueryPlan> {
    adapt(sql, params, dialect.parse()?)
}

/// Names of every placeholder in `sql`, in order of appearance.
pub fn placeholder_names(sql: &str) -> Vec<&str> {
    scan(sql)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name),
            Segment::Text(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    fn params() -> NamedParams {
        [("a_1", SqlValue::Int(1)), ("b_2", SqlValue::from("x"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn oracle_keeps_colon() {
        let plan = adapt("SELECT 1 WHERE a = :a_1 AND b = :b_2", params(), Dialect::Oracle).unwrap();
        assert_eq!(plan.sql, "SELECT 1 WHERE a = :a_1 AND b = :b_2");
        assert_eq!(plan.params.len(), 2);
    }

    #[test]
    fn mssql_and_postgres_rewrite_named() {
        let sql = "a = :a_1 AND b = :b_2";
        assert_eq!(adapt(sql, params(), Dialect::Mssql).unwrap().sql, "a = @a_1 AND b = @b_2");
        assert_eq!(
            adapt(sql, params(), Dialect::Postgres).unwrap().sql,
            "a = %(a_1)s AND b = %(b_2)s"
        );
    }

    #[test]
    fn positional_follows_occurrence_order() {
        let plan = adapt("b = :b_2 OR a = :a_1 OR b2 = :b_2", params(), Dialect::Mysql).unwrap();
        assert_eq!(plan.sql, "b = ? OR a = ? OR b2 = ?");
        assert_eq!(
            plan.params,
            Params::Positional(vec![
                SqlValue::from("x"),
                SqlValue::Int(1),
                SqlValue::from("x")
            ])
        );
    }

    #[test]
    fn literals_and_casts_untouched() {
        let sql = "TO_DATE(:a_1, 'YYYY-MM-DD HH24:MI:SS') AND x::int = :b_2 AND \"c:d\" = 1";
        let plan = adapt(sql, params(), Dialect::Sqlite).unwrap();
        assert_eq!(
            plan.sql,
            "TO_DATE(?, 'YYYY-MM-DD HH24:MI:SS') AND x::int = ? AND \"c:d\" = 1"
        );
    }

    #[test]
    fn unbound_placeholder_fails() {
        let err = adapt("a = :missing", params(), Dialect::Postgres).unwrap_err();
        assert!(matches!(err, WeaveError::UnboundParameter(ref n) if n == "missing"));
    }

    #[test]
    fn unknown_dialect_name_fails() {
        let err = adapt_named("SELECT 1", NamedParams::new(), "informix").unwrap_err();
        assert!(err.is_unsupported_dialect());
    }

    #[test]
    fn fetch_pagination_rewritten() {
        let sql = "SELECT 1 FROM t OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY";
        let pg = adapt(sql, NamedParams::new(), Dialect::Postgres).unwrap();
        assert_eq!(pg.sql, "SELECT 1 FROM t LIMIT 10 OFFSET 20");
        let my = adapt("SELECT 1 FROM t OFFSET 5 ROWS", NamedParams::new(), Dialect::Mysql).unwrap();
        assert_eq!(my.sql, "SELECT 1 FROM t LIMIT 18446744073709551615 OFFSET 5");
        let ms = adapt(sql, NamedParams::new(), Dialect::Mssql).unwrap();
        assert_eq!(ms.sql, sql);
    }

    #[test]
    fn scans_every_named_style() {
        assert_eq!(
            placeholder_names("x = :a AND y = @b AND z = %(c)s AND w = '%(d)s'"),
            ["a", "b", "c"]
        );
    }
}
