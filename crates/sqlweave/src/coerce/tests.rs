use super::*;
use crate::dialect::{Dialect, SemanticType};
use crate::error::WeaveError;
use crate::row::Row;
use crate::value::SqlValue;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn frame(name: &str, values: &[&str]) -> Frame {
    Frame::from_series(vec![Series::new(name, values.iter().copied())]).unwrap()
}

#[test]
fn test_cast_dates() {
    let report = cast_frame(frame("d", &["2021-01-01", "2021-06-15"]));
    assert_eq!(report.inferred_type("d"), Some(SemanticType::Date));
    assert_eq!(
        report.frame.series("d").unwrap().values,
        [
            SqlValue::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()),
            SqlValue::Date(NaiveDate::from_ymd_opt(2021, 6, 15).unwrap()),
        ]
    );
    assert!(report.warnings.is_empty());
}

#[test]
fn test_cast_integers() {
    let report = cast_frame(frame("n", &["1", "2", "3"]));
    assert_eq!(report.inferred_type("n"), Some(SemanticType::Integer));
    assert_eq!(
        report.frame.series("n").unwrap().values,
        [SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
    );
}

#[test]
fn test_cast_booleans() {
    let report = cast_frame(frame("b", &["true", "no", "1"]));
    assert_eq!(report.inferred_type("b"), Some(SemanticType::Boolean));
    assert_eq!(
        report.frame.series("b").unwrap().values,
        [SqlValue::Bool(true), SqlValue::Bool(false), SqlValue::Bool(true)]
    );
}

#[test]
fn test_cast_epoch_units() {
    let secs = cast_frame(frame("t", &["1600000000", "1600000060"]));
    let millis = cast_frame(frame("t", &["1600000000000", "1600000060000"]));
    assert_eq!(secs.inferred_type("t"), Some(SemanticType::EpochTime));
    assert_eq!(millis.inferred_type("t"), Some(SemanticType::EpochTime));
    assert_eq!(
        secs.frame.series("t").unwrap().values,
        millis.frame.series("t").unwrap().values
    );
    let SqlValue::Timestamp(ts) = &secs.frame.series("t").unwrap().values[0] else {
        panic!("expected a timestamp");
    };
    assert_eq!(ts.to_string(), "2020-09-13 12:26:40");
}

#[test]
fn test_cast_keeps_nulls_and_skips_typed_columns() {
    let f = Frame::from_records(json!([
        {"n": "4", "typed": 1.5, "empty": null},
        {"n": null, "typed": 2, "empty": null}
    ]))
    .unwrap();
    let report = cast_frame(f);
    assert_eq!(
        report.frame.series("n").unwrap().values,
        [SqlValue::Int(4), SqlValue::Null]
    );
    assert_eq!(report.inferred_type("typed"), None);
    assert_eq!(report.inferred_type("empty"), None);
    assert_eq!(
        report.frame.series("typed").unwrap().values,
        [SqlValue::Float(1.5), SqlValue::Int(2)]
    );
}

#[test]
fn test_cast_recognised_but_not_cast_types() {
    let report = cast_frame(frame("u", &["67E55044-10B1-426F-9247-BB680E5FE0C8"]));
    assert_eq!(report.inferred_type("u"), Some(SemanticType::Uuid));
    assert_eq!(
        report.frame.series("u").unwrap().values,
        [SqlValue::Text("67e55044-10b1-426f-9247-bb680e5fe0c8".into())]
    );

    let report = cast_frame(frame("s", &["alpha", "42"]));
    assert_eq!(report.inferred_type("s"), Some(SemanticType::String));
}

#[test]
fn test_cast_integer_overflow_degrades_to_text() {
    let report = cast_frame(frame("n", &["1", "99999999999999999999"]));
    assert_eq!(report.inferred_type("n"), Some(SemanticType::String));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].column, "n");
    assert_eq!(
        report.frame.series("n").unwrap().values,
        [
            SqlValue::Text("1".into()),
            SqlValue::Text("99999999999999999999".into())
        ]
    );
}

#[test]
fn test_infer_column_types_for_ddl() {
    let f = Frame::from_records(json!([
        {"id": 1, "price": "2.5", "active": true, "note": null},
        {"id": 2, "price": "3.0", "active": false, "note": null}
    ]))
    .unwrap();
    let types = infer_column_types(&f);
    assert_eq!(
        types,
        [
            ("id".to_string(), SemanticType::Integer),
            ("price".to_string(), SemanticType::Float),
            ("active".to_string(), SemanticType::Boolean),
            ("note".to_string(), SemanticType::String),
        ]
    );
}

struct CountingSchema {
    inner: StaticSchema,
    calls: AtomicUsize,
}

impl SchemaProvider for CountingSchema {
    fn columns(&self, table: &str) -> crate::WeaveResult<Vec<ColumnSchema>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.columns(table)
    }
}

fn users_schema() -> StaticSchema {
    StaticSchema::new().table(
        "users",
        [
            ("id", "BIGINT"),
            ("name", "VARCHAR(50)"),
            ("active", "BOOLEAN"),
            ("joined", "TIMESTAMP"),
        ],
    )
}

#[test]
fn test_fix_rows_coerces_and_drops_unknown() {
    let coercer = Coercer::new(users_schema(), Dialect::Postgres);
    let rows = vec![
        Row::new()
            .set("id", "7")
            .set("name", 12)
            .set("active", "yes")
            .set("joined", "2021-01-01 08:00:00")
            .set("extra", 1),
        Row::new().set("id", "seven").set("active", SqlValue::Null),
    ];
    let fixed = coercer.fix_rows("users", &rows).unwrap();

    let first = &fixed.data[0];
    assert_eq!(first.get("id"), Some(&SqlValue::Int(7)));
    assert_eq!(first.get("name"), Some(&SqlValue::Text("12".into())));
    assert_eq!(first.get("active"), Some(&SqlValue::Bool(true)));
    assert!(matches!(first.get("joined"), Some(SqlValue::Timestamp(_))));
    assert!(!first.contains("extra"));

    let second = &fixed.data[1];
    assert_eq!(second.get("id"), Some(&SqlValue::Null));
    assert_eq!(second.get("active"), Some(&SqlValue::Null));
    assert_eq!(fixed.warnings.len(), 1);
    assert_eq!(fixed.warnings[0].column, "id");
    assert_eq!(fixed.warnings[0].value.as_deref(), Some("seven"));
}

#[test]
fn test_fix_frame_and_cache() {
    let provider = CountingSchema {
        inner: users_schema(),
        calls: AtomicUsize::new(0),
    };
    let coercer = Coercer::new(&provider, Dialect::Postgres);
    let f = Frame::from_records(json!([{"id": "1", "other": "x"}, {"id": "2.0", "other": "y"}])).unwrap();

    let fixed = coercer.fix_frame("users", f.clone()).unwrap();
    assert_eq!(
        fixed.data.series("id").unwrap().values,
        [SqlValue::Int(1), SqlValue::Int(2)]
    );
    assert_eq!(fixed.data.series("other"), f.series("other"));

    coercer.fix_frame("users", f.clone()).unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    coercer.invalidate("users");
    coercer.fix_frame("users", f).unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_reverse_map_and_unknown_table() {
    let coercer = Coercer::new(users_schema(), Dialect::Postgres);
    assert_eq!(
        coercer.reverse_map("users").unwrap(),
        [
            ("id".to_string(), SemanticType::Integer),
            ("name".to_string(), SemanticType::String),
            ("active".to_string(), SemanticType::Boolean),
            ("joined".to_string(), SemanticType::Timestamp),
        ]
    );
    assert!(matches!(
        coercer.fix_rows("ghosts", &[]),
        Err(WeaveError::Schema { .. })
    ));
}
