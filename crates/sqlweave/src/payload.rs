//! Statements from JSON request payloads.
//!
//! Recognised keys:
//!
//! | statement | required                 | optional |
//! |-----------|--------------------------|----------|
//! | select    | `table`                  | `fields`/`columns`, `condition`, `expression`, `orderby`, `groupby`, `having`, `having_expression`, `limit`, `start` |
//! | insert    | `table`, `insertValues` per row | |
//! | update    | `table`, `updateValues`  | `condition`, `expression` |
//! | delete    | `table`                  | `condition`, `expression` |
//! | create    | `table`, `columns` or `records` | `primary_keys`, `foreign_keys`, `if_not_exists` |
//!
//! `condition` and `having` take one condition or a list of them.
//!
//! Unknown keys are ignored. Missing required keys are reported together in
//! one [`WeaveError::MissingRequiredField`].

use crate::coerce::{Frame, cast_frame};
use crate::condition::ConditionInput;
use crate::error::{WeaveError, WeaveResult};
use crate::qb::{self, ForeignKey, QueryBuilder};
use crate::query::QueryPlan;
use crate::row::Row;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

fn require(payload: &Value, keys: &[&str]) -> WeaveResult<()> {
    let obj = payload
        .as_object()
        .ok_or_else(|| WeaveError::payload("payload must be a JSON object"))?;
    let missing: Vec<&str> = keys.iter().copied().filter(|k| !obj.contains_key(*k)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WeaveError::missing(missing))
    }
}

fn decode<T: DeserializeOwned>(payload: &Value) -> WeaveResult<T> {
    T::deserialize(payload).map_err(|e| WeaveError::payload(e.to_string()))
}

/// Selected columns: `"*"`, one name, or a list of names.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Fields {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl Fields {
    fn into_columns(self) -> Vec<String> {
        match self {
            Fields::All => Vec::new(),
            Fields::One(s) if s.trim() == "*" => Vec::new(),
            Fields::One(s) => vec![s],
            Fields::Many(v) => v,
        }
    }
}

/// One condition or a list of them.
///
/// A list is tried first, so a bare `[field, op, value]` triple is read as a
/// single condition only when its items are not all conditions themselves.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Conditions {
    Many(Vec<ConditionInput>),
    One(ConditionInput),
}

impl Conditions {
    fn flatten(conditions: Option<Self>) -> Vec<ConditionInput> {
        match conditions {
            None => Vec::new(),
            Some(Conditions::Many(v)) => v,
            Some(Conditions::One(c)) => vec![c],
        }
    }
}

fn default_direction() -> String {
    "ASC".to_string()
}

#[derive(Debug, Deserialize)]
struct OrderBy {
    field: String,
    #[serde(default = "default_direction")]
    direction: String,
}

#[derive(Debug, Deserialize)]
struct SelectPayload {
    table: String,
    #[serde(default, alias = "columns")]
    fields: Option<Fields>,
    #[serde(default)]
    condition: Option<Conditions>,
    #[serde(default)]
    expression: Option<String>,
    #[serde(default)]
    orderby: Option<Vec<OrderBy>>,
    #[serde(default)]
    groupby: Option<Vec<String>>,
    #[serde(default)]
    having: Option<Conditions>,
    #[serde(default)]
    having_expression: Option<String>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    start: Option<u64>,
}

/// Build a SELECT from a payload.
pub fn json_select(payload: &Value, session: &QueryBuilder) -> WeaveResult<QueryPlan> {
    require(payload, &["table"])?;
    let p: SelectPayload = decode(payload)?;

    let mut q = qb::select(&p.table)
        .columns(p.fields.unwrap_or_default().into_columns())
        .filters(Conditions::flatten(p.condition))
        .group_by(p.groupby.unwrap_or_default());
    if let Some(expr) = p.expression {
        q = q.expression(expr);
    }
    for h in Conditions::flatten(p.having) {
        q = q.having(h);
    }
    if let Some(expr) = p.having_expression {
        q = q.having_expression(expr);
    }
    for o in p.orderby.unwrap_or_default() {
        q = q.order_by(&o.field, &o.direction);
    }
    if let Some(n) = p.limit {
        q = q.limit(n);
    }
    if let Some(n) = p.start {
        q = q.offset(n);
    }
    q.build(session)
}

#[derive(Debug, Deserialize)]
struct InsertRow {
    table: String,
    #[serde(rename = "insertValues")]
    insert_values: Row,
}

/// Build INSERT statements from `{"rows": [{table, insertValues}, ...]}` or a
/// bare array of such rows.
///
/// With `multi_row` set and every row targeting one table, the rows go into a
/// single bulk statement (split into batches where the dialect requires);
/// otherwise one statement is built per row.
pub fn json_insert(payload: &Value, session: &QueryBuilder, multi_row: bool) -> WeaveResult<Vec<QueryPlan>> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(obj) => match obj.get("rows") {
            Some(Value::Array(rows)) => rows,
            Some(_) => return Err(WeaveError::payload("rows must be an array")),
            None => return Err(WeaveError::missing(["rows"])),
        },
        _ => return Err(WeaveError::payload("insert payload must be an object or an array")),
    };
    if rows.is_empty() {
        return Err(WeaveError::EmptyInput("no rows provided for insert".into()));
    }
    let rows = rows
        .iter()
        .map(|r| {
            require(r, &["table", "insertValues"])?;
            decode::<InsertRow>(r)
        })
        .collect::<WeaveResult<Vec<_>>>()?;

    let same_table = rows.iter().all(|r| r.table == rows[0].table);
    if multi_row && same_table {
        let table = rows[0].table.clone();
        return session.insert_bulk(&table, rows.into_iter().map(|r| r.insert_values));
    }
    rows.into_iter()
        .map(|r| qb::insert(&r.table).row(r.insert_values).build(session))
        .collect()
}

#[derive(Debug, Deserialize)]
struct UpdatePayload {
    table: String,
    #[serde(rename = "updateValues")]
    update_values: Row,
    #[serde(default)]
    condition: Option<Conditions>,
    #[serde(default)]
    expression: Option<String>,
}

/// Build an UPDATE from a payload. A `limit` key is rejected.
pub fn json_update(payload: &Value, session: &QueryBuilder) -> WeaveResult<QueryPlan> {
    require(payload, &["table", "updateValues"])?;
    if payload.get("limit").is_some() {
        return Err(WeaveError::payload("LIMIT is not supported in UPDATE"));
    }
    let p: UpdatePayload = decode(payload)?;
    let mut q = qb::update(&p.table)
        .set_row(p.update_values)
        .filters(Conditions::flatten(p.condition));
    if let Some(expr) = p.expression {
        q = q.expression(expr);
    }
    q.build(session)
}

#[derive(Debug, Deserialize)]
struct DeletePayload {
    table: String,
    #[serde(default)]
    condition: Option<Conditions>,
    #[serde(default)]
    expression: Option<String>,
}

/// Build a DELETE from a payload.
pub fn json_delete(payload: &Value, session: &QueryBuilder) -> WeaveResult<QueryPlan> {
    require(payload, &["table"])?;
    let p: DeletePayload = decode(payload)?;
    let mut q = qb::delete(&p.table).filters(Conditions::flatten(p.condition));
    if let Some(expr) = p.expression {
        q = q.expression(expr);
    }
    q.build(session)
}

#[derive(Debug, Deserialize)]
struct ColumnSpec {
    name: String,
    #[serde(rename = "type")]
    sql_type: String,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CreateTablePayload {
    table: String,
    #[serde(default)]
    columns: Option<Vec<ColumnSpec>>,
    #[serde(default)]
    records: Option<Value>,
    #[serde(default, alias = "pk")]
    primary_keys: Vec<String>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKey>,
    #[serde(default = "yes")]
    if_not_exists: bool,
}

/// Build a CREATE TABLE from explicit `columns` (`[{name, type}]`) or from
/// sample `records`, whose column types are inferred.
pub fn json_create_table(payload: &Value, session: &QueryBuilder) -> WeaveResult<QueryPlan> {
    require(payload, &["table"])?;
    let p: CreateTablePayload = decode(payload)?;

    let mut q = qb::create_table(&p.table).if_not_exists(p.if_not_exists);
    match (p.columns, p.records) {
        (Some(columns), _) => {
            for c in columns {
                q = q.column(&c.name, &c.sql_type);
            }
        }
        (None, Some(records)) => {
            let report = cast_frame(Frame::from_records(records)?);
            q = q.columns_from_frame(&report.frame);
        }
        (None, None) => return Err(WeaveError::missing(["columns"])),
    }
    if !p.primary_keys.is_empty() {
        q = q.primary_key(p.primary_keys);
    }
    for fk in p.foreign_keys {
        q = q.foreign_key(fk);
    }
    q.build(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::params::Params;
    use crate::value::SqlValue;
    use serde_json::json;

    #[test]
    fn select_payload() {
        let session = QueryBuilder::new(Dialect::Mysql);
        let plan = json_select(
            &json!({
                "table": "users",
                "fields": ["id", "name"],
                "condition": [
                    {"field": "age", "operator": ">=", "value": 18},
                    "name LIKE 'A%'",
                    ["id", "IN", [1, 2]]
                ],
                "expression": "1 AND (2 OR 3)",
                "orderby": [{"field": "name"}, {"field": "id", "direction": "desc"}],
                "limit": 10,
                "start": 20,
                "ignored": true
            }),
            &session,
        )
        .unwrap();
        assert_eq!(
            plan.sql,
            "SELECT `id`, `name` FROM `users` WHERE `age` >= ? AND (`name` LIKE ? OR `id` IN (?,?)) ORDER BY `name` ASC, `id` DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            plan.params,
            Params::Positional(vec![
                SqlValue::Int(18),
                SqlValue::Text("A%".into()),
                SqlValue::Int(1),
                SqlValue::Int(2),
            ])
        );
    }

    #[test]
    fn select_star_and_missing_table() {
        let session = QueryBuilder::new(Dialect::Postgres);
        let plan = json_select(&json!({"table": "t", "fields": "*"}), &session).unwrap();
        assert_eq!(plan.sql, r#"SELECT * FROM "t""#);

        let err = json_select(&json!({"fields": "*"}), &session).unwrap_err();
        assert!(matches!(err, WeaveError::MissingRequiredField(ref f) if f == &["table"]));
        assert!(matches!(json_select(&json!([1]), &session), Err(WeaveError::Payload(_))));
    }

    #[test]
    fn insert_payload_multi_row() {
        let session = QueryBuilder::new(Dialect::Sqlite);
        let payload = json!({"rows": [
            {"table": "t", "insertValues": {"a": 1, "b": "x"}},
            {"table": "t", "insertValues": {"a": 2, "b": "y"}}
        ]});
        let plans = json_insert(&payload, &session, true).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].sql, r#"INSERT INTO "t" ("a", "b") VALUES (?, ?), (?, ?)"#);

        let plans = json_insert(&payload, &session, false).unwrap();
        assert_eq!(plans.len(), 2);

        let mixed = json!([
            {"table": "t", "insertValues": {"a": 1}},
            {"table": "u", "insertValues": {"a": 2}}
        ]);
        let plans = json_insert(&mixed, &session, true).unwrap();
        assert_eq!(plans[1].sql, r#"INSERT INTO "u" ("a") VALUES (?)"#);
    }

    #[test]
    fn insert_payload_errors() {
        let session = QueryBuilder::new(Dialect::Sqlite);
        assert!(matches!(
            json_insert(&json!({"rows": []}), &session, true),
            Err(WeaveError::EmptyInput(_))
        ));
        let err = json_insert(&json!([{"values": {}}]), &session, true).unwrap_err();
        assert!(
            matches!(err, WeaveError::MissingRequiredField(ref f) if f == &["table", "insertValues"])
        );
    }

    #[test]
    fn update_payload() {
        let session = QueryBuilder::new(Dialect::Mssql);
        let plan = json_update(
            &json!({
                "table": "t",
                "updateValues": {"status": "done"},
                "condition": ["id = 3"]
            }),
            &session,
        )
        .unwrap();
        assert_eq!(plan.sql, r#"UPDATE "t" SET "status" = @set_status WHERE "id" = @id_1"#);

        let err = json_update(&json!({"table": "t", "updateValues": {"x": 1}}), &session).unwrap_err();
        assert!(err.is_unsafe_mutation());

        let err = json_update(
            &json!({"table": "t", "updateValues": {"x": 1}, "condition": ["id = 1"], "limit": 1}),
            &session,
        )
        .unwrap_err();
        assert!(matches!(err, WeaveError::Payload(_)));
    }

    #[test]
    fn delete_payload() {
        let session = QueryBuilder::new(Dialect::Oracle);
        let plan = json_delete(
            &json!({"table": "t", "condition": [{"field": "id", "operator": "=", "value": 9}]}),
            &session,
        )
        .unwrap();
        assert_eq!(plan.sql, r#"DELETE FROM "t" WHERE "id" = :id_1"#);
        assert!(json_delete(&json!({"table": "t"}), &session).unwrap_err().is_unsafe_mutation());
    }

    #[test]
    fn single_condition_without_list() {
        let session = QueryBuilder::new(Dialect::Postgres);
        let plan = json_select(&json!({"table": "t", "condition": "id = 3"}), &session).unwrap();
        assert_eq!(plan.sql, r#"SELECT * FROM "t" WHERE "id" = %(id_1)s"#);

        let plan = json_delete(
            &json!({"table": "t", "condition": {"field": "id", "operator": "<", "value": 9}}),
            &session,
        )
        .unwrap();
        assert_eq!(plan.sql, r#"DELETE FROM "t" WHERE "id" < %(id_2)s"#);

        let plan = json_update(
            &json!({"table": "t", "updateValues": {"x": 1}, "condition": ["id", "IN", [1, 2]]}),
            &session,
        )
        .unwrap();
        assert_eq!(
            plan.sql,
            r#"UPDATE "t" SET "x" = %(set_x)s WHERE "id" IN (%(id_3_0)s,%(id_3_1)s)"#
        );
    }

    #[test]
    fn create_table_payload() {
        let session = QueryBuilder::new(Dialect::Mysql);
        let plan = json_create_table(
            &json!({
                "table": "events",
                "records": [{"id": "1", "at": "2021-01-01 10:00:00", "ok": "yes"}],
                "pk": ["id"]
            }),
            &session,
        )
        .unwrap();
        assert_eq!(
            plan.sql,
            "CREATE TABLE IF NOT EXISTS `events` (\n  `id` BIGINT,\n  `at` DATETIME,\n  `ok` TINYINT(1),\n  PRIMARY KEY (`id`)\n)"
        );

        let err = json_create_table(&json!({"table": "t"}), &session).unwrap_err();
        assert!(matches!(err, WeaveError::MissingRequiredField(_)));
    }
}
