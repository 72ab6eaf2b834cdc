use serde_json::json;
use sqlweave::payload::{json_create_table, json_delete, json_insert, json_select, json_update};
use sqlweave::{Dialect, Params, QueryBuilder, SqlValue, WeaveError};

#[test]
fn select_payload_to_sqlite() {
    let session = QueryBuilder::new(Dialect::Sqlite);
    let plan = json_select(
        &json!({
            "table": "orders",
            "columns": ["customer"],
            "groupby": ["customer"],
            "having": [{"field": "total", "operator": ">", "value": 100, "aggregate": "SUM"}],
            "limit": 5
        }),
        &session,
    )
    .unwrap();
    assert_eq!(
        plan.sql,
        r#"SELECT "customer" FROM "orders" GROUP BY "customer" HAVING SUM("total") > ? OFFSET 0 LIMIT 5"#
    );
    assert_eq!(plan.params, Params::Positional(vec![SqlValue::Int(100)]));
}

#[test]
fn bad_payloads_report_the_problem() {
    let session = QueryBuilder::new(Dialect::Postgres);

    let err = json_update(&json!({"condition": ["id = 1"]}), &session).unwrap_err();
    assert!(
        matches!(err, WeaveError::MissingRequiredField(ref f) if f == &["table", "updateValues"])
    );

    let err = json_select(
        &json!({"table": "t", "condition": ["id ~ 1"]}),
        &session,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        WeaveError::ConditionParse { .. } | WeaveError::InvalidOperator(_)
    ));

    let err = json_select(
        &json!({"table": "t", "condition": ["a = 1", "b = 2"], "expression": "1 OR 3"}),
        &session,
    )
    .unwrap_err();
    assert!(matches!(err, WeaveError::InvalidExpression(_)));
}

#[test]
fn insert_then_retarget() {
    let session = QueryBuilder::new(Dialect::Postgres);
    let plans = json_insert(
        &json!([{"table": "t", "insertValues": {"name": "ann", "age": 30}}]),
        &session,
        false,
    )
    .unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(
        plans[0].sql,
        r#"INSERT INTO "t" ("name", "age") VALUES (%(name_0)s, %(age_0)s)"#
    );

    let mssql = plans[0].adapt_to(Dialect::Mssql).unwrap();
    assert_eq!(mssql.sql, r#"INSERT INTO "t" ("name", "age") VALUES (@name_0, @age_0)"#);

    let mysql = plans[0].adapt_to(Dialect::Mysql).unwrap();
    assert_eq!(mysql.sql, r#"INSERT INTO "t" ("name", "age") VALUES (?, ?)"#);
    assert_eq!(
        mysql.params,
        Params::Positional(vec![SqlValue::Text("ann".into()), SqlValue::Int(30)])
    );
}

#[test]
fn delete_with_expression() {
    let session = QueryBuilder::new(Dialect::Mssql);
    let plan = json_delete(
        &json!({
            "table": "t",
            "condition": ["a = 'x'", "b < 3", "c IS NULL"],
            "expression": "(1 OR 2) AND 3"
        }),
        &session,
    )
    .unwrap();
    assert_eq!(
        plan.sql,
        r#"DELETE FROM "t" WHERE ("a" = @a_1 OR "b" < @b_2) AND "c" IS NULL"#
    );
    assert_eq!(plan.params.len(), 2);
}

#[test]
fn create_table_from_explicit_columns() {
    let session = QueryBuilder::new(Dialect::Postgres);
    let plan = json_create_table(
        &json!({
            "table": "orders",
            "columns": [
                {"name": "id", "type": "BIGINT"},
                {"name": "user_id", "type": "BIGINT"}
            ],
            "primary_keys": ["id"],
            "foreign_keys": [{"column": "user_id", "ref_table": "users", "on_delete": "set null"}],
            "if_not_exists": false
        }),
        &session,
    )
    .unwrap();
    assert_eq!(
        plan.sql,
        "CREATE TABLE \"orders\" (\n  \"id\" BIGINT,\n  \"user_id\" BIGINT,\n  PRIMARY KEY (\"id\"),\n  FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON DELETE SET NULL\n)"
    );

    let err = json_create_table(
        &json!({"table": "t", "columns": [{"name": "x", "type": "INT; DROP"}]}),
        &session,
    )
    .unwrap_err();
    assert!(matches!(err, WeaveError::InvalidType(_)));
}
