//! The `(sql, params)` pair every builder returns.

use crate::adapt::adapt;
use crate::dialect::Dialect;
use crate::error::{WeaveError, WeaveResult};
use crate::params::Params;
use serde::Serialize;

/// A built statement ready for a driver.
///
/// `params` is a named mapping for oracle/mssql/postgresql and a positional
/// sequence for mysql/sqlite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub sql: String,
    pub params: Params,
    #[serde(skip)]
    pub dialect: Dialect,
}

impl QueryPlan {
    pub fn new(sql: String, params: Params, dialect: Dialect) -> Self {
        Self {
            sql,
            params,
            dialect,
        }
    }

    /// Re-target a plan that carries named parameters.
    ///
    /// Positional plans have lost their parameter names and fail with
    /// [`WeaveError::UnsupportedDialect`].
    pub fn adapt_to(&self, target: Dialect) -> WeaveResult<QueryPlan> {
        match &self.params {
            Params::Named(named) => adapt(&self.sql, named.clone(), target),
            Params::Positional(_) => Err(WeaveError::unsupported(format!(
                "cannot re-target a positional {} plan",
                self.dialect
            ))),
        }
    }

    /// Consume the plan into its parts.
    pub fn into_parts(self) -> (String, Params) {
        (self.sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::NamedParams;
    use crate::value::SqlValue;

    #[test]
    fn retarget_named_plan() {
        let params: NamedParams = [("id_1", 7)].into_iter().collect();
        let pg = adapt("SELECT * FROM t WHERE id = :id_1", params, Dialect::Postgres).unwrap();
        assert_eq!(pg.sql, "SELECT * FROM t WHERE id = %(id_1)s");

        let ms = pg.adapt_to(Dialect::Mssql).unwrap();
        assert_eq!(ms.sql, "SELECT * FROM t WHERE id = @id_1");

        let lite = ms.adapt_to(Dialect::Sqlite).unwrap();
        assert_eq!(lite.sql, "SELECT * FROM t WHERE id = ?");
        assert_eq!(lite.params, Params::Positional(vec![SqlValue::Int(7)]));

        assert!(lite.adapt_to(Dialect::Oracle).unwrap_err().is_unsupported_dialect());
    }

    #[test]
    fn serializes_without_dialect() {
        let plan = QueryPlan::new(
            "SELECT 1".into(),
            Params::Positional(Vec::new()),
            Dialect::Mysql,
        );
        assert_eq!(
            serde_json::to_string(&plan).unwrap(),
            r#"{"sql":"SELECT 1","params":[]}"#
        );
    }
}
