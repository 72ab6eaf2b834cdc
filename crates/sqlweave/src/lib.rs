//! # sqlweave
//!
//! Dialect-agnostic SQL generation and value coercion for Oracle, SQL Server,
//! MySQL, PostgreSQL and SQLite.
//!
//! ## Features
//!
//! - **Validated identifiers**: every table and column name is checked against
//!   `[A-Za-z0-9_]+` and quoted for the target dialect
//! - **Bound parameters only**: values never reach the SQL text; each plan
//!   carries named or positional parameters in the dialect's native shape
//! - **Flexible conditions**: structured records, free text (`"age > 30"`) or
//!   tuples, combined with `AND` or an index expression (`"(1 OR 2) AND 3"`)
//! - **Safe defaults**: UPDATE and DELETE without conditions are refused
//! - **Type inference and coercion**: infer column types from untyped tabular
//!   data, or coerce values to a live table schema without failing the batch
//!
//! ## Query Builder (qb)
//!
//! ```
//! use sqlweave::{Dialect, qb, qb::QueryBuilder};
//!
//! let session = QueryBuilder::new(Dialect::Mysql);
//!
//! let plan = qb::select("users")
//!     .columns(["id", "name"])
//!     .filter("age > 30")
//!     .order_by_asc("name")
//!     .limit(10)
//!     .build(&session)?;
//! assert_eq!(plan.sql, "SELECT `id`, `name` FROM `users` WHERE `age` > ? ORDER BY `name` ASC LIMIT 10");
//!
//! let plan = qb::update("users")
//!     .set("status", "inactive")
//!     .filter("id = 7")
//!     .build(&session)?;
//! assert_eq!(plan.params.len(), 2);
//!
//! // No WHERE: refused unless explicitly allowed.
//! assert!(qb::delete("users").build(&session).is_err());
//! # Ok::<(), sqlweave::WeaveError>(())
//! ```

pub mod adapt;
pub mod coerce;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod frame_sql;
pub mod ident;
pub mod params;
pub mod payload;
pub mod prelude;
pub mod qb;
pub mod query;
pub mod row;
pub mod value;

pub use adapt::adapt;
pub use coerce::{CastReport, Coercer, ColumnSchema, Frame, SchemaProvider, Series, cast_frame};
pub use condition::{Aggregate, Condition, ConditionInput, IdSequence, Op};
pub use config::BuilderConfig;
pub use dialect::{Coercion, Dialect, DialectProfile, SemanticType, parse_dialect};
pub use error::{CoercionWarning, WeaveError, WeaveResult};
pub use frame_sql::{ColumnSpec, FrameOp, FrameSqlOptions, frame_sql};
pub use ident::{Ident, IntoIdent};
pub use params::{NamedParams, Params};
pub use qb::QueryBuilder;
pub use query::QueryPlan;
pub use row::Row;
pub use value::SqlValue;
