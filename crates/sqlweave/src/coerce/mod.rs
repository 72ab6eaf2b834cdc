//! Type inference and value coercion for tabular and row data.
//!
//! Two entry points:
//!
//! - [`cast_frame`] infers a [`SemanticType`](crate::SemanticType) for every
//!   text column of an untyped [`Frame`] and casts its values.
//! - [`Coercer`] converts rows or frames to the declared column types of a
//!   live table, as reported by a [`SchemaProvider`].
//!
//! Neither ever fails on a single bad value: the value becomes `Null` and a
//! [`CoercionWarning`](crate::CoercionWarning) is logged and returned.

mod convert;
mod frame;
mod infer;
mod patterns;
mod schema;
mod temporal;

pub use frame::{Frame, Series};
pub use infer::{CastReport, cast_frame, infer_column_types, infer_type};
pub use patterns::{classify, matches};
pub use schema::{Coerced, Coercer, ColumnSchema, SchemaProvider, StaticSchema};
pub use temporal::{EpochUnit, parse_date, parse_interval, parse_time, parse_timestamp};

#[cfg(test)]
mod tests;
