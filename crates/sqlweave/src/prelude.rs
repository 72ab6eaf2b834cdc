//! Convenient imports for typical `sqlweave` usage.
//!
//! ```
//! use sqlweave::prelude::*;
//! ```

pub use crate::qb::{self, QueryBuilder};
pub use crate::{
    BuilderConfig, Condition, ConditionInput, Dialect, Ident, IntoIdent, Op, Params, QueryPlan,
    Row, SqlValue, WeaveError, WeaveResult,
};
