//! Coercion of rows and frames to a live table schema.

use super::frame::Frame;
use crate::dialect::{Dialect, SemanticType};
use crate::error::{CoercionWarning, WeaveError, WeaveResult};
use crate::row::Row;
use crate::value::SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One column as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type, e.g. `VARCHAR(50)`.
    pub sql_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Source of column metadata, typically backed by database introspection.
pub trait SchemaProvider {
    fn columns(&self, table: &str) -> WeaveResult<Vec<ColumnSchema>>;
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for &P {
    fn columns(&self, table: &str) -> WeaveResult<Vec<ColumnSchema>> {
        (**self).columns(table)
    }
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for Arc<P> {
    fn columns(&self, table: &str) -> WeaveResult<Vec<ColumnSchema>> {
        (**self).columns(table)
    }
}

/// A fixed in-memory schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StaticSchema {
    tables: HashMap<String, Vec<ColumnSchema>>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table<I, N, T>(mut self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        self.tables.insert(
            name.to_string(),
            columns
                .into_iter()
                .map(|(n, t)| ColumnSchema::new(n, t))
                .collect(),
        );
        self
    }
}

impl SchemaProvider for StaticSchema {
    fn columns(&self, table: &str) -> WeaveResult<Vec<ColumnSchema>> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| WeaveError::schema(table, "unknown table"))
    }
}

/// Coerced data plus the per-value warnings raised along the way.
#[derive(Debug, Clone)]
pub struct Coerced<T> {
    pub data: T,
    pub warnings: Vec<CoercionWarning>,
}

/// Coerces values to the declared types of a table's columns.
///
/// Column metadata is fetched once per table and cached; call
/// [`invalidate`](Self::invalidate) after DDL changes.
#[derive(Debug)]
pub struct Coercer<P> {
    provider: P,
    dialect: Dialect,
    cache: Mutex<HashMap<String, Arc<[ColumnSchema]>>>,
}

impl<P: SchemaProvider> Coercer<P> {
    pub fn new(provider: P, dialect: Dialect) -> Self {
        Self {
            provider,
            dialect,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Columns of `table`, from the cache or the provider.
    pub fn columns(&self, table: &str) -> WeaveResult<Arc<[ColumnSchema]>> {
        if let Some(cols) = self.lock().get(table) {
            return Ok(Arc::clone(cols));
        }
        let cols: Arc<[ColumnSchema]> = self.provider.columns(table)?.into();
        self.lock().insert(table.to_string(), Arc::clone(&cols));
        Ok(cols)
    }

    /// Drop the cached columns of `table`.
    pub fn invalidate(&self, table: &str) {
        self.lock().remove(table);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<[ColumnSchema]>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Coerce each row to the table's column types.
    ///
    /// Keys that are not table columns are dropped. A value that cannot be
    /// converted becomes `Null` and yields a warning.
    pub fn fix_rows(&self, table: &str, rows: &[Row]) -> WeaveResult<Coerced<Vec<Row>>> {
        let cols = self.columns(table)?;
        let mut warnings = Vec::new();
        let data = rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(key, value)| {
                        let col = cols.iter().find(|c| c.name == key)?;
                        Some((key.to_string(), self.coerce(col, value, &mut warnings)))
                    })
                    .collect::<Row>()
            })
            .collect();
        Ok(Coerced { data, warnings })
    }

    /// Coerce each frame column that the table declares; other columns are
    /// left untouched.
    pub fn fix_frame(&self, table: &str, frame: Frame) -> WeaveResult<Coerced<Frame>> {
        let cols = self.columns(table)?;
        let mut frame = frame;
        let mut warnings = Vec::new();
        for series in frame.iter_mut() {
            let Some(col) = cols.iter().find(|c| c.name == series.name) else {
                continue;
            };
            for value in &mut series.values {
                *value = self.coerce(col, value, &mut warnings);
            }
        }
        Ok(Coerced {
            data: frame,
            warnings,
        })
    }

    /// Semantic type of every column of `table`.
    pub fn reverse_map(&self, table: &str) -> WeaveResult<Vec<(String, SemanticType)>> {
        Ok(self
            .columns(table)?
            .iter()
            .map(|c| {
                let ty = self.dialect.coercion(&c.sql_type).semantic_type();
                (c.name.clone(), ty)
            })
            .collect())
    }

    fn coerce(
        &self,
        col: &ColumnSchema,
        value: &SqlValue,
        warnings: &mut Vec<CoercionWarning>,
    ) -> SqlValue {
        match self.dialect.coercion(&col.sql_type).apply(value) {
            Some(v) => v,
            None => {
                warnings.push(CoercionWarning::new(
                    &col.name,
                    value.to_text(),
                    &col.sql_type,
                    format!("cannot convert {} value to {}", value.kind(), col.sql_type),
                ));
                SqlValue::Null
            }
        }
    }
}
