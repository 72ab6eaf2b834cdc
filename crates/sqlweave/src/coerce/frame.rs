//! Column-major tabular data.

use crate::error::{WeaveError, WeaveResult};
use crate::row::Row;
use crate::value::SqlValue;
use serde::Serialize;

/// One named column of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<SqlValue>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<SqlValue>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values that are not `Null`.
    pub fn non_null(&self) -> impl Iterator<Item = &SqlValue> + Clone {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// Tabular data as a list of equally long columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    columns: Vec<Series>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from series; every series must have the same length.
    pub fn from_series(columns: Vec<Series>) -> WeaveResult<Self> {
        if let Some(first) = columns.first() {
            let height = first.len();
            if let Some(bad) = columns.iter().find(|s| s.len() != height) {
                return Err(WeaveError::payload(format!(
                    "column {} has {} values, expected {height}",
                    bad.name,
                    bad.len()
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build from rows. Columns appear in first-seen order; a row without a
    /// column contributes `Null`.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut columns: Vec<Series> = Vec::new();
        let mut height = 0;
        for row in rows {
            for (name, value) in row.iter() {
                let pos = match columns.iter().position(|s| s.name == name) {
                    Some(pos) => pos,
                    None => {
                        columns.push(Series {
                            name: name.to_string(),
                            values: vec![SqlValue::Null; height],
                        });
                        columns.len() - 1
                    }
                };
                columns[pos].values.push(value.clone());
            }
            height += 1;
            for series in &mut columns {
                series.values.resize(height, SqlValue::Null);
            }
        }
        Self { columns }
    }

    /// Build from a JSON array of objects.
    pub fn from_records(records: serde_json::Value) -> WeaveResult<Self> {
        let rows: Vec<Row> = serde_json::from_value(records)
            .map_err(|e| WeaveError::payload(format!("expected an array of records: {e}")))?;
        Ok(Self::from_rows(&rows))
    }

    /// Convert back into rows.
    pub fn to_rows(&self) -> Vec<Row> {
        (0..self.height())
            .map(|i| {
                self.columns
                    .iter()
                    .map(|s| (s.name.clone(), s.values[i].clone()))
                    .collect()
            })
            .collect()
    }

    /// Append a column. Fails if its length differs from the frame height.
    pub fn push(&mut self, series: Series) -> WeaveResult<()> {
        if !self.columns.is_empty() && series.len() != self.height() {
            return Err(WeaveError::payload(format!(
                "column {} has {} values, expected {}",
                series.name,
                series.len(),
                self.height()
            )));
        }
        self.columns.push(series);
        Ok(())
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|s| s.name == name)
    }

    pub fn series_mut(&mut self, name: &str) -> Option<&mut Series> {
        self.columns.iter_mut().find(|s| s.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Series> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Series> {
        self.columns.iter_mut()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Series::len)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }
}

impl IntoIterator for Frame {
    type Item = Series;
    type IntoIter = std::vec::IntoIter<Series>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_records_fills_missing() {
        let frame = Frame::from_records(json!([
            {"a": 1, "b": "x"},
            {"b": "y", "c": true}
        ]))
        .unwrap();
        assert_eq!(frame.column_names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.series("a").unwrap().values, [SqlValue::Int(1), SqlValue::Null]);
        assert_eq!(frame.series("c").unwrap().values, [SqlValue::Null, SqlValue::Bool(true)]);

        let rows = frame.to_rows();
        assert_eq!(rows[1].get("b"), Some(&SqlValue::Text("y".into())));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Frame::from_series(vec![Series::new("a", [1, 2]), Series::new("b", [1])]);
        assert!(matches!(err, Err(WeaveError::Payload(_))));

        let mut frame = Frame::new();
        frame.push(Series::new("a", [1, 2])).unwrap();
        assert!(frame.push(Series::new("b", [1])).is_err());
    }

    #[test]
    fn from_records_rejects_non_array() {
        assert!(Frame::from_records(json!({"a": 1})).is_err());
    }
}
