//! Parameter storage for built statements.

use crate::error::{WeaveError, WeaveResult};
use crate::value::SqlValue;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Named parameters in insertion order.
///
/// Keys are unique; inserting an existing key replaces its value in place so
/// the original position is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NamedParams {
    entries: Vec<(String, SqlValue)>,
}

impl NamedParams {
    /// Create a new empty parameter map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `value` to `name`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Bind `value` under `base`, or under the first free `{base}_{k}` when
    /// `base` is taken. Returns the name used.
    pub fn claim(&mut self, base: String, value: impl Into<SqlValue>) -> String {
        let mut name = base;
        if self.contains(&name) {
            let mut k = 1u32;
            while self.contains(&format!("{name}_{k}")) {
                k += 1;
            }
            name = format!("{name}_{k}");
        }
        self.entries.push((name.clone(), value.into()));
        name
    }

    /// Move another map's parameters into this one.
    ///
    /// Fails with `DuplicateParameter` if a key is already bound; nothing is
    /// merged in that case.
    pub fn merge(&mut self, other: NamedParams) -> WeaveResult<()> {
        if let Some(dup) = other.keys().find(|k| self.contains(k)) {
            return Err(WeaveError::DuplicateParameter(dup.to_string()));
        }
        self.entries.extend(other.entries);
        Ok(())
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for NamedParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = NamedParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl IntoIterator for NamedParams {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for NamedParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parameter binding in the shape a dialect's driver expects.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Params {
    /// Name → value mapping (oracle, mssql, postgresql).
    Named(NamedParams),
    /// Values in placeholder order (mysql, sqlite).
    Positional(Vec<SqlValue>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Self::Named(p) => p.len(),
            Self::Positional(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_named(&self) -> Option<&NamedParams> {
        match self {
            Self::Named(p) => Some(p),
            Self::Positional(_) => None,
        }
    }

    pub fn as_positional(&self) -> Option<&[SqlValue]> {
        match self {
            Self::Named(_) => None,
            Self::Positional(p) => Some(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut p = NamedParams::new();
        p.insert("a", 1);
        p.insert("b", 2);
        p.insert("a", 3);
        let keys: Vec<_> = p.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(p.get("a"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn claim_skips_taken_names() {
        let mut p = NamedParams::new();
        assert_eq!(p.claim("a_1_2".into(), 3), "a_1_2");
        assert_eq!(p.claim("a_1_2".into(), 5), "a_1_2_1");
        p.insert("b_1", 0);
        p.insert("b_1_1", 0);
        assert_eq!(p.claim("b_1".into(), 7), "b_1_2");
        assert_eq!(p.get("a_1_2"), Some(&SqlValue::Int(3)));
        assert_eq!(p.get("a_1_2_1"), Some(&SqlValue::Int(5)));
    }

    #[test]
    fn merge_refuses_duplicates() {
        let mut p: NamedParams = [("x", 1)].into_iter().collect();
        let clash: NamedParams = [("y", 2), ("x", 9)].into_iter().collect();
        let err = p.merge(clash).unwrap_err();
        assert!(matches!(err, WeaveError::DuplicateParameter(ref k) if k == "x"));
        assert_eq!(p.len(), 1);
        assert_eq!(p.get("x"), Some(&SqlValue::Int(1)));

        p.merge([("y", 2)].into_iter().collect()).unwrap();
        assert_eq!(p.keys().collect::<Vec<_>>(), ["x", "y"]);
    }

    #[test]
    fn serializes_as_map_and_sequence() {
        let named: NamedParams = [("x", 1), ("y", 2)].into_iter().collect();
        let json = serde_json::to_string(&Params::Named(named)).unwrap();
        assert_eq!(json, r#"{"x":1,"y":2}"#);

        let pos = Params::Positional(vec![SqlValue::Int(1), SqlValue::from("a")]);
        assert_eq!(serde_json::to_string(&pos).unwrap(), r#"[1,"a"]"#);
    }
}
