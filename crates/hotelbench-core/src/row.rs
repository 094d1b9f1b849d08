//! Ordered field/value records.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// A normalized result row: an ordered mapping from field name to [`Value`].
///
/// Field order is preserved as produced by the translator so tabular output
/// stays stable; lookups are linear, which is fine for the narrow rows this
/// system handles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRow {
    fields: Vec<(String, Value)>,
}

impl ResultRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create an empty row with field capacity.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Append a field. Names are not deduplicated; translators emit each
    /// column once.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for ResultRow {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
