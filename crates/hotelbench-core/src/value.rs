//! Primitive value types shared by all backends.

use std::cmp::Ordering;

use serde::ser::{Serialize, Serializer};

/// A normalized primitive value.
///
/// Every translator coerces its backend-native types (DECIMAL, UUID,
/// ObjectId, native dates) into this set before a row leaves the backend
/// layer, so the runner and the report layer never see driver types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null or absent field.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point. Decimals are coerced here.
    Float(f64),
    /// UTF-8 string. UUIDs and document ids are coerced here.
    String(String),
    /// Timestamp as microseconds since the Unix epoch. Dates coerce to
    /// midnight UTC.
    Timestamp(i64),
}

/// A hashable, orderable grouping key derived from a [`Value`].
///
/// Floats are not valid group keys; timestamps group by their microsecond
/// instant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as timestamp (microseconds since epoch).
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Numeric view for aggregation: integers and floats widen to f64,
    /// everything else is not numeric.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Derive a grouping key, if this value can serve as one.
    pub fn group_key(&self) -> Option<GroupKey> {
        match self {
            Value::Bool(b) => Some(GroupKey::Bool(*b)),
            Value::Int(i) => Some(GroupKey::Int(*i)),
            Value::Timestamp(t) => Some(GroupKey::Int(*t)),
            Value::String(s) => Some(GroupKey::Text(s.clone())),
            Value::Null | Value::Float(_) => None,
        }
    }

    /// Total ordering used by client-side sorts.
    ///
    /// Null sorts before everything; mixed numeric types compare as f64;
    /// otherwise values of different kinds compare by kind, which only
    /// matters for heterogeneous columns a well-formed fixture never has.
    pub fn compare(&self, other: &Value) -> Ordering {
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
            (String(a), String(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (a, b) => kind_rank(a).cmp(&kind_rank(b)),
        }
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Timestamp(_) => 3,
        Value::String(_) => 4,
    }
}

/// Render a microsecond timestamp as `YYYY-MM-DD HH:MM:SS` UTC.
pub fn format_timestamp(micros: i64) -> String {
    match chrono::DateTime::from_timestamp_micros(micros) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => micros.to_string(),
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Timestamp(t) => write!(f, "{}", format_timestamp(*t)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => serializer.serialize_str(&format_timestamp(*t)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_i64(), Some(42));
        assert_eq!(Value::Int(42).as_numeric(), Some(42.0));
        assert_eq!(Value::Float(1.5).as_numeric(), Some(1.5));
        assert_eq!(Value::String("a".into()).as_numeric(), None);
        assert_eq!(Value::String("a".into()).as_str(), Some("a"));
    }

    #[test]
    fn conversions() {
        let v: Value = None::<i64>.into();
        assert_eq!(v, Value::Null);
        let v: Value = Some("x").into();
        assert_eq!(v, Value::String("x".into()));
        let v: Value = 3i32.into();
        assert_eq!(v, Value::Int(3));
    }

    #[test]
    fn ordering() {
        assert_eq!(Value::Null.compare(&Value::Int(0)), Ordering::Less);
        assert_eq!(Value::Int(2).compare(&Value::Int(10)), Ordering::Less);
        assert_eq!(Value::Int(2).compare(&Value::Float(1.5)), Ordering::Greater);
        assert_eq!(
            Value::String("abc".into()).compare(&Value::String("abd".into())),
            Ordering::Less
        );
        assert_eq!(
            Value::Timestamp(10).compare(&Value::Timestamp(10)),
            Ordering::Equal
        );
    }

    #[test]
    fn group_keys() {
        assert_eq!(Value::Int(7).group_key(), Some(GroupKey::Int(7)));
        assert_eq!(
            Value::String("suite".into()).group_key(),
            Some(GroupKey::Text("suite".into()))
        );
        assert_eq!(Value::Float(1.0).group_key(), None);
        assert_eq!(Value::Null.group_key(), None);
    }

    #[test]
    fn timestamp_rendering() {
        // 2024-01-01 00:00:00 UTC
        let v = Value::Timestamp(1_704_067_200_000_000);
        assert_eq!(v.to_string(), "2024-01-01 00:00:00");
    }
}
