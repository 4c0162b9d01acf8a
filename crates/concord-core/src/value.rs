//! Tagged-union value tree used for structural comparison.
//!
//! A [`CanonicalPolicy`](crate::CanonicalPolicy) is projected into a [`Value`]
//! tree with a fixed field order so that the diff engine can walk it without
//! knowing the policy schema.

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A structural value: null, bool, number, string, list or ordered map.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// String value.
    String(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Map with insertion-ordered keys.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Creates an empty map value.
    #[must_use]
    pub const fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Appends an entry to a map value and returns it.
    ///
    /// Calling this on a non-map value leaves the value unchanged.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Self>) -> Self {
        if let Self::Map(entries) = &mut self {
            entries.push((key.into(), value.into()));
        }
        self
    }

    /// Looks up a key in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Looks up a dotted path (e.g. `Conditions.Users.IncludeUsers`).
    #[must_use]
    pub fn pointer(&self, path: &str) -> Option<&Self> {
        path.split('.').try_fold(self, |current, key| current.get(key))
    }

    /// Replaces the value stored under `key` in a map value.
    ///
    /// Returns `false` if the value is not a map or has no such key.
    pub fn set(&mut self, key: &str, value: Self) -> bool {
        if let Self::Map(entries) = self {
            if let Some(slot) = entries.iter_mut().find(|(k, _)| k == key) {
                slot.1 = value;
                return true;
            }
        }
        false
    }

    /// Returns the string content if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list items if this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true if this is a map value.
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Counts the comparable leaves of the tree.
    ///
    /// Maps are descended into; every scalar and every list counts as one leaf.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Map(entries) => entries.iter().map(|(_, v)| v.leaf_count()).sum(),
            _ => 1,
        }
    }

    /// Returns a stable textual key used to order values inside multisets.
    #[must_use]
    pub fn sort_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl Serialize for Value {
    #[allow(clippy::cast_possible_truncation)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<&[String]> for Value {
    fn from(items: &[String]) -> Self {
        Self::List(items.iter().map(Self::from).collect())
    }
}

impl From<&Vec<String>> for Value {
    fn from(items: &Vec<String>) -> Self {
        Self::from(items.as_slice())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_builder_and_pointer() {
        let value = Value::map()
            .with("State", "enabled")
            .with("Conditions", Value::map().with("ClientAppTypes", Value::List(vec![])));

        assert_eq!(value.get("State"), Some(&Value::from("enabled")));
        assert_eq!(
            value.pointer("Conditions.ClientAppTypes"),
            Some(&Value::List(vec![]))
        );
        assert!(value.pointer("Conditions.Missing").is_none());
    }

    #[test]
    fn test_leaf_count_treats_lists_as_single_leaf() {
        let value = Value::map()
            .with("A", "x")
            .with("B", Value::List(vec![Value::from("1"), Value::from("2")]))
            .with("C", Value::map().with("D", true).with("E", Value::Null));
        assert_eq!(value.leaf_count(), 4);
    }

    #[test]
    fn test_display_formats_integers_without_fraction() {
        assert_eq!(Value::Number(10.0).to_string(), "10");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Bool(true)]).to_string(),
            "[\"a\", true]"
        );
    }

    #[test]
    fn test_serialize_preserves_map_order() {
        let value = Value::map().with("Zeta", 1.0).with("Alpha", Value::Null);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"Zeta":1,"Alpha":null}"#);
    }

    #[test]
    fn test_set_replaces_existing_key_only() {
        let mut value = Value::map().with("DisplayName", "My Policy");
        assert!(value.set("DisplayName", Value::from("my policy")));
        assert!(!value.set("Missing", Value::Null));
        assert_eq!(value.get("DisplayName"), Some(&Value::from("my policy")));
    }
}
