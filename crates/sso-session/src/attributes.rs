//! Namespaced attribute bag.
//!
//! Handlers stash per-flow data in sessions and TGTs under a
//! (namespace, key) pair. Values are a small closed set of shapes so the bag
//! survives a JSON round trip through the record store unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value stored in an [`AttributeBag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// A string.
    Text(String),
    /// A signed integer.
    Integer(i64),
    /// A boolean.
    Bool(bool),
    /// A list of strings.
    List(Vec<String>),
}

impl AttributeValue {
    /// Returns the string value, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list value, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Attributes keyed by (namespace, key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    entries: BTreeMap<String, BTreeMap<String, AttributeValue>>,
}

impl AttributeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, namespace: &str, key: &str) -> Option<&AttributeValue> {
        self.entries.get(namespace).and_then(|ns| ns.get(key))
    }

    /// Gets a text value.
    #[must_use]
    pub fn get_str(&self, namespace: &str, key: &str) -> Option<&str> {
        self.get(namespace, key).and_then(AttributeValue::as_str)
    }

    /// Gets an integer value.
    #[must_use]
    pub fn get_integer(&self, namespace: &str, key: &str) -> Option<i64> {
        self.get(namespace, key).and_then(AttributeValue::as_integer)
    }

    /// Gets a boolean value.
    #[must_use]
    pub fn get_bool(&self, namespace: &str, key: &str) -> Option<bool> {
        self.get(namespace, key).and_then(AttributeValue::as_bool)
    }

    /// Gets a list value.
    #[must_use]
    pub fn get_list(&self, namespace: &str, key: &str) -> Option<&[String]> {
        self.get(namespace, key).and_then(AttributeValue::as_list)
    }

    /// Stores a value, returning the previous one.
    pub fn put(
        &mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.entries
            .entry(namespace.into())
            .or_default()
            .insert(key.into(), value.into())
    }

    /// Removes a value, returning it.
    pub fn remove(&mut self, namespace: &str, key: &str) -> Option<AttributeValue> {
        let ns = self.entries.get_mut(namespace)?;
        let removed = ns.remove(key);
        if ns.is_empty() {
            self.entries.remove(namespace);
        }
        removed
    }

    /// Returns true if a value is stored under (namespace, key).
    #[must_use]
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.get(namespace, key).is_some()
    }

    /// Iterates over the keys and values of one namespace.
    pub fn namespace(&self, namespace: &str) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries
            .get(namespace)
            .into_iter()
            .flat_map(|ns| ns.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Removes a whole namespace.
    pub fn remove_namespace(&mut self, namespace: &str) {
        self.entries.remove(namespace);
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
