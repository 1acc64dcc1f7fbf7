//! Permissive string-keyed parameter storage.

use crate::value::Value;
use indexmap::IndexMap;

/// A mapping from string keys to values.
///
/// This is the deliberately permissive base layer beneath every request
/// view: it stores anything and never fails. Validation belongs to the
/// views built on top of it.
///
/// Keys are unique and `set` overwrites. `get` on a missing key returns
/// `None` rather than failing; [`get_or`](Self::get_or) substitutes a
/// caller-supplied default.
///
/// # Example
///
/// ```
/// use hestia_core::{ParameterBag, Value};
///
/// let mut bag = ParameterBag::<Value>::new();
/// bag.set("page", 2).set("sort", "name");
///
/// assert!(bag.has("page"));
/// assert_eq!(bag.get("sort"), Some(&Value::from("name")));
/// assert_eq!(bag.get_or("limit", Value::from(20)), Value::from(20));
///
/// bag.remove("page");
/// assert_eq!(bag.count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBag<V = Value> {
    parameters: IndexMap<String, V>,
}

impl<V> Default for ParameterBag<V> {
    fn default() -> Self {
        Self {
            parameters: IndexMap::new(),
        }
    }
}

impl<V> ParameterBag<V> {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<V>) -> &mut Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.parameters.get(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.parameters.swap_remove(key)
    }

    /// Returns every parameter.
    #[must_use]
    pub fn all(&self) -> &IndexMap<String, V> {
        &self.parameters
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn count(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if the bag holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Removes every parameter.
    pub fn clear(&mut self) {
        self.parameters.clear();
    }

    /// Iterates over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consumes the bag, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, V> {
        self.parameters
    }
}

impl<V: Clone> ParameterBag<V> {
    /// Returns the value under `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: V) -> V {
        self.parameters.get(key).cloned().unwrap_or(default)
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for ParameterBag<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parameters: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<V> From<IndexMap<String, V>> for ParameterBag<V> {
    fn from(parameters: IndexMap<String, V>) -> Self {
        Self { parameters }
    }
}
