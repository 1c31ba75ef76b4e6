use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A flat set of gateway form fields. Keys are kept sorted, which is the canonical order the checksum is computed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayParams(BTreeMap<String, String>);

impl GatewayParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: ToString>(&mut self, key: K, value: V) -> Option<String> {
        self.0.insert(key.into(), value.to_string())
    }

    pub fn with<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GatewayParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
