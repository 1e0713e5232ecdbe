//! Environment entries attached to pipeline nodes
//!
//! Envs keep the order in which they were declared in the pipeline document,
//! so a tree dumped back to YAML lists them the same way.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insertion-ordered `String -> String` mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envs {
    entries: Vec<(String, String)>,
}

impl Envs {
    /// Create an empty set of envs
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous value for the key.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Add an entry (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for Envs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut envs = Envs::new();
        for (key, value) in iter {
            envs.insert(key, value);
        }
        envs
    }
}

impl Serialize for Envs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Envs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EnvsVisitor;

        impl<'de> Visitor<'de> for EnvsVisitor {
            type Value = Envs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of string keys to string values")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Envs, E> {
                Ok(Envs::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Envs, A::Error> {
                let mut envs = Envs::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    envs.insert(key, value);
                }
                Ok(envs)
            }
        }

        deserializer.deserialize_map(EnvsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_declaration_order() {
        let envs = Envs::new()
            .with("FLOW_WORKSPACE", "echo hello")
            .with("FLOW_VERSION", "echo version")
            .with("A", "1");

        let keys: Vec<&str> = envs.keys().collect();
        assert_eq!(keys, vec!["FLOW_WORKSPACE", "FLOW_VERSION", "A"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut envs = Envs::new().with("A", "1").with("B", "2");
        let previous = envs.insert("A", "3");

        assert_eq!(previous, Some("1".to_string()));
        assert_eq!(envs.len(), 2);
        assert_eq!(envs.iter().next(), Some(("A", "3")));
    }

    #[test]
    fn test_yaml_serde_preserves_order() {
        let yaml = "Z: last\nA: first\n";
        let envs: Envs = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(envs.keys().collect::<Vec<_>>(), vec!["Z", "A"]);

        let dumped = serde_yaml::to_string(&envs).unwrap();
        assert_eq!(dumped, yaml);
    }
}
