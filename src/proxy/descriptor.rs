//! Ordered proxy descriptor.
//!
//! Clash configs are meant to be read and diffed by people, so the key order
//! of every proxy is part of the output contract. The descriptor is a plain
//! sequence of entries and serializes in exactly that order.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyDescriptor {
    entries: Vec<(String, Value)>,
}

impl ProxyDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Keys are expected to be unique; a repeated key is
    /// replaced in place so the first insertion position wins.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`ProxyDescriptor::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// Convert a YAML mapping, keeping its order. Returns `None` when any key
    /// is not a string.
    pub fn from_mapping(mapping: serde_yaml::Mapping) -> Option<Self> {
        let mut descriptor = Self::new();
        for (key, value) in mapping {
            match key {
                Value::String(key) => descriptor.push(key, value),
                _ => return None,
            }
        }
        Some(descriptor)
    }
}

impl Serialize for ProxyDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Nested mapping value with the given entries in order.
pub fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let mut map = serde_yaml::Mapping::with_capacity(N);
    for (key, value) in entries {
        map.insert(Value::String(key.to_string()), value);
    }
    Value::Mapping(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_insertion_order() {
        let descriptor = ProxyDescriptor::new()
            .with("name", "zeta")
            .with("type", "vless")
            .with("alpn", vec!["h2", "http/1.1"])
            .with("port", 443);
        let yaml = serde_yaml::to_string(&descriptor).unwrap();
        assert_eq!(
            yaml,
            "name: zeta\ntype: vless\nalpn:\n- h2\n- http/1.1\nport: 443\n"
        );
    }

    #[test]
    fn nested_mapping_is_block_style() {
        let descriptor = ProxyDescriptor::new().with(
            "reality-opts",
            mapping([
                ("public-key", Value::from("PKEY")),
                ("short-id", Value::from("ab12")),
            ]),
        );
        let yaml = serde_yaml::to_string(&descriptor).unwrap();
        assert_eq!(yaml, "reality-opts:\n  public-key: PKEY\n  short-id: ab12\n");
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let mut descriptor = ProxyDescriptor::new().with("a", 1).with("b", 2);
        descriptor.push("a", 3);
        assert_eq!(descriptor.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(descriptor.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn from_mapping_preserves_order() {
        let mapping: serde_yaml::Mapping =
            serde_yaml::from_str("name: hk\ntype: ss\nserver: hk.example\nport: 8388\n").unwrap();
        let descriptor = ProxyDescriptor::from_mapping(mapping).unwrap();
        assert_eq!(
            descriptor.keys().collect::<Vec<_>>(),
            ["name", "type", "server", "port"]
        );
        assert_eq!(descriptor.name(), Some("hk"));
    }

    #[test]
    fn from_mapping_rejects_non_string_keys() {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str("1: one\nname: x\n").unwrap();
        assert!(ProxyDescriptor::from_mapping(mapping).is_none());
    }
}
