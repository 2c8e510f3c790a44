//! Recursive value type for connector configurations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An ordered key-value configuration, the shape every connector
/// configuration takes after parsing.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single configuration value: a scalar, a sequence or a nested map.
///
/// Maps are `BTreeMap`s so iteration order is deterministic wherever a
/// configuration is rendered or compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// Returns the nested map if this value is one.
    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(value) => write!(f, "{}", value),
            ConfigValue::Number(value) => write!(f, "{}", value),
            ConfigValue::String(value) => write!(f, "{}", value),
            // Containers render as compact JSON.
            other => write!(f, "{}", serde_json::Value::from(other.clone())),
        }
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(value) => ConfigValue::Bool(value),
            serde_json::Value::Number(value) => ConfigValue::Number(value),
            serde_json::Value::String(value) => ConfigValue::String(value),
            serde_json::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(entries) => ConfigValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, ConfigValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::Bool(value) => serde_json::Value::Bool(value),
            ConfigValue::Number(value) => serde_json::Value::Number(value),
            ConfigValue::String(value) => serde_json::Value::String(value),
            ConfigValue::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            ConfigValue::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        ConfigValue::Number(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_round_trip() {
        let json = serde_json::json!({
            "host": "localhost",
            "port": 5432,
            "ssl": false,
            "tunnel": {"method": "none"},
            "schemas": ["public", "audit"],
        });
        let value = ConfigValue::from(json.clone());
        assert!(value.is_map());
        assert_eq!(serde_json::Value::from(value), json);
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(ConfigValue::Null.to_string(), "null");
        assert_eq!(ConfigValue::from(true).to_string(), "true");
        assert_eq!(ConfigValue::from(5432i64).to_string(), "5432");
        assert_eq!(ConfigValue::from("localhost").to_string(), "localhost");
    }

    #[test]
    fn test_display_containers_as_json() {
        let value = ConfigValue::from(serde_json::json!({"a": [1, 2]}));
        assert_eq!(value.to_string(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let map: ConfigMap = serde_yaml::from_str(
            r#"
host: localhost
port: 5432
ssl: true
replication:
  method: logical
"#,
        )
        .unwrap();
        assert_eq!(map.get("host"), Some(&ConfigValue::from("localhost")));
        assert_eq!(map.get("port"), Some(&ConfigValue::from(5432i64)));
        assert!(map.get("replication").unwrap().is_map());
    }
}
