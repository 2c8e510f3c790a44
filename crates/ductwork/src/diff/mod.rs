//! Structural diffing of connector configurations.

mod tree;
mod value;

pub use tree::{ChangedEntry, DiffTree};
pub use value::{ConfigMap, ConfigValue};

use std::collections::BTreeSet;

/// Computes the structural diff between a desired and an observed
/// configuration.
///
/// Keys only in `desired` become additions, keys only in `observed` become
/// removals and keys present on both sides with differing values become
/// changes. When both sides hold a map the comparison recurses and a
/// non-empty result is attached as a child diff under the key. The returned
/// tree is empty exactly when the two maps are structurally equal.
pub fn diff_configs(desired: &ConfigMap, observed: &ConfigMap) -> DiffTree {
    let mut diff = DiffTree::new();

    let mut keys: BTreeSet<&String> = desired.keys().collect();
    keys.extend(observed.keys());

    for key in keys {
        match (desired.get(key), observed.get(key)) {
            (Some(ConfigValue::Map(desired_child)), Some(ConfigValue::Map(observed_child))) => {
                let child = diff_configs(desired_child, observed_child);
                if !child.is_empty() {
                    diff = diff.with_child(key.clone(), child);
                }
            }
            (Some(desired_value), Some(observed_value)) => {
                if desired_value != observed_value {
                    diff = diff.change(
                        key.clone(),
                        observed_value.to_string(),
                        desired_value.to_string(),
                    );
                }
            }
            (Some(desired_value), None) => {
                diff = diff.add(key.clone(), desired_value.to_string());
            }
            (None, Some(observed_value)) => {
                diff = diff.remove(key.clone(), observed_value.to_string());
            }
            (None, None) => {}
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, ConfigValue)]) -> ConfigMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_equal_maps_produce_empty_diff() {
        let a = map(&[("host", "localhost".into()), ("port", 5432i64.into())]);
        let b = a.clone();
        assert!(diff_configs(&a, &b).is_empty());
    }

    #[test]
    fn test_added_and_removed_keys() {
        let desired = map(&[("host", "localhost".into())]);
        let observed = map(&[("port", 5432i64.into())]);
        let diff = diff_configs(&desired, &observed);
        assert_eq!(diff.additions(), &[("host".into(), "localhost".into())]);
        assert_eq!(diff.removals(), &[("port".into(), "5432".into())]);
    }

    #[test]
    fn test_changed_key_records_old_then_new() {
        let desired = map(&[("port", 5433i64.into())]);
        let observed = map(&[("port", 5432i64.into())]);
        let diff = diff_configs(&desired, &observed);
        let change = &diff.changes()[0];
        assert_eq!(change.key, "port");
        assert_eq!(change.old, "5432");
        assert_eq!(change.new, "5433");
    }

    #[test]
    fn test_nested_maps_recurse_into_children() {
        let desired = map(&[(
            "tunnel",
            ConfigValue::from(serde_json::json!({"method": "ssh", "port": 22})),
        )]);
        let observed = map(&[(
            "tunnel",
            ConfigValue::from(serde_json::json!({"method": "none", "port": 22})),
        )]);
        let diff = diff_configs(&desired, &observed);
        assert!(diff.additions().is_empty());
        let child = diff.child("tunnel").unwrap();
        assert_eq!(child.changes()[0].key, "method");
        assert_eq!(child.changes()[0].old, "none");
        assert_eq!(child.changes()[0].new, "ssh");
    }

    #[test]
    fn test_equal_nested_maps_attach_no_child() {
        let a = map(&[(
            "tunnel",
            ConfigValue::from(serde_json::json!({"method": "ssh"})),
        )]);
        let diff = diff_configs(&a, &a.clone());
        assert!(diff.child("tunnel").is_none());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_map_versus_scalar_is_a_change() {
        let desired = map(&[("tunnel", ConfigValue::from(serde_json::json!({"m": 1})))]);
        let observed = map(&[("tunnel", "none".into())]);
        let diff = diff_configs(&desired, &observed);
        assert_eq!(diff.changes()[0].old, "none");
        assert_eq!(diff.changes()[0].new, r#"{"m":1}"#);
    }

    #[test]
    fn test_sequences_compare_as_whole_values() {
        let desired = map(&[("schemas", ConfigValue::from(serde_json::json!(["a", "b"])))]);
        let observed = map(&[("schemas", ConfigValue::from(serde_json::json!(["a"])))]);
        let diff = diff_configs(&desired, &observed);
        assert_eq!(diff.changes().len(), 1);
    }
}
