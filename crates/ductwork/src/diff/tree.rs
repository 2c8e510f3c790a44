//! Structural diff tree produced by comparing configurations.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A key present on both sides with differing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedEntry {
    pub key: String,
    pub old: String,
    pub new: String,
}

/// A structural diff over nested configurations.
///
/// Leaf entries record added, removed and changed keys with rendered values;
/// children group further diffs under a named scope, typically an entity name
/// or a nested configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffTree {
    /// Keys present on the desired side only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    additions: Vec<(String, String)>,

    /// Keys present on the observed side only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    removals: Vec<(String, String)>,

    /// Keys whose values differ between the two sides.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    changes: Vec<ChangedEntry>,

    /// Child diffs keyed by scope name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, DiffTree>,
}

impl DiffTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key present only on the desired side.
    pub fn add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additions.push((key.into(), value.into()));
        self
    }

    /// Records a key present only on the observed side.
    pub fn remove(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.removals.push((key.into(), value.into()));
        self
    }

    /// Records a key whose value differs between the two sides.
    pub fn change(
        mut self,
        key: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        self.changes.push(ChangedEntry {
            key: key.into(),
            old: old.into(),
            new: new.into(),
        });
        self
    }

    /// Attaches a child diff under `name`, merging with any child already
    /// present under that name.
    pub fn with_child(mut self, name: impl Into<String>, child: DiffTree) -> Self {
        let name = name.into();
        let merged = match self.children.remove(&name) {
            Some(existing) => existing.join(child),
            None => child,
        };
        self.children.insert(name, merged);
        self
    }

    /// Merges two diffs without loss. Leaf entries are concatenated and
    /// children with the same name are joined recursively.
    pub fn join(mut self, other: DiffTree) -> Self {
        self.additions.extend(other.additions);
        self.removals.extend(other.removals);
        self.changes.extend(other.changes);
        for (name, child) in other.children {
            self = self.with_child(name, child);
        }
        self
    }

    /// True when no leaf entry exists at any depth. An empty diff means the
    /// two compared configurations are structurally equal.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
            && self.removals.is_empty()
            && self.changes.is_empty()
            && self.children.values().all(DiffTree::is_empty)
    }

    pub fn additions(&self) -> &[(String, String)] {
        &self.additions
    }

    pub fn removals(&self) -> &[(String, String)] {
        &self.removals
    }

    pub fn changes(&self) -> &[ChangedEntry] {
        &self.changes
    }

    pub fn children(&self) -> &BTreeMap<String, DiffTree> {
        &self.children
    }

    /// Returns the child diff under `name`, if any.
    pub fn child(&self, name: &str) -> Option<&DiffTree> {
        self.children.get(name)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        for (key, value) in &self.additions {
            writeln!(f, "{}+ {}: {}", pad, key, value)?;
        }
        for (key, value) in &self.removals {
            writeln!(f, "{}- {}: {}", pad, key, value)?;
        }
        for entry in &self.changes {
            writeln!(f, "{}~ {}: {} -> {}", pad, entry.key, entry.old, entry.new)?;
        }
        for (name, child) in &self.children {
            if child.is_empty() {
                continue;
            }
            writeln!(f, "{}{}:", pad, name)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for DiffTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
