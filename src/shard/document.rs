//! Shard map document
//!
//! One document per database, stored in the node-local `_dbs` database.
//! It records shard placement three ways:
//! - `changelog`: append-only history of `[action, range, node]` events
//! - `by_node`: node → ranges it hosts
//! - `by_range`: range → nodes hosting it, in the order they joined

use crate::common::{is_range_id, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Placement event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Remove,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Add => write!(f, "add"),
            ChangeAction::Remove => write!(f, "remove"),
        }
    }
}

/// One changelog event, stored on the wire as `[action, range, node]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(ChangeAction, String, String)",
    into = "(ChangeAction, String, String)"
)]
pub struct ChangelogEntry {
    pub action: ChangeAction,
    pub range: String,
    pub node: String,
}

impl ChangelogEntry {
    pub fn new(action: ChangeAction, range: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            action,
            range: range.into(),
            node: node.into(),
        }
    }
}

impl From<(ChangeAction, String, String)> for ChangelogEntry {
    fn from((action, range, node): (ChangeAction, String, String)) -> Self {
        Self { action, range, node }
    }
}

impl From<ChangelogEntry> for (ChangeAction, String, String) {
    fn from(entry: ChangelogEntry) -> Self {
        (entry.action, entry.range, entry.node)
    }
}

/// Shard allocation document for a single database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardDocument {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Suffix of the shard file names, as ASCII codes
    pub shard_suffix: Vec<u8>,

    pub changelog: Vec<ChangelogEntry>,

    pub by_node: BTreeMap<String, Vec<String>>,

    pub by_range: BTreeMap<String, Vec<String>>,

    /// Any other fields (`props`, ...), written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A broken invariant found by [`ShardDocument::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Node listed in `by_node` without any range
    EmptyNode(String),
    /// `by_node` says the node hosts the range, `by_range` disagrees
    MissingFromRange { node: String, range: String },
    /// Owned range with no matching `add` in the changelog
    MissingChangelog { node: String, range: String },
    /// Range id not of the form `<hex8>-<hex8>`
    MalformedRange(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::EmptyNode(node) => write!(f, "node {} has no ranges", node),
            Violation::MissingFromRange { node, range } => {
                write!(f, "node {} owns {} but is not listed in by_range", node, range)
            }
            Violation::MissingChangelog { node, range } => {
                write!(f, "node {} owns {} without an add changelog entry", node, range)
            }
            Violation::MalformedRange(range) => write!(f, "malformed range id {}", range),
        }
    }
}

impl ShardDocument {
    /// Parse a document fetched from the store
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to a JSON tree (used for diffing and writing)
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Suffix as text, e.g. `.1545033124`
    pub fn suffix_str(&self) -> String {
        String::from_utf8_lossy(&self.shard_suffix).into_owned()
    }

    /// Does `node` host any shard of this database?
    pub fn has_node(&self, node: &str) -> bool {
        self.by_node.contains_key(node)
    }

    /// Ranges granted to `node` by `add` events, in changelog order
    pub fn added_ranges<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.changelog
            .iter()
            .filter(move |e| e.action == ChangeAction::Add && e.node == node)
            .map(|e| e.range.as_str())
    }

    /// Check the consistency of the three views.
    ///
    /// Returns every violation found; an empty list means the document is
    /// consistent.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        let granted: HashSet<(&str, &str)> = self
            .changelog
            .iter()
            .filter(|e| e.action == ChangeAction::Add)
            .map(|e| (e.node.as_str(), e.range.as_str()))
            .collect();

        for (node, ranges) in &self.by_node {
            if ranges.is_empty() {
                violations.push(Violation::EmptyNode(node.clone()));
            }
            for range in ranges {
                let listed = self
                    .by_range
                    .get(range)
                    .is_some_and(|nodes| nodes.contains(node));
                if !listed {
                    violations.push(Violation::MissingFromRange {
                        node: node.clone(),
                        range: range.clone(),
                    });
                }
                if !granted.contains(&(node.as_str(), range.as_str())) {
                    violations.push(Violation::MissingChangelog {
                        node: node.clone(),
                        range: range.clone(),
                    });
                }
            }
        }

        for range in self.by_range.keys() {
            if !is_range_id(range) {
                violations.push(Violation::MalformedRange(range.clone()));
            }
        }

        violations
    }
}
