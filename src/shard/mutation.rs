//! Node add/remove on a shard map
//!
//! Both operations are pure: they read the current document and return a
//! new one, leaving the input untouched so it can serve as the pre-image
//! for the diff.

use crate::common::{Error, Result};
use crate::shard::document::{ChangeAction, ChangelogEntry, ShardDocument};

/// Result of a mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// The new document to write
    Changed(ShardDocument),
    /// Target already in the requested state, nothing to do
    UpToDate,
}

impl Mutation {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Mutation::UpToDate)
    }

    pub fn into_document(self) -> Option<ShardDocument> {
        match self {
            Mutation::Changed(doc) => Some(doc),
            Mutation::UpToDate => None,
        }
    }
}

/// Add `target` to the shard map, copying the ranges of `template`.
///
/// `target` is appended to *every* range in `by_range`, while `by_node`
/// only receives the template's ranges. The two agree when the template
/// hosts every range (full replication); otherwise `by_range` lists the
/// new node on ranges it does not own.
pub fn add_node(doc: &ShardDocument, target: &str, template: &str) -> Result<Mutation> {
    if doc.has_node(target) {
        return Ok(Mutation::UpToDate);
    }

    let template_ranges = doc
        .by_node
        .get(template)
        .cloned()
        .ok_or_else(|| Error::TemplateNotFound {
            database: doc.id.clone(),
            template: template.to_string(),
        })?;

    let mut next = doc.clone();

    let granted: Vec<ChangelogEntry> = doc
        .added_ranges(template)
        .map(|range| ChangelogEntry::new(ChangeAction::Add, range, target))
        .collect();
    next.changelog.extend(granted);

    next.by_node.insert(target.to_string(), template_ranges);

    for nodes in next.by_range.values_mut() {
        nodes.push(target.to_string());
    }

    Ok(Mutation::Changed(next))
}

/// Remove every shard of `target` from the shard map.
///
/// Each range the changelog ever granted to `target` gets a `remove` entry;
/// earlier history is kept.
pub fn remove_node(doc: &ShardDocument, target: &str) -> Mutation {
    if !doc.has_node(target) {
        return Mutation::UpToDate;
    }

    let mut next = doc.clone();

    let revoked: Vec<ChangelogEntry> = doc
        .added_ranges(target)
        .map(|range| ChangelogEntry::new(ChangeAction::Remove, range, target))
        .collect();
    next.changelog.extend(revoked);

    next.by_node.remove(target);

    for nodes in next.by_range.values_mut() {
        nodes.retain(|n| n != target);
    }

    Mutation::Changed(next)
}
