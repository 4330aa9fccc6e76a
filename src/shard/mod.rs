//! Shard map model, mutation engine and diff

pub mod diff;
pub mod document;
pub mod mutation;

pub use diff::{diff, render, PatchOp};
pub use document::{ChangeAction, ChangelogEntry, ShardDocument, Violation};
pub use mutation::{add_node, remove_node, Mutation};
