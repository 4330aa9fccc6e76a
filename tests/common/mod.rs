//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use shardkit::ops::Confirmer;
use shardkit::{MemoryStore, Operation, PipelineOptions, ShardDocument};

pub const LOCAL: &str = "couchdb@localhost";
pub const FQDN: &str = "couchdb@f.q.d.n";

pub fn config() -> Value {
    json!({
        "_id": "_users",
        "_rev": "1-90ee291e872701520077b4494bb66186",
        "shard_suffix": [46, 49, 53, 52, 53, 48, 51, 51, 49, 50, 52],
        "changelog": [
            ["add", "00000000-7fffffff", LOCAL],
            ["add", "80000000-ffffffff", LOCAL]
        ],
        "by_node": { LOCAL: ["00000000-7fffffff", "80000000-ffffffff"] },
        "by_range": {
            "00000000-7fffffff": [LOCAL],
            "80000000-ffffffff": [LOCAL]
        }
    })
}

pub fn config_with_node() -> Value {
    json!({
        "_id": "_users",
        "_rev": "1-90ee291e872701520077b4494bb66186",
        "shard_suffix": [46, 49, 53, 52, 53, 48, 51, 51, 49, 50, 52],
        "changelog": [
            ["add", "00000000-7fffffff", LOCAL],
            ["add", "80000000-ffffffff", LOCAL],
            ["add", "00000000-7fffffff", FQDN],
            ["add", "80000000-ffffffff", FQDN]
        ],
        "by_node": {
            LOCAL: ["00000000-7fffffff", "80000000-ffffffff"],
            FQDN: ["00000000-7fffffff", "80000000-ffffffff"]
        },
        "by_range": {
            "00000000-7fffffff": [LOCAL, FQDN],
            "80000000-ffffffff": [LOCAL, FQDN]
        }
    })
}

pub fn doc(value: Value) -> ShardDocument {
    ShardDocument::from_value(value).unwrap()
}

/// Same shard map under another database id
pub fn doc_for(database: &str, value: Value) -> ShardDocument {
    let mut doc = doc(value);
    doc.id = database.to_string();
    doc
}

pub fn store_with(dbs: &[(&str, Value)]) -> MemoryStore {
    let store = MemoryStore::new();
    for (name, value) in dbs {
        store.insert(*name, doc_for(name, value.clone()));
    }
    store
}

pub fn add_options() -> PipelineOptions {
    PipelineOptions::new(
        Operation::Add {
            node: FQDN.into(),
            template: LOCAL.into(),
        },
        "http://localhost",
    )
}

pub fn remove_options(node: &str) -> PipelineOptions {
    PipelineOptions::new(Operation::Remove { node: node.into() }, "http://localhost")
}

/// Answers from a fixed script and records what it was asked
#[derive(Default)]
pub struct Scripted {
    pub answers: Vec<bool>,
    pub asked: Vec<String>,
}

impl Scripted {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.to_vec(),
            asked: Vec::new(),
        }
    }
}

impl Confirmer for Scripted {
    fn confirm(&mut self, database: &str, _diff: &str) -> shardkit::Result<bool> {
        self.asked.push(database.to_string());
        Ok(if self.answers.is_empty() {
            false
        } else {
            self.answers.remove(0)
        })
    }
}
