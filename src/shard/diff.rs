//! Structural diff between two JSON documents
//!
//! Produces JSON Patch style operations (RFC 6902 `add`, `remove`,
//! `replace`). An empty patch means the documents are equal.

use crate::common::Result;
use serde::Serialize;
use serde_json::Value;

/// One patch operation, addressed by JSON Pointer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. } | PatchOp::Remove { path } | PatchOp::Replace { path, .. } => {
                path
            }
        }
    }
}

/// Compute the patch turning `before` into `after`
pub fn diff(before: &Value, after: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_into(String::new(), before, after, &mut ops);
    ops
}

/// Pretty-print a patch for review
pub fn render(ops: &[PatchOp]) -> Result<String> {
    Ok(serde_json::to_string_pretty(ops)?)
}

fn diff_into(path: String, before: &Value, after: &Value, ops: &mut Vec<PatchOp>) {
    if before == after {
        return;
    }

    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for key in old.keys().filter(|k| !new.contains_key(*k)) {
                ops.push(PatchOp::Remove {
                    path: child(&path, key),
                });
            }
            for (key, old_value) in old {
                if let Some(new_value) = new.get(key) {
                    diff_into(child(&path, key), old_value, new_value, ops);
                }
            }
            for (key, new_value) in new.iter().filter(|(k, _)| !old.contains_key(*k)) {
                ops.push(PatchOp::Add {
                    path: child(&path, key),
                    value: new_value.clone(),
                });
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let common = old.len().min(new.len());
            for i in 0..common {
                diff_into(child(&path, &i.to_string()), &old[i], &new[i], ops);
            }
            for (i, value) in new.iter().enumerate().skip(common) {
                ops.push(PatchOp::Add {
                    path: child(&path, &i.to_string()),
                    value: value.clone(),
                });
            }
            // Highest index first so each removal leaves earlier indices valid
            for i in (common..old.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: child(&path, &i.to_string()),
                });
            }
        }
        _ => ops.push(PatchOp::Replace {
            path,
            value: after.clone(),
        }),
    }
}

fn child(parent: &str, token: &str) -> String {
    format!("{}/{}", parent, token.replace('~', "~0").replace('/', "~1"))
}
