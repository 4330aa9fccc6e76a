//! Target database selection

use crate::common::{normalize_database_name, PipelineOptions, Result};
use crate::ops::store::DatabaseLister;

/// Resolve the databases a run applies to.
///
/// With `all`, every database on the cluster except the reserved ones, shard
/// file names folded into their logical name and deduplicated in first-seen
/// order. Otherwise the single named database, or nothing.
pub async fn select_databases<L: DatabaseLister>(
    lister: &L,
    options: &PipelineOptions,
) -> Result<Vec<String>> {
    if !options.all {
        return Ok(options.database.iter().cloned().collect());
    }

    let raw = lister.list_databases().await?;
    let mut selected: Vec<String> = Vec::new();
    for name in raw.iter().map(|n| normalize_database_name(n)) {
        if options.reserved_databases.iter().any(|r| r == name) {
            continue;
        }
        if !selected.iter().any(|s| s == name) {
            selected.push(name.to_string());
        }
    }

    tracing::info!(count = selected.len(), "Selected databases");
    Ok(selected)
}
