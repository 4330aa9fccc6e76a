//! Utility functions for shardkit

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Percent-encoding set for database names used as a single path segment
const DB_NAME_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'+');

/// Encode a database name for use in a URL path
pub fn encode_db_name(name: &str) -> String {
    utf8_percent_encode(name, DB_NAME_ENCODE_SET).to_string()
}

/// Map a physical shard file name to its logical database name.
///
/// `shards/00000000-7fffffff/_users.1545033124` becomes `_users`; names
/// that are not shard files are returned unchanged.
pub fn normalize_database_name(raw: &str) -> &str {
    if !raw.contains("shards") {
        return raw;
    }
    let file = raw.rsplit('/').next().unwrap_or(raw);
    file.split('.').next().unwrap_or(file)
}

/// Is `s` a range identifier of the form `<hex8>-<hex8>`?
pub fn is_range_id(s: &str) -> bool {
    let Some((start, end)) = s.split_once('-') else {
        return false;
    };
    let is_hex8 = |part: &str| part.len() == 8 && part.chars().all(|c| c.is_ascii_hexdigit());
    is_hex8(start) && is_hex8(end)
}
