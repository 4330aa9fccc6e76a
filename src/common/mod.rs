//! Common utilities and types shared across shardkit

pub mod config;
pub mod error;
pub mod utils;

pub use config::{Operation, PipelineOptions, Settings};
pub use error::{Error, Result};
pub use utils::{encode_db_name, is_range_id, normalize_database_name};
