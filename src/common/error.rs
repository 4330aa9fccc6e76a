//! Error types for shardkit

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Shard Map Errors ===
    #[error("Template node {template} has no shards in database {database}")]
    TemplateNotFound { database: String, template: String },

    #[error("Invalid shard document: {0}")]
    InvalidDocument(String),

    // === Store Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document for {database} changed since it was fetched (rev {rev})")]
    Conflict { database: String, rev: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("CouchDB version {0} not yet supported")]
    UnsupportedVersion(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Does this error abort the whole run?
    ///
    /// A missing template only skips the database it was found in.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::TemplateNotFound { .. })
    }

    /// Process exit code for a run that ended with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) => 64,
            _ => 2,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::Http {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => Error::Transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidDocument(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
