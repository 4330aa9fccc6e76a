//! Shard map storage
//!
//! [`ConfigStore`] reads and writes whole shard documents by database name.
//! [`CouchStore`] talks to a CouchDB node over HTTP; [`MemoryStore`] keeps
//! documents in process.

#![allow(async_fn_in_trait)]

use crate::common::{encode_db_name, Error, Result, Settings};
use crate::shard::ShardDocument;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Store acknowledgement of a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutAck {
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Get/put access to shard documents
pub trait ConfigStore {
    /// Fetch the current shard document of `database`
    async fn get(&self, database: &str) -> Result<ShardDocument>;

    /// Replace the shard document of `database`.
    ///
    /// The write is conditional on `doc.rev`; a stale revision fails with
    /// [`Error::Conflict`].
    async fn put(&self, database: &str, doc: &ShardDocument) -> Result<PutAck>;
}

/// Enumeration of databases on the cluster
pub trait DatabaseLister {
    /// Raw names, possibly physical shard file names
    async fn list_databases(&self) -> Result<Vec<String>>;
}

/// Node-local API flavour, by server version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalApi {
    /// CouchDB 2.3: backdoor admin port
    AdminPort,
    /// CouchDB 3.x: `/_node/_local` on the public port
    NodeLocal,
}

impl LocalApi {
    pub fn for_version(version: &str) -> Result<Self> {
        if version.starts_with("2.3") {
            Ok(LocalApi::AdminPort)
        } else if version.starts_with('3') {
            Ok(LocalApi::NodeLocal)
        } else {
            Err(Error::UnsupportedVersion(version.to_string()))
        }
    }

    /// Base URL under which `_dbs` and `_all_dbs` live
    pub fn base_url(&self, couch_url: &str, settings: &Settings) -> String {
        let couch_url = couch_url.trim_end_matches('/');
        match self {
            LocalApi::AdminPort => format!("{}:{}", couch_url, settings.admin_port),
            LocalApi::NodeLocal => {
                format!("{}:{}/_node/_local", couch_url, settings.default_port)
            }
        }
    }
}

/// CouchDB-backed store
pub struct CouchStore {
    client: Client,
    base_url: String,
    version: String,
}

impl CouchStore {
    /// Probe the server version and pick the matching node-local API
    pub async fn connect(couch_url: &str, settings: &Settings) -> Result<Self> {
        let client = Client::new();
        let root = format!("{}:{}/", couch_url.trim_end_matches('/'), settings.default_port);

        let resp = client.get(&root).send().await?;
        let info: Value = read_json(resp, &root).await?;
        let version = info
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidDocument(format!("{} reported no version", root)))?
            .to_string();

        let api = LocalApi::for_version(&version)?;
        let base_url = api.base_url(couch_url, settings);
        tracing::info!(%version, ?api, "Connected to CouchDB");

        Ok(Self {
            client,
            base_url,
            version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn dbs_url(&self, database: &str) -> String {
        format!("{}/_dbs/{}", self.base_url, encode_db_name(database))
    }
}

impl ConfigStore for CouchStore {
    async fn get(&self, database: &str) -> Result<ShardDocument> {
        let url = self.dbs_url(database);
        tracing::debug!(%database, "Fetching shard map");
        let resp = self.client.get(&url).send().await?;
        let value: Value = read_json(resp, database).await?;
        ShardDocument::from_value(value)
    }

    async fn put(&self, database: &str, doc: &ShardDocument) -> Result<PutAck> {
        let url = self.dbs_url(database);
        let body = serde_json::to_vec(doc)?;
        tracing::debug!(%database, rev = ?doc.rev, "Writing shard map");
        let resp = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        read_ack(resp, database, doc.rev.as_deref()).await
    }
}

impl DatabaseLister for CouchStore {
    async fn list_databases(&self) -> Result<Vec<String>> {
        let url = format!("{}/_all_dbs", self.base_url);
        let resp = self.client.get(&url).send().await?;
        read_json(resp, "_all_dbs").await
    }
}

/// Decode a write acknowledgement; 409 means the revision was stale
async fn read_ack(resp: Response, database: &str, rev: Option<&str>) -> Result<PutAck> {
    if resp.status() == StatusCode::CONFLICT {
        return Err(Error::Conflict {
            database: database.to_string(),
            rev: rev.unwrap_or_default().to_string(),
        });
    }
    read_json(resp, database).await
}

/// Map the HTTP status to an error, or decode the JSON body
async fn read_json<T: serde::de::DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(what.to_string()));
    }
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(serde_json::from_str(&text)?)
}

/// In-process store with CouchDB-like revision checks
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, ShardDocument>>,
    databases: Vec<String>,
    writes: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw names returned by [`DatabaseLister::list_databases`]
    pub fn with_listing(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.databases = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn insert(&self, database: impl Into<String>, doc: ShardDocument) {
        self.docs.lock().unwrap().insert(database.into(), doc);
    }

    pub fn document(&self, database: &str) -> Option<ShardDocument> {
        self.docs.lock().unwrap().get(database).cloned()
    }

    /// Databases written so far, in order
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ConfigStore for MemoryStore {
    async fn get(&self, database: &str) -> Result<ShardDocument> {
        self.document(database)
            .ok_or_else(|| Error::NotFound(database.to_string()))
    }

    async fn put(&self, database: &str, doc: &ShardDocument) -> Result<PutAck> {
        let mut docs = self.docs.lock().unwrap();
        let current_rev = docs.get(database).and_then(|d| d.rev.clone());
        if current_rev != doc.rev {
            return Err(Error::Conflict {
                database: database.to_string(),
                rev: doc.rev.clone().unwrap_or_default(),
            });
        }

        let generation = current_rev
            .as_deref()
            .and_then(|rev| rev.split('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);
        let rev = format!("{}-{:032x}", generation + 1, generation + 1);

        let mut stored = doc.clone();
        stored.rev = Some(rev.clone());
        docs.insert(database.to_string(), stored);
        self.writes.lock().unwrap().push(database.to_string());

        Ok(PutAck {
            ok: true,
            id: doc.id.clone(),
            rev,
        })
    }
}

impl DatabaseLister for MemoryStore {
    async fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.databases.clone())
    }
}
