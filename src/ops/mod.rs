//! Ops commands for shard map changes

pub mod apply;
pub mod confirm;
pub mod select;
pub mod store;

pub use apply::{ApplyPipeline, Outcome, RunReport};
pub use confirm::{AutoConfirm, Confirmer, TerminalConfirmer};
pub use select::select_databases;
pub use store::{ConfigStore, CouchStore, DatabaseLister, LocalApi, MemoryStore, PutAck};
