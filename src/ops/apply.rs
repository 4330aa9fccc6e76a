//! Fetch, mutate, preview, confirm and write shard maps
//!
//! Each database goes through:
//!
//! ```text
//! Fetching → Mutating → Diffing → Skipped
//!                               → AwaitingConfirmation → Applied | Declined
//! ```
//!
//! A declined confirmation ends the whole run; store failures abort it.

use crate::common::{Operation, PipelineOptions, Result};
use crate::ops::confirm::Confirmer;
use crate::ops::store::{ConfigStore, PutAck};
use crate::shard::{add_node, diff, remove_node, render, Mutation, ShardDocument};
use std::io::{Stdout, Write};
use tracing::Instrument;

/// What happened to one database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Node already in the requested state
    UpToDate,
    /// Mutation produced an identical document
    Unchanged,
    /// Template node missing, database skipped
    TemplateMissing(String),
    /// Written to the store
    Applied(PutAck),
    /// Operator said no; the run stops here
    Declined,
}

/// Per-database outcomes of a run, in processing order
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(String, Outcome)>,
}

impl RunReport {
    pub fn declined(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| *o == Outcome::Declined)
    }

    pub fn applied(&self) -> Vec<&str> {
        self.matching(|o| matches!(o, Outcome::Applied(_)))
    }

    pub fn up_to_date(&self) -> Vec<&str> {
        self.matching(|o| matches!(o, Outcome::UpToDate | Outcome::Unchanged))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.matching(|o| matches!(o, Outcome::TemplateMissing(_)))
    }

    /// 0 unless the run was declined
    pub fn exit_code(&self) -> i32 {
        if self.declined() {
            1
        } else {
            0
        }
    }

    fn matching(&self, pred: impl Fn(&Outcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(db, _)| db.as_str())
            .collect()
    }
}

/// Sequential apply of one node change over a list of databases
pub struct ApplyPipeline<S, C, W = Stdout> {
    store: S,
    confirmer: C,
    options: PipelineOptions,
    out: W,
}

impl<S: ConfigStore, C: Confirmer> ApplyPipeline<S, C, Stdout> {
    pub fn new(store: S, confirmer: C, options: PipelineOptions) -> Self {
        Self::with_output(store, confirmer, options, std::io::stdout())
    }
}

impl<S, C, W> ApplyPipeline<S, C, W> {
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sink the previews were written to
    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<S: ConfigStore, C: Confirmer, W: Write> ApplyPipeline<S, C, W> {
    /// Pipeline printing previews and acknowledgements to `out`
    pub fn with_output(store: S, confirmer: C, options: PipelineOptions, out: W) -> Self {
        Self {
            store,
            confirmer,
            options,
            out,
        }
    }

    /// Apply to every database in order, stopping at the first decline
    pub async fn run(&mut self, databases: &[String]) -> Result<RunReport> {
        tracing::info!(operation = %self.options.operation, count = databases.len(), "Starting run");

        let mut report = RunReport::default();
        for database in databases {
            let outcome = self.apply(database).await?;
            let declined = outcome == Outcome::Declined;
            report.outcomes.push((database.clone(), outcome));
            if declined {
                break;
            }
        }

        tracing::info!(
            applied = report.applied().len(),
            up_to_date = report.up_to_date().len(),
            skipped = report.skipped().len(),
            declined = report.declined(),
            "Run finished"
        );
        Ok(report)
    }

    /// Apply to a single database
    pub async fn apply(&mut self, database: &str) -> Result<Outcome> {
        let span = tracing::info_span!("apply", %database);
        self.apply_inner(database).instrument(span).await
    }

    async fn apply_inner(&mut self, database: &str) -> Result<Outcome> {
        let before = self.store.get(database).await?;
        for violation in before.validate() {
            tracing::warn!(%violation, "Shard map inconsistent before change");
        }

        let after = match self.mutate(&before) {
            Ok(Mutation::Changed(doc)) => doc,
            Ok(Mutation::UpToDate) => {
                tracing::info!("Already up to date");
                writeln!(self.out, "Database {} is already up to date.", database)?;
                return Ok(Outcome::UpToDate);
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(error = %e, "Skipping database");
                writeln!(self.out, "Skipping {}: {}", database, e)?;
                return Ok(Outcome::TemplateMissing(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        self.commit(database, &before, &after).await
    }

    /// Preview `after` against `before`, confirm, then write `after`.
    ///
    /// Nothing is written when the two documents are equal. The write
    /// carries the `_rev` fetched with `before`; the store rejects it with
    /// [`crate::Error::Conflict`] if the document moved on in between.
    pub async fn commit(
        &mut self,
        database: &str,
        before: &ShardDocument,
        after: &ShardDocument,
    ) -> Result<Outcome> {
        let patch = diff(&before.to_value()?, &after.to_value()?);
        if patch.is_empty() {
            tracing::info!("No changes");
            return Ok(Outcome::Unchanged);
        }
        let preview = render(&patch)?;
        writeln!(self.out, "{}", preview)?;

        let confirmed =
            self.options.auto_confirm || self.confirmer.confirm(database, &preview)?;
        if !confirmed {
            tracing::warn!("Change declined, aborting run");
            return Ok(Outcome::Declined);
        }

        let ack = self.store.put(database, after).await?;
        tracing::info!(rev = %ack.rev, "Applied");
        writeln!(self.out, "{}", serde_json::to_string(&ack)?)?;

        Ok(Outcome::Applied(ack))
    }

    fn mutate(&self, doc: &ShardDocument) -> Result<Mutation> {
        match &self.options.operation {
            Operation::Add { node, template } => add_node(doc, node, template),
            Operation::Remove { node } => Ok(remove_node(doc, node)),
        }
    }
}
