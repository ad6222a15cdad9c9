use crate::enrichment::UaClassifier;
use crate::event::LogEvent;
use crate::parse::LineParser;
use crate::store::{EventStore, ResolvedEvent, StoreError};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open log file {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// Lines parsed and committed to storage.
    pub accepted: u64,
    /// Lines that failed parsing.
    pub rejected: u64,
}

/// Streams lines through the parser, buffers accepted events up to
/// `batch_size`, and commits each full batch as one transaction.
///
/// The user-agent cache lives for one ingestion run and is read-through:
/// cache, then storage lookup, then classify-and-insert. Within a run a
/// given raw string resolves to one id and triggers at most one insert.
/// Two runs racing against the same store can still insert duplicates;
/// the store's unique constraint is the backstop.
pub struct Ingestor {
    parser: LineParser,
    classifier: UaClassifier,
    batch_size: usize,
    ua_cache: HashMap<String, Option<i64>>,
}

impl Ingestor {
    pub fn new(parser: LineParser, classifier: UaClassifier, batch_size: usize) -> Self {
        Self {
            parser,
            classifier,
            batch_size: batch_size.max(1),
            ua_cache: HashMap::new(),
        }
    }

    pub fn ingest_file<S: EventStore>(
        &mut self,
        path: &Path,
        store: &mut S,
    ) -> Result<IngestSummary, IngestError> {
        let file = File::open(path).map_err(|e| IngestError::OpenInput {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.run(BufReader::new(file), store)
    }

    pub fn run<R: BufRead, S: EventStore>(
        &mut self,
        mut reader: R,
        store: &mut S,
    ) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();
        let mut batch: Vec<LogEvent> = Vec::with_capacity(self.batch_size);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            // Real-world logs contain the occasional invalid byte; replace
            // rather than abort.
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            match self.parser.parse(line) {
                Ok(event) => {
                    batch.push(event);
                    if batch.len() >= self.batch_size {
                        summary.accepted += self.flush(&mut batch, store);
                    }
                }
                Err(err) => {
                    summary.rejected += 1;
                    tracing::warn!(%err, line, "malformed log line skipped");
                }
            }
        }

        if !batch.is_empty() {
            summary.accepted += self.flush(&mut batch, store);
        }

        tracing::info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            "finished processing input"
        );
        Ok(summary)
    }

    /// Resolve user agents and commit the batch. Returns the number of
    /// events committed; a failed commit drops the batch and returns 0.
    fn flush<S: EventStore>(&mut self, batch: &mut Vec<LogEvent>, store: &mut S) -> u64 {
        let resolved: Vec<ResolvedEvent> = batch
            .drain(..)
            .map(|event| {
                let user_agent_id = self.resolve_user_agent(event.user_agent.clone(), store);
                ResolvedEvent {
                    event,
                    user_agent_id,
                }
            })
            .collect();

        let len = resolved.len() as u64;
        match store.insert_event_batch(&resolved) {
            Ok(()) => {
                tracing::info!(events = len, "inserted log entry batch");
                len
            }
            Err(err) => {
                tracing::error!(%err, events = len, "batch insert failed, events dropped");
                0
            }
        }
    }

    fn resolve_user_agent<S: EventStore>(
        &mut self,
        raw: Option<String>,
        store: &mut S,
    ) -> Option<i64> {
        let raw = raw?;
        if let Some(id) = self.ua_cache.get(&raw) {
            return *id;
        }

        let id = match self.lookup_or_insert(&raw, store) {
            Ok(id) => Some(id),
            Err(err) => {
                // A single bad lookup must not lose the rest of the batch;
                // the event persists without a user-agent reference.
                tracing::warn!(%err, user_agent = raw, "user agent resolution failed");
                None
            }
        };
        self.ua_cache.insert(raw, id);
        id
    }

    fn lookup_or_insert<S: EventStore>(
        &self,
        raw: &str,
        store: &mut S,
    ) -> Result<i64, StoreError> {
        if let Some(id) = store.find_user_agent(raw)? {
            return Ok(id);
        }
        let class = self.classifier.classify(raw);
        store.insert_user_agent(raw, &class)
    }
}
