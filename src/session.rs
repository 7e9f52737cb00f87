// SPDX-License-Identifier: Apache-2.0

//! Ingestion orchestration.
//!
//! [`LogIngestor`] is the process-wide entry point. Each `open()` runs one
//! scan pass: load the record set from the cache, decide full-vs-incremental,
//! read dirty files off the runtime via `spawn_blocking`, parse, merge in
//! discovery order, write the merged set back to the cache, and hand the
//! caller an [`IngestionSession`] snapshot.
//!
//! Concurrent openers serialize on one session lock, so two dashboard
//! queries against the same ingestor wait for a single in-flight scan
//! instead of racing the file table and duplicating identifiers. Per-file
//! offsets commit only after that file's records are appended; an abandoned
//! pass never leaves a file half-consumed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{RecordCache, LOGS_CACHE_KEY};
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::parser::{file_label, parser_for, IdSequence, RecordParser};
use crate::reader;
use crate::record::LogRecord;
use crate::tracker::{discover_files, FileSetTracker};

struct IngestState {
    files: FileSetTracker,
    cache: RecordCache,
}

/// Shared ingestion engine for one configured log root.
///
/// Construct once per process (or per dashboard source) and share; the
/// file-state table and record cache live inside and are synchronized by
/// the ingestor itself.
pub struct LogIngestor {
    config: IngestConfig,
    parser: Arc<dyn RecordParser>,
    state: Mutex<IngestState>,
}

impl LogIngestor {
    /// Validate the configuration and build the configured parser variant
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        let parser = parser_for(&config)?;
        let files = FileSetTracker::new(config.root_path.clone(), config.file_pattern.clone());

        Ok(Self {
            config,
            parser,
            state: Mutex::new(IngestState {
                files,
                cache: RecordCache::new(),
            }),
        })
    }

    /// Run one scan pass and return the accumulated record set.
    ///
    /// A cache miss (or an empty cached set) triggers a full scan; a hit
    /// triggers an incremental refresh of dirty files only. Every failure
    /// below the root degrades to an in-band warning record.
    pub async fn open(&self) -> Result<IngestionSession> {
        let mut state = self.state.lock().await;

        let mut records: Vec<LogRecord> = state
            .cache
            .get(LOGS_CACHE_KEY)
            .map(|cached| cached.to_vec())
            .unwrap_or_default();
        let incremental = !records.is_empty();

        if !incremental {
            // Cold start: forget prior offsets and re-read everything
            state.files.reset();
        }

        let max_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        let mut ids = IdSequence::starting_at(max_id + 1);

        debug!(incremental, cached = records.len(), "starting scan pass");

        let root = state.files.root().to_path_buf();
        let pattern = state.files.pattern().to_string();
        let discovered = task::spawn_blocking(move || discover_files(&root, &pattern))
            .await
            .map_err(|e| Error::Task(e.to_string()))?;

        let discovered = match discovered {
            Ok(paths) => paths,
            Err(Error::MissingRoot(root)) => {
                warn!(root = %root.display(), "log root directory does not exist");
                records.push(LogRecord::warning(
                    ids.next_id(),
                    format!(
                        "Warn: log root directory {} does not exist, check the ingest root_path setting",
                        root.display()
                    ),
                ));
                if incremental {
                    // Keep the outage visible alongside the records already
                    // ingested; a cold pass has nothing durable to cache
                    state
                        .cache
                        .put(LOGS_CACHE_KEY, records.clone(), self.config.cache_ttl);
                }
                return Ok(IngestionSession::new(records));
            }
            Err(e) => return Err(e),
        };

        let dirty = state.files.reconcile(&discovered);

        for path in dirty {
            let skip = state.files.lines_read(&path);
            let read_path = path.clone();
            let read = timeout(
                self.config.read_timeout,
                task::spawn_blocking(move || reader::read_new_lines(&read_path, skip)),
            )
            .await;

            let lines = match read {
                Err(_) => {
                    warn!(file = %path.display(), timeout = ?self.config.read_timeout, "read timed out");
                    records.push(LogRecord::warning(
                        ids.next_id(),
                        format!(
                            "Warn: reading {} timed out after {:?}",
                            file_label(&path),
                            self.config.read_timeout
                        ),
                    ));
                    continue;
                }
                Ok(Err(join_err)) => {
                    warn!(file = %path.display(), error = %join_err, "read task failed");
                    records.push(LogRecord::warning(
                        ids.next_id(),
                        format!("Warn: failed to read {}: {}", file_label(&path), join_err),
                    ));
                    continue;
                }
                Ok(Ok(Err(io_err))) => {
                    warn!(file = %path.display(), error = %io_err, "failed to read file");
                    records.push(LogRecord::warning(
                        ids.next_id(),
                        format!("Warn: failed to read {}: {}", file_label(&path), io_err),
                    ));
                    continue;
                }
                Ok(Ok(Ok(lines))) => lines,
            };

            if lines.is_empty() {
                // mtime moved but no complete new line yet
                state.files.commit(&path, 0);
                continue;
            }

            let text = lines.join("\n");
            let parsed = self.parser.parse(&path, &text, &mut ids);
            debug!(
                file = %path.display(),
                lines = lines.len(),
                records = parsed.len(),
                "parsed newly appended lines"
            );
            records.extend(parsed);

            // Commit the offset only once the file's records are appended,
            // so an abandoned pass can be retried without losing lines
            state.files.commit(&path, lines.len() as u64);
        }

        state
            .cache
            .put(LOGS_CACHE_KEY, records.clone(), self.config.cache_ttl);
        info!(total = records.len(), incremental, "scan pass complete");

        Ok(IngestionSession::new(records))
    }
}

/// One opened view of the ingested record set.
///
/// The session owns a snapshot taken at `open()`; the shared cache keeps its
/// own copy, so dropping or closing the session releases only this view.
pub struct IngestionSession {
    records: Vec<LogRecord>,
}

impl IngestionSession {
    fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    /// The ingested records, in discovery-then-append order
    pub fn logs(&self) -> &[LogRecord] {
        &self.records
    }

    /// Consume the session, taking ownership of the records
    pub fn into_logs(self) -> Vec<LogRecord> {
        self.records
    }

    /// Release the in-memory snapshot
    pub fn close(self) {}
}
