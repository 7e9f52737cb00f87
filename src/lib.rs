// SPDX-License-Identifier: Apache-2.0

//! File-based log ingestion for the logdeck dashboard.
//!
//! This crate tails plain-text log files written incrementally by arbitrary
//! logging frameworks and turns them into an ordered, queryable set of
//! structured records for presentation.
//!
//! Features:
//! - Path-keyed file tracking with mtime-based change detection
//! - Incremental line reads that never re-consume bytes
//! - Delimited and regex record grammars behind one parser trait
//! - A TTL record cache so repeated queries skip untouched files
//!
//! The dashboard UI, authorization layer, and database-backed record source
//! are external collaborators and live outside this crate.

pub mod cache;
pub mod config;
pub mod error;
pub mod parser;
pub mod reader;
pub mod record;
pub mod session;
pub mod tracker;

pub use cache::{RecordCache, LOGS_CACHE_KEY};
pub use config::{Grammar, IngestConfig};
pub use error::{Error, Result};
pub use parser::{DelimitedParser, IdSequence, RecordParser, RegexGrammarParser};
pub use record::LogRecord;
pub use session::{IngestionSession, LogIngestor};
pub use tracker::{FileSetTracker, LogFileState};
