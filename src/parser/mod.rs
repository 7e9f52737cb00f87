// SPDX-License-Identifier: Apache-2.0

//! Record parsing.
//!
//! Two mutually exclusive grammars turn the newly read text of one file into
//! structured records:
//!
//! - [`DelimitedParser`] - records separated by fixed field and
//!   end-of-record delimiters
//! - [`RegexGrammarParser`] - multi-line records extracted with a fixed
//!   anchor + capture pattern
//!
//! The variant is chosen once at configuration time; both share only the
//! identifier allocation and the cache-merge contract. Malformed content
//! never aborts a pass: each skipped record surfaces as an in-band warning
//! record that consumes an id like any other.

mod delimited;
mod fields;
mod regex;

pub use delimited::DelimitedParser;
pub use fields::{CustomFieldMapper, MappedFields};
pub use regex::RegexGrammarParser;

use std::path::Path;
use std::sync::Arc;

use crate::config::{Grammar, IngestConfig};
use crate::error::Result;
use crate::record::LogRecord;

/// Allocates strictly increasing record identifiers across all files of a
/// scan pass. Warning records draw from the same sequence.
#[derive(Debug)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// Create a sequence whose first allocated id is `next`
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Allocate the next identifier
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// RecordParser converts the accumulated new text of one file into
/// structured records, allocating ids from the shared sequence.
pub trait RecordParser: Send + Sync {
    /// Parse `text` (the file's newly appended lines, joined) into records.
    /// `file` names the source in warning records and diagnostics.
    fn parse(&self, file: &Path, text: &str, ids: &mut IdSequence) -> Vec<LogRecord>;
}

/// Build the parser variant selected by the configuration
pub fn parser_for(config: &IngestConfig) -> Result<Arc<dyn RecordParser>> {
    match config.grammar {
        Grammar::Delimited => Ok(Arc::new(DelimitedParser::new(config))),
        Grammar::Regex => Ok(Arc::new(RegexGrammarParser::new()?)),
    }
}

/// Short file name used in warning records and diagnostics
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
