// SPDX-License-Identifier: Apache-2.0

//! Configuration for the ingestion core.

use std::path::PathBuf;
use std::time::Duration;

/// Record grammar used to parse newly read file text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grammar {
    /// Records separated by fixed field and end-of-record delimiters
    #[default]
    Delimited,
    /// Multi-line records extracted with the fixed structured regex grammar
    Regex,
}

/// Configuration for the log ingestion core
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Root directory scanned recursively for log files
    pub root_path: PathBuf,
    /// File name pattern matched below the root (glob syntax)
    pub file_pattern: String,
    /// Delimiter between record fields (delimited grammar)
    pub field_delimiter: String,
    /// Delimiter terminating a record (delimited grammar)
    pub end_delimiter: String,
    /// Grammar used to parse records
    pub grammar: Grammar,
    /// Ordered names of custom fields beyond the fixed schema
    pub custom_fields: Vec<String>,
    /// How long a cached record set stays valid after a scan
    pub cache_ttl: Duration,
    /// Upper bound on reading a single file during one pass
    pub read_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            file_pattern: "*.log".to_string(),
            field_delimiter: "||".to_string(),
            end_delimiter: "||end".to_string(),
            grammar: Grammar::default(),
            custom_fields: Vec::new(),
            cache_ttl: Duration::from_secs(5 * 60),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl IngestConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.file_pattern.is_empty() {
            return Err("A file pattern must be specified".to_string());
        }

        if self.field_delimiter.is_empty() {
            return Err("The field delimiter must not be empty".to_string());
        }

        if self.end_delimiter.is_empty() {
            return Err("The end-of-record delimiter must not be empty".to_string());
        }

        if self.read_timeout.is_zero() {
            return Err("The per-file read timeout must be non-zero".to_string());
        }

        Ok(())
    }
}
