// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use std::path::Path;
use tracing::warn;

use super::fields::CustomFieldMapper;
use super::{file_label, IdSequence, RecordParser};
use crate::config::IngestConfig;
use crate::record::LogRecord;

/// Timestamp formats accepted by the delimited grammar, tried in order.
/// Logging frameworks disagree on fraction and separator spelling; parsing
/// is locale-invariant either way.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f", // 2024-01-01 10:00:00.123 (fraction optional)
    "%Y-%m-%dT%H:%M:%S%.f", // ISO 8601: 2024-01-01T10:00:00.123
    "%Y/%m/%d %H:%M:%S",    // Slash format: 2024/01/01 10:00:00
    "%d/%b/%Y %H:%M:%S",    // 01/Jan/2024 10:00:00
];

/// Parse a record timestamp using the invariant format table
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }
    None
}

/// A parser for records separated by fixed delimiter tokens.
///
/// A record is the text between two end-of-record markers; its fields are
/// separated by the field delimiter. Positions 0-4 map to
/// timestamp, level, logger, message, exception; positions beyond that map
/// to the declared custom columns. Missing trailing fields are empty, never
/// an error.
pub struct DelimitedParser {
    field_delimiter: String,
    end_delimiter: String,
    mapper: CustomFieldMapper,
}

impl DelimitedParser {
    /// Create a parser from the configured delimiters and custom schema
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            field_delimiter: config.field_delimiter.clone(),
            end_delimiter: config.end_delimiter.clone(),
            mapper: CustomFieldMapper::new(config.custom_fields.clone()),
        }
    }

    fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
        fields.get(index).copied().unwrap_or("")
    }

    fn optional_field(fields: &[&str], index: usize) -> Option<String> {
        fields
            .get(index)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
    }
}

impl RecordParser for DelimitedParser {
    fn parse(&self, file: &Path, text: &str, ids: &mut IdSequence) -> Vec<LogRecord> {
        let mut records = Vec::new();

        // Some layouts write the end marker with a stray space ("|| end");
        // fold that spelling into the configured delimiter before splitting.
        let text = text.replace("|| end", &self.end_delimiter);

        let chunks: Vec<&str> = text
            .split(self.end_delimiter.as_str())
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        for (index, chunk) in chunks.iter().enumerate() {
            let fields: Vec<&str> = chunk.trim().split(self.field_delimiter.as_str()).collect();

            // A chunk without any field delimiter is not a record
            if fields.len() < 2 {
                continue;
            }

            let raw_timestamp = Self::field(&fields, 0);
            let Some(timestamp) = parse_timestamp(raw_timestamp) else {
                warn!(
                    file = %file.display(),
                    value = raw_timestamp,
                    "skipping record with unparseable timestamp"
                );
                records.push(LogRecord::warning(
                    ids.next_id(),
                    format!(
                        "Warn: skipped a record in {} with unparseable timestamp {:?}",
                        file_label(file),
                        raw_timestamp
                    ),
                ));
                continue;
            };

            let mapped = self.mapper.map(&fields);

            // Schema drift is only sampled on the file's final record
            if mapped.mismatch && index == chunks.len() - 1 {
                records.push(LogRecord::warning(
                    ids.next_id(),
                    format!(
                        "Warn: {} does not fully match the declared custom field schema",
                        file_label(file)
                    ),
                ));
            }

            records.push(LogRecord {
                id: ids.next_id(),
                timestamp,
                level: Self::field(&fields, 1).to_string(),
                logger: Self::optional_field(&fields, 2),
                message: Self::field(&fields, 3).to_string(),
                exception: Self::optional_field(&fields, 4),
                thread_id: None,
                custom_fields: mapped.values,
            });
        }

        records
    }
}
