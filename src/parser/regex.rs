// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use tracing::warn;

use super::{file_label, IdSequence, RecordParser};
use crate::error::{Error, Result};
use crate::record::LogRecord;

/// Anchor opening every record in the structured grammar. The marker is the
/// log framework's native-language "record time:" label and is part of the
/// wire format, not a translatable string.
const RECORD_ANCHOR: &str = "记录时间：";

/// Capture pattern applied to each candidate entry. Field order and the
/// mixed full-width/ASCII colons match the emitting framework exactly;
/// `logger` and the trailing stack trace are optional.
const ENTRY_PATTERN: &str = r"(?s)记录时间：(?P<time>.*?)\n线程ID:(?P<thread>.*?)\n日志级别：(?P<level>.*?)\n(?:Logger:(?P<logger>.*?)\n)?跟踪描述：(?P<message>.*?)(?:\s*堆栈信息：(?P<trace>.*))?$";

/// Exact record-time format of the structured grammar
/// (`yyyy-MM-dd HH:mm:ss fff`)
const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %3f";

/// A parser for the fixed multi-line structured record grammar.
///
/// The new text is first segmented into candidate entries at every
/// occurrence of the record anchor, non-greedily up to the next anchor or
/// end of text; each candidate is then matched against the capture pattern.
/// A candidate that fails the pattern or carries an unparseable record time
/// is skipped with an in-band warning record, the same surface the
/// delimited grammar uses for malformed content.
pub struct RegexGrammarParser {
    entry: Regex,
}

impl RegexGrammarParser {
    /// Create a parser for the structured record grammar
    pub fn new() -> Result<Self> {
        let entry = Regex::new(ENTRY_PATTERN)
            .map_err(|e| Error::Config(format!("invalid structured grammar pattern: {}", e)))?;
        Ok(Self { entry })
    }

    /// Slice `text` into candidate entries, one per anchor occurrence
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let starts: Vec<usize> = text.match_indices(RECORD_ANCHOR).map(|(i, _)| i).collect();

        let mut entries = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let candidate = text[start..end].trim();
            if !candidate.is_empty() {
                entries.push(candidate);
            }
        }
        entries
    }
}

impl RecordParser for RegexGrammarParser {
    fn parse(&self, file: &Path, text: &str, ids: &mut IdSequence) -> Vec<LogRecord> {
        let mut records = Vec::new();

        for candidate in self.segment(text) {
            let Some(caps) = self.entry.captures(candidate) else {
                warn!(file = %file.display(), "skipping entry that does not match the structured grammar");
                records.push(LogRecord::warning(
                    ids.next_id(),
                    format!(
                        "Warn: skipped an entry in {} that does not match the structured record grammar",
                        file_label(file)
                    ),
                ));
                continue;
            };

            let group = |name: &str| caps.name(name).map(|m| m.as_str().trim().to_string());
            let optional = |value: Option<String>| value.filter(|v| !v.is_empty());

            let raw_time = group("time").unwrap_or_default();
            let Ok(timestamp) = NaiveDateTime::parse_from_str(&raw_time, RECORD_TIME_FORMAT)
            else {
                warn!(
                    file = %file.display(),
                    value = raw_time.as_str(),
                    "skipping entry with unparseable record time"
                );
                records.push(LogRecord::warning(
                    ids.next_id(),
                    format!(
                        "Warn: skipped an entry in {} with unparseable record time {:?}",
                        file_label(file),
                        raw_time
                    ),
                ));
                continue;
            };

            records.push(LogRecord {
                id: ids.next_id(),
                timestamp,
                level: group("level").unwrap_or_default(),
                logger: optional(group("logger")),
                message: group("message").unwrap_or_default(),
                exception: optional(group("trace")),
                thread_id: optional(group("thread")),
                custom_fields: Vec::new(),
            });
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::WARN_LEVEL;

    fn parse(text: &str) -> Vec<LogRecord> {
        let parser = RegexGrammarParser::new().unwrap();
        let mut ids = IdSequence::starting_at(1);
        parser.parse(Path::new("trace.log"), text, &mut ids)
    }

    #[test]
    fn test_two_entries_one_without_logger() {
        let text = "记录时间：2024-03-05 11:22:33 456\n\
                    线程ID:7\n\
                    日志级别：INFO\n\
                    Logger:OrderService\n\
                    跟踪描述：order accepted\n\
                    记录时间：2024-03-05 11:22:34 000\n\
                    线程ID:8\n\
                    日志级别：ERROR\n\
                    跟踪描述：order rejected";

        let records = parse(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].level, "INFO");
        assert_eq!(records[0].logger.as_deref(), Some("OrderService"));
        assert_eq!(records[0].message, "order accepted");
        assert_eq!(records[0].thread_id.as_deref(), Some("7"));
        assert_eq!(
            records[0].timestamp.and_utc().timestamp_subsec_millis(),
            456
        );

        assert_eq!(records[1].id, 2);
        assert!(records[1].logger.is_none());
        assert_eq!(records[1].message, "order rejected");
        assert_eq!(records[1].thread_id.as_deref(), Some("8"));
    }

    #[test]
    fn test_multi_line_stack_trace_captured() {
        let text = "记录时间：2024-03-05 11:22:33 456\n\
                    线程ID:7\n\
                    日志级别：ERROR\n\
                    跟踪描述：cast failed\n\
                    堆栈信息：at Worker.Convert()\n   at Worker.Run()";

        let records = parse(text);

        assert_eq!(records.len(), 1);
        let trace = records[0].exception.as_deref().unwrap();
        assert!(trace.contains("at Worker.Convert()"));
        assert!(trace.contains("at Worker.Run()"));
    }

    #[test]
    fn test_unmatched_entry_becomes_warning_record() {
        let text = "记录时间：2024-03-05 11:22:33 456\nnot the structured shape at all\n\
                    记录时间：2024-03-05 11:22:34 000\n\
                    线程ID:8\n\
                    日志级别：INFO\n\
                    跟踪描述：still fine";

        let records = parse(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].level, WARN_LEVEL);
        assert!(records[0].message.contains("trace.log"));

        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].message, "still fine");
    }

    #[test]
    fn test_unparseable_record_time_becomes_warning_record() {
        let text = "记录时间：tuesday morning\n\
                    线程ID:7\n\
                    日志级别：INFO\n\
                    跟踪描述：whatever";

        let records = parse(text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, WARN_LEVEL);
        assert!(records[0].message.contains("tuesday morning"));
    }

    #[test]
    fn test_text_without_anchor_yields_nothing() {
        let records = parse("plain line one\nplain line two");
        assert!(records.is_empty());
    }
}
