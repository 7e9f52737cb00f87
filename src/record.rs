use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logger name carried by synthetic warning records
pub const ROOT_LOGGER: &str = "Root";

/// Level carried by synthetic warning records
pub const WARN_LEVEL: &str = "Warn";

/// A single structured log record produced by ingestion.
///
/// Ids are unique and strictly increasing across all files of a scan pass
/// and across incremental refreshes; once a record has been handed to the
/// cache it is never mutated or renumbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Monotonically assigned identifier, never reused
    pub id: u64,

    /// When the application emitted the record
    pub timestamp: NaiveDateTime,

    /// Severity text as written by the logging framework
    pub level: String,

    /// Originating logger name, when the grammar captured one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,

    /// Free-text message body
    pub message: String,

    /// Exception or stack trace text, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,

    /// Emitting thread id (structured regex grammar)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Declared extra columns in schema order, empty values for unmapped names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Create a synthetic warning record surfacing an operational problem
    /// through the normal output channel instead of an error.
    pub fn warning(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            timestamp: Utc::now().naive_utc(),
            level: WARN_LEVEL.to_string(),
            logger: Some(ROOT_LOGGER.to_string()),
            message: message.into(),
            exception: None,
            thread_id: None,
            custom_fields: Vec::new(),
        }
    }

    /// Whether this record is a synthetic ingestion warning
    pub fn is_warning(&self) -> bool {
        self.level == WARN_LEVEL && self.logger.as_deref() == Some(ROOT_LOGGER)
    }
}
