use chrono::NaiveDateTime;

/// One parsed access-log line. Built by the line parser, consumed exactly
/// once by the ingestion batcher; never mutated in between.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub ip_address: String,
    pub timestamp: NaiveDateTime,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub bytes_sent: u64,
    /// `None` when the capture was empty or the literal `-`.
    pub referrer: Option<String>,
    /// `None` when the capture was empty or the literal `-`.
    pub user_agent: Option<String>,
}
