use crate::event::LogEvent;
use chrono::{DateTime, NaiveDateTime};
use regex::{Captures, Regex};
use thiserror::Error;

/// Apache "combined" layout:
/// `ip - - [timestamp] "method path protocol" status bytes "referrer" "user_agent"`
const DEFAULT_PATTERN: &str = r#"^(?P<ip_address>\d{1,3}(?:\.\d{1,3}){3}) - - \[(?P<timestamp>[^\]]+)\] "(?P<method>[A-Z]+) (?P<path>\S+) HTTP/\d(?:\.\d+)?" (?P<status_code>\d{3}) (?P<bytes_sent>\d+|-) "(?P<referrer>[^"]*)" "(?P<user_agent>.*)""#;

/// Capture groups every extraction pattern must expose.
const REQUIRED_GROUPS: [&str; 8] = [
    "ip_address",
    "timestamp",
    "method",
    "path",
    "status_code",
    "bytes_sent",
    "referrer",
    "user_agent",
];

const TIMESTAMP_LAYOUT_OFFSET: &str = "%d/%b/%Y:%H:%M:%S %z";
const TIMESTAMP_LAYOUT_NAIVE: &str = "%d/%b/%Y:%H:%M:%S";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid extraction pattern: {0}")]
    Compile(#[from] regex::Error),

    #[error("extraction pattern is missing capture group '{name}'")]
    MissingGroup { name: &'static str },
}

/// Why a single line was rejected. Rejections are counted and logged by the
/// batcher; they never abort a run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line does not match the extraction pattern")]
    NoMatch,

    #[error("unparseable timestamp '{value}'")]
    Timestamp { value: String },

    #[error("invalid status code '{value}'")]
    StatusCode { value: String },

    #[error("invalid bytes_sent '{value}'")]
    BytesSent { value: String },
}

/// Converts one raw text line into a [`LogEvent`]. The pattern is compiled
/// once per parser instance; no shared mutable state.
#[derive(Debug)]
pub struct LineParser {
    pattern: Regex,
}

impl LineParser {
    /// Build a parser from a configured pattern, or the default Apache
    /// combined layout when no pattern is configured.
    pub fn new(pattern: Option<&str>) -> Result<Self, PatternError> {
        let pattern = Regex::new(pattern.unwrap_or(DEFAULT_PATTERN))?;

        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        for name in REQUIRED_GROUPS {
            if !names.contains(&name) {
                return Err(PatternError::MissingGroup { name });
            }
        }

        Ok(Self { pattern })
    }

    pub fn parse(&self, line: &str) -> Result<LogEvent, ParseError> {
        let caps = self.pattern.captures(line).ok_or(ParseError::NoMatch)?;

        let timestamp_raw = group(&caps, "timestamp")?;
        let timestamp =
            parse_timestamp(timestamp_raw).ok_or_else(|| ParseError::Timestamp {
                value: timestamp_raw.to_string(),
            })?;

        let status_raw = group(&caps, "status_code")?;
        let status_code: u16 = status_raw.parse().map_err(|_| ParseError::StatusCode {
            value: status_raw.to_string(),
        })?;

        let bytes_raw = group(&caps, "bytes_sent")?;
        let bytes_sent = match bytes_raw {
            "-" => 0,
            s => s.parse().map_err(|_| ParseError::BytesSent {
                value: s.to_string(),
            })?,
        };

        Ok(LogEvent {
            ip_address: group(&caps, "ip_address")?.to_string(),
            timestamp,
            method: group(&caps, "method")?.to_string(),
            path: group(&caps, "path")?.to_string(),
            status_code,
            bytes_sent,
            referrer: normalize_optional(group(&caps, "referrer")?),
            user_agent: normalize_optional(group(&caps, "user_agent")?),
        })
    }
}

fn group<'a>(caps: &'a Captures, name: &str) -> Result<&'a str, ParseError> {
    // Constructor guarantees the group exists, but a custom pattern may make
    // it optional; a non-participating group rejects the line.
    caps.name(name)
        .map(|m| m.as_str())
        .ok_or(ParseError::NoMatch)
}

/// Offset-aware layout first, then the same layout without an offset.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_str(raw, TIMESTAMP_LAYOUT_OFFSET) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_LAYOUT_NAIVE).ok()
}

/// Empty and `-` captures carry no information.
fn normalize_optional(raw: &str) -> Option<String> {
    match raw {
        "" | "-" => None,
        s => Some(s.to_string()),
    }
}
