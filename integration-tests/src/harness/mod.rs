use logmill_core::enrichment::UaClassifier;
use logmill_core::ingest::Ingestor;
use logmill_core::parse::LineParser;
use logmill_core::store::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Render one Apache combined log line.
pub fn log_line(
    ip: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    status: u16,
    bytes: &str,
    referrer: &str,
    user_agent: &str,
) -> String {
    format!(
        "{ip} - - [{timestamp}] \"{method} {path} HTTP/1.1\" {status} {bytes} \"{referrer}\" \"{user_agent}\""
    )
}

/// A simple GET line with the fields that usually matter in assertions.
pub fn get_line(ip: &str, timestamp: &str, path: &str, status: u16, user_agent: &str) -> String {
    log_line(ip, timestamp, "GET", path, status, "512", "-", user_agent)
}

pub fn write_log(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("access.log");
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

pub fn open_store(dir: &Path) -> SqliteStore {
    let store = SqliteStore::open(&dir.join("logmill.db")).unwrap();
    store.ensure_schema().unwrap();
    store
}

pub fn ingestor(batch_size: usize) -> Ingestor {
    Ingestor::new(LineParser::new(None).unwrap(), UaClassifier::new(), batch_size)
}
