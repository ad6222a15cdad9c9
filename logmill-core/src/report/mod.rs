use crate::store::{SqliteStore, StoreError};
use chrono::{NaiveDate, NaiveDateTime};

/// The fixed catalogue of aggregate reports. Each variant carries its typed
/// parameters; dispatch is an exhaustive match, so a new report cannot be
/// added without wiring its query.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    TopIps { n: u32 },
    TopUrls { n: u32 },
    StatusCodes,
    HourlyTraffic,
    OsDistribution,
    ErrorLogs { status_code: u16 },
    ErrorLogsByDate { date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IpCount {
    pub ip_address: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlCount {
    pub path: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusShare {
    pub status_code: u16,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourCount {
    pub hour: u8,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsCount {
    pub os: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRow {
    pub ip_address: String,
    pub path: String,
    pub status_code: u16,
    pub timestamp: NaiveDateTime,
}

/// Rendered rows for the console; the CLI owns column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn run(&self, store: &SqliteStore) -> Result<ReportTable, StoreError> {
        match self {
            Report::TopIps { n } => Ok(ReportTable {
                headers: &["ip_address", "request_count"],
                rows: store
                    .top_ips(*n)?
                    .into_iter()
                    .map(|r| vec![r.ip_address, r.count.to_string()])
                    .collect(),
            }),

            Report::TopUrls { n } => Ok(ReportTable {
                headers: &["path", "request_count"],
                rows: store
                    .top_urls(*n)?
                    .into_iter()
                    .map(|r| vec![r.path, r.count.to_string()])
                    .collect(),
            }),

            Report::StatusCodes => Ok(ReportTable {
                headers: &["status_code", "count", "percentage"],
                rows: store
                    .status_code_distribution()?
                    .into_iter()
                    .map(|r| {
                        vec![
                            r.status_code.to_string(),
                            r.count.to_string(),
                            format!("{:.2}%", r.percent),
                        ]
                    })
                    .collect(),
            }),

            Report::HourlyTraffic => Ok(ReportTable {
                headers: &["hour", "request_count"],
                rows: store
                    .hourly_traffic()?
                    .into_iter()
                    .map(|r| vec![r.hour.to_string(), r.count.to_string()])
                    .collect(),
            }),

            Report::OsDistribution => Ok(ReportTable {
                headers: &["os", "requests"],
                rows: store
                    .os_distribution()?
                    .into_iter()
                    .map(|r| vec![r.os, r.count.to_string()])
                    .collect(),
            }),

            Report::ErrorLogs { status_code } => Ok(ReportTable {
                headers: ERROR_HEADERS,
                rows: store
                    .error_logs(*status_code)?
                    .into_iter()
                    .map(error_row)
                    .collect(),
            }),

            Report::ErrorLogsByDate { date } => Ok(ReportTable {
                headers: ERROR_HEADERS,
                rows: store
                    .error_logs_by_date(*date)?
                    .into_iter()
                    .map(error_row)
                    .collect(),
            }),
        }
    }
}

const ERROR_HEADERS: &[&str] = &["ip_address", "path", "status_code", "timestamp"];

fn error_row(r: ErrorRow) -> Vec<String> {
    vec![
        r.ip_address,
        r.path,
        r.status_code.to_string(),
        r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}
