//! End-to-end ingestion: log file -> parser -> batcher -> SQLite -> reports.

use chrono::NaiveDate;
use integration_tests::harness::{get_line, ingestor, open_store, write_log};
use logmill_core::report::Report;
use logmill_core::store::EventStore;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[test]
fn ingest_file_and_query_reports() {
    let dir = tempdir().unwrap();
    let lines = vec![
        get_line("203.0.113.5", "25/Jul/2025:10:00:00 +0000", "/index.html", 200, "curl/7.64.1"),
        get_line("203.0.113.5", "25/Jul/2025:10:05:00 +0000", "/index.html", 200, "curl/7.64.1"),
        get_line("203.0.113.5", "25/Jul/2025:11:00:00 +0000", "/about", 200, CHROME),
        get_line("198.51.100.7", "25/Jul/2025:11:30:00 +0000", "/missing", 404, CHROME),
        "totally malformed".to_string(),
        get_line("198.51.100.7", "26/Jul/2025:09:00:00 +0000", "/boom", 500, "curl/7.64.1"),
    ];
    let log = write_log(dir.path(), &lines);
    let mut store = open_store(dir.path());

    let summary = ingestor(2).ingest_file(&log, &mut store).unwrap();

    assert_eq!(summary.accepted, 5);
    assert_eq!(summary.rejected, 1);

    let top_ips = Report::TopIps { n: 1 }.run(&store).unwrap();
    assert_eq!(top_ips.rows, vec![vec!["203.0.113.5".to_string(), "3".to_string()]]);

    let top_urls = Report::TopUrls { n: 10 }.run(&store).unwrap();
    assert_eq!(top_urls.rows[0], vec!["/index.html".to_string(), "2".to_string()]);
    assert_eq!(top_urls.rows.len(), 4);

    let status = Report::StatusCodes.run(&store).unwrap();
    assert_eq!(
        status.rows[0],
        vec!["200".to_string(), "3".to_string(), "60.00%".to_string()]
    );

    let hourly = Report::HourlyTraffic.run(&store).unwrap();
    assert_eq!(
        hourly.rows,
        vec![
            vec!["9".to_string(), "1".to_string()],
            vec!["10".to_string(), "2".to_string()],
            vec!["11".to_string(), "2".to_string()],
        ]
    );
}

#[test]
fn error_reports_filter_by_status_and_date() {
    let dir = tempdir().unwrap();
    let lines = vec![
        get_line("10.0.0.1", "25/Jul/2025:10:00:00 +0000", "/ok", 200, "-"),
        get_line("10.0.0.2", "25/Jul/2025:12:00:00 +0000", "/missing", 404, "-"),
        get_line("10.0.0.3", "26/Jul/2025:08:00:00 +0000", "/gone", 404, "-"),
        get_line("10.0.0.4", "26/Jul/2025:09:00:00 +0000", "/boom", 500, "-"),
    ];
    let log = write_log(dir.path(), &lines);
    let mut store = open_store(dir.path());
    ingestor(100).ingest_file(&log, &mut store).unwrap();

    let not_found = Report::ErrorLogs { status_code: 404 }.run(&store).unwrap();
    assert_eq!(not_found.rows.len(), 2);
    // Newest first.
    assert_eq!(not_found.rows[0][1], "/gone");
    assert_eq!(not_found.rows[1][1], "/missing");

    let by_date = Report::ErrorLogsByDate {
        date: NaiveDate::from_ymd_opt(2025, 7, 26).unwrap(),
    }
    .run(&store)
    .unwrap();
    assert_eq!(by_date.rows.len(), 2);
    assert_eq!(by_date.rows[0][1], "/boom");
    assert_eq!(by_date.rows[1][1], "/gone");
}

#[test]
fn os_distribution_uses_classified_user_agents() {
    let dir = tempdir().unwrap();
    let lines = vec![
        get_line("10.0.0.1", "25/Jul/2025:10:00:00 +0000", "/a", 200, CHROME),
        get_line("10.0.0.1", "25/Jul/2025:10:01:00 +0000", "/b", 200, CHROME),
    ];
    let log = write_log(dir.path(), &lines);
    let mut store = open_store(dir.path());
    ingestor(100).ingest_file(&log, &mut store).unwrap();

    let os = Report::OsDistribution.run(&store).unwrap();

    assert_eq!(os.rows.len(), 1);
    assert!(os.rows[0][0].starts_with("Windows"));
    assert_eq!(os.rows[0][1], "2");
}

#[test]
fn second_run_reuses_persisted_user_agent_identity() {
    let dir = tempdir().unwrap();
    let log = write_log(
        dir.path(),
        &[get_line("10.0.0.1", "25/Jul/2025:10:00:00 +0000", "/a", 200, "curl/7.64.1")],
    );
    let mut store = open_store(dir.path());

    // Two separate runs, each with a fresh run-local cache.
    ingestor(10).ingest_file(&log, &mut store).unwrap();
    let first_id = store.find_user_agent("curl/7.64.1").unwrap().unwrap();

    ingestor(10).ingest_file(&log, &mut store).unwrap();
    let second_id = store.find_user_agent("curl/7.64.1").unwrap().unwrap();

    assert_eq!(first_id, second_id);
}

#[test]
fn reports_on_empty_database_return_no_rows() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    assert!(Report::StatusCodes.run(&store).unwrap().rows.is_empty());
    assert!(Report::TopIps { n: 5 }.run(&store).unwrap().rows.is_empty());
}
