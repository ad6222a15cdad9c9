pub mod config;
pub mod enrichment;
pub mod event;
pub mod ingest;
pub mod logging;
pub mod parse;
pub mod report;
pub mod store;
