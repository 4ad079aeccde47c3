//! seo-booster: local heuristic SEO analysis for a single page

pub mod audit;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod report;
pub mod scan;
pub mod scoring;
pub mod text_stats;

pub use config::Config;
pub use error::{Result, ScanError};
pub use report::{ScanFailure, ScanReport, ScanResponse};
pub use scan::{FailedScan, Scan, ScanOutcome, ScanResult, Scanner};

/// Scan `url` with default settings and return the caller-facing payload.
///
/// Never fails: errors come back as `ScanResponse::Failure` with an `error` kind.
pub fn scan(url: &str, keyword: Option<&str>, competitor_url: Option<&str>) -> ScanResponse {
    let scanner = Scanner::from_config(Config::default());
    ScanResponse::from_result(scanner.scan(url, keyword, competitor_url))
}
