//! Scan orchestration: fetch, parse, score and audit one URL, optionally a
//! competitor too.
//!
//! A scan is a pure function of its inputs plus network I/O. The primary and
//! competitor analyses are independent; a competitor failure never fails the
//! primary result.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::audit::{self, AuditInput, Finding};
use crate::config::Config;
use crate::document::PageDocument;
use crate::error::{Result, ScanError};
use crate::fetch::{self, HttpFetcher, LinkHealth, PageSource, RawPage};
use crate::scoring::{self, SubScores};
use crate::text_stats::{RankedTerm, TextStats};

/// Pipeline stage of one URL's analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Fetching,
    FetchFailed,
    Parsing,
    Scoring,
    Done,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Idle => "idle",
            ScanState::Fetching => "fetching",
            ScanState::FetchFailed => "fetch_failed",
            ScanState::Parsing => "parsing",
            ScanState::Scoring => "scoring",
            ScanState::Done => "done",
        };
        f.write_str(name)
    }
}

struct Progress<'a> {
    url: &'a str,
    state: ScanState,
}

impl<'a> Progress<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            state: ScanState::Idle,
        }
    }

    fn advance(&mut self, next: ScanState) {
        debug!(url = self.url, from = %self.state, to = %next, "scan state");
        self.state = next;
    }
}

/// Page fields surfaced to callers alongside the scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    /// Post-redirect URL
    pub final_url: String,
    /// Empty when the page has no title
    pub title: String,
    pub meta_description: String,
    pub canonical_url: Option<String>,
    pub h1: Vec<String>,
    pub h2_count: usize,
    pub h3_count: usize,
    pub images: usize,
    pub images_missing_alt: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub word_count: usize,
    pub structured_data_types: Vec<String>,
    pub has_viewport: bool,
    pub top_terms: Vec<RankedTerm>,
    /// SHA-256 of the fetched HTML
    pub content_hash: String,
}

/// Full analysis of one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub url: String,
    pub score: u8,
    pub sub_scores: SubScores,
    pub broken_links_count: usize,
    pub links_checked: usize,
    pub broken_links: Vec<String>,
    pub keyword: Option<String>,
    /// Keyword occurrences per word
    pub keyword_density: f64,
    pub readability: f64,
    pub findings: Vec<Finding>,
    pub tips: Vec<String>,
    pub page_meta: PageMeta,
}

impl ScanResult {
    /// Findings rendered with their severity icon, in audit order
    pub fn audit_findings(&self) -> Vec<String> {
        self.findings.iter().map(Finding::render).collect()
    }
}

/// Side-by-side comparison against a successfully scanned competitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorComparison {
    pub url: String,
    pub score: u8,
    pub sub_scores: SubScores,
    pub summary: String,
    /// Areas where the primary page leads
    pub advantages: Vec<String>,
    /// Areas where the competitor leads
    pub disadvantages: Vec<String>,
}

/// What happened to the competitor slot of a scan
#[derive(Debug, Clone, PartialEq)]
pub enum CompetitorOutcome {
    NotRequested,
    /// Requested but could not be scanned
    Unavailable {
        url: String,
        kind: &'static str,
        message: String,
    },
    Compared(Box<CompetitorComparison>),
    /// Scanned, but the primary failed so there is nothing to compare against
    Scanned(Box<ScanResult>),
}

impl CompetitorOutcome {
    pub fn comparison(&self) -> Option<&CompetitorComparison> {
        match self {
            CompetitorOutcome::Compared(c) => Some(c),
            _ => None,
        }
    }
}

/// Primary result plus the competitor slot
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub primary: ScanResult,
    pub competitor: CompetitorOutcome,
}

/// Primary analysis failed; the competitor slot was still evaluated
#[derive(Debug)]
pub struct FailedScan {
    pub error: ScanError,
    pub competitor: CompetitorOutcome,
}

impl From<FailedScan> for ScanError {
    fn from(failed: FailedScan) -> Self {
        failed.error
    }
}

pub type ScanOutcome = std::result::Result<Scan, FailedScan>;

/// Runs the analysis pipeline against a `PageSource`
pub struct Scanner<S: PageSource = HttpFetcher> {
    source: S,
    config: Config,
}

impl Scanner<HttpFetcher> {
    /// Network-backed scanner using the config's fetch settings
    pub fn from_config(config: Config) -> Self {
        let fetcher = HttpFetcher::new(&config.fetch);
        Self::new(fetcher, config)
    }
}

impl<S: PageSource> Scanner<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyse `url`, and `competitor_url` when given.
    ///
    /// The two analyses are independent: the competitor is scanned even when
    /// the primary fails, and its outcome travels with the primary error.
    pub fn scan(
        &self,
        url: &str,
        keyword: Option<&str>,
        competitor_url: Option<&str>,
    ) -> ScanOutcome {
        let keyword = normalize_keyword(keyword);
        info!(url, keyword = keyword.unwrap_or(""), "scan started");

        let primary = self.analyze(url, keyword);

        let competitor = match competitor_url.map(str::trim).filter(|c| !c.is_empty()) {
            None => CompetitorOutcome::NotRequested,
            Some(competitor_url) => match (self.analyze(competitor_url, keyword), &primary) {
                (Ok(theirs), Ok(ours)) => {
                    CompetitorOutcome::Compared(Box::new(compare(ours, &theirs)))
                }
                (Ok(theirs), Err(_)) => CompetitorOutcome::Scanned(Box::new(theirs)),
                (Err(e), _) => {
                    warn!(url = competitor_url, error = %e, "competitor scan failed");
                    CompetitorOutcome::Unavailable {
                        url: competitor_url.to_string(),
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            },
        };

        match primary {
            Ok(primary) => {
                info!(url, score = primary.score, "scan finished");
                Ok(Scan { primary, competitor })
            }
            Err(error) => {
                warn!(url, error = %error, "primary scan failed");
                Err(FailedScan { error, competitor })
            }
        }
    }

    /// Full pipeline for one URL
    pub fn analyze(&self, url: &str, keyword: Option<&str>) -> Result<ScanResult> {
        let keyword = normalize_keyword(keyword);
        let mut progress = Progress::new(url);
        let target = fetch::parse_scan_url(url)?;
        let deadline = self.config.fetch.scan_budget().map(|b| Instant::now() + b);

        progress.advance(ScanState::Fetching);
        let raw = match self.source.fetch_page(&target) {
            Ok(raw) => raw,
            Err(e) => {
                progress.advance(ScanState::FetchFailed);
                return Err(match e {
                    ScanError::InvalidUrl(_) | ScanError::Unreachable(_) => e,
                    other => ScanError::Unreachable(other.to_string()),
                });
            }
        };

        Ok(self.analyze_page(&raw, keyword, deadline, &mut progress))
    }

    /// Score a page that has already been fetched
    pub fn analyze_raw(&self, raw: &RawPage, keyword: Option<&str>) -> ScanResult {
        let mut progress = Progress::new(&raw.requested_url);
        let deadline = self.config.fetch.scan_budget().map(|b| Instant::now() + b);
        self.analyze_page(raw, normalize_keyword(keyword), deadline, &mut progress)
    }

    fn analyze_page(
        &self,
        raw: &RawPage,
        keyword: Option<&str>,
        deadline: Option<Instant>,
        progress: &mut Progress<'_>,
    ) -> ScanResult {
        progress.advance(ScanState::Parsing);
        let doc = PageDocument::parse(&raw.html, &raw.final_url);
        let stats = TextStats::compute(&doc.raw_text, keyword, self.config.text.ranked_terms);

        progress.advance(ScanState::Scoring);
        let links = fetch::check_links(
            &self.source,
            &doc.link_candidates(),
            self.config.fetch.link_check_limit(),
            deadline,
        );
        let sub_scores = SubScores::compute(
            &doc,
            &stats,
            keyword,
            &links,
            self.config.text.target_word_count,
        );
        let score = scoring::aggregate(&sub_scores, &self.config.weights);

        let audit = audit::audit(&AuditInput {
            doc: &doc,
            stats: &stats,
            keyword,
            links: &links,
            target_word_count: self.config.text.target_word_count,
            min_tips: self.config.text.min_tips,
        });

        progress.advance(ScanState::Done);
        build_result(raw, &doc, stats, keyword, links, sub_scores, score, audit)
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    raw: &RawPage,
    doc: &PageDocument,
    stats: TextStats,
    keyword: Option<&str>,
    links: LinkHealth,
    sub_scores: SubScores,
    score: u8,
    audit: audit::Audit,
) -> ScanResult {
    let page_meta = PageMeta {
        final_url: raw.final_url.clone(),
        title: doc.title.clone().unwrap_or_default(),
        meta_description: doc.meta_description.clone().unwrap_or_default(),
        canonical_url: doc.canonical_url.clone(),
        h1: doc.headings.h1.clone(),
        h2_count: doc.headings.h2.len(),
        h3_count: doc.headings.h3.len(),
        images: doc.images.len(),
        images_missing_alt: doc.images_missing_alt(),
        internal_links: doc.internal_links(),
        external_links: doc.external_links(),
        word_count: doc.word_count,
        structured_data_types: doc.structured_data_types.iter().cloned().collect(),
        has_viewport: doc.has_viewport_tag,
        top_terms: stats.top_terms,
        content_hash: hash_content(&raw.html),
    };

    ScanResult {
        url: raw.requested_url.clone(),
        score,
        sub_scores,
        broken_links_count: links.broken,
        links_checked: links.checked,
        broken_links: links.broken_urls,
        keyword: keyword.map(String::from),
        keyword_density: stats.keyword_density,
        readability: stats.readability,
        findings: audit.findings,
        tips: audit.tips,
        page_meta,
    }
}

/// Per-area advantage and disadvantage statements against a competitor
pub fn compare(ours: &ScanResult, theirs: &ScanResult) -> CompetitorComparison {
    let name = host_label(&theirs.url);
    let mut advantages = Vec::new();
    let mut disadvantages = Vec::new();

    for ((label, mine), (_, other)) in ours
        .sub_scores
        .labelled()
        .into_iter()
        .zip(theirs.sub_scores.labelled())
    {
        if mine > other {
            advantages.push(format!(
                "{}: you score {} vs {} (+{})",
                label,
                mine,
                other,
                mine - other
            ));
        } else if other > mine {
            disadvantages.push(format!(
                "{}: {} scores {} vs your {} (-{})",
                label,
                name,
                other,
                mine,
                other - mine
            ));
        }
    }

    if theirs.broken_links_count > ours.broken_links_count {
        advantages.push(format!(
            "Link health: {} has {} broken links, you have {}",
            name, theirs.broken_links_count, ours.broken_links_count
        ));
    } else if ours.broken_links_count > theirs.broken_links_count {
        disadvantages.push(format!(
            "Link health: you have {} broken links, {} has {}",
            ours.broken_links_count, name, theirs.broken_links_count
        ));
    }

    if theirs.page_meta.word_count > ours.page_meta.word_count {
        disadvantages.push(format!(
            "Content depth: {} has {} words vs your {}",
            name, theirs.page_meta.word_count, ours.page_meta.word_count
        ));
    }

    let summary = match ours.score.cmp(&theirs.score) {
        std::cmp::Ordering::Greater => format!(
            "Your page outscores {} overall ({} vs {}).",
            name, ours.score, theirs.score
        ),
        std::cmp::Ordering::Equal => format!(
            "Your page and {} score the same overall ({}).",
            name, ours.score
        ),
        std::cmp::Ordering::Less => format!(
            "{} outscores your page overall ({} vs {}).",
            name, theirs.score, ours.score
        ),
    };

    CompetitorComparison {
        url: theirs.url.clone(),
        score: theirs.score,
        sub_scores: theirs.sub_scores,
        summary,
        advantages,
        disadvantages,
    }
}

fn host_label(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| "the competitor".to_string())
}

fn normalize_keyword(keyword: Option<&str>) -> Option<&str> {
    keyword.map(str::trim).filter(|k| !k.is_empty())
}

/// Compute SHA-256 hash of content
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixture {
        pages: HashMap<String, String>,
    }

    impl PageSource for Fixture {
        fn fetch_page(&self, url: &Url) -> Result<RawPage> {
            let html = self
                .pages
                .get(url.as_str())
                .ok_or_else(|| ScanError::Unreachable(url.to_string()))?;
            Ok(RawPage {
                requested_url: url.to_string(),
                final_url: url.to_string(),
                html: html.clone(),
            })
        }

        fn link_is_live(&self, url: &str) -> bool {
            !url.contains("dead")
        }
    }

    fn scanner(pages: &[(&str, &str)]) -> Scanner<Fixture> {
        let pages = pages
            .iter()
            .map(|(u, h)| (u.to_string(), h.to_string()))
            .collect();
        Scanner::new(Fixture { pages }, Config::default())
    }

    #[test]
    fn test_invalid_url_fails_fast() {
        let s = scanner(&[]);
        let failed = s.scan("mailto:someone@example.com", None, None).unwrap_err();
        assert_eq!(failed.error.kind(), "invalid_url");
        assert_eq!(failed.competitor, CompetitorOutcome::NotRequested);
    }

    #[test]
    fn test_unreachable_primary() {
        let s = scanner(&[]);
        let failed = s.scan("https://missing.example/", None, None).unwrap_err();
        assert_eq!(failed.error.kind(), "unreachable");
    }

    #[test]
    fn test_competitor_not_requested() {
        let s = scanner(&[("https://a.example/", "<h1>A</h1>")]);
        let scan = s.scan("https://a.example/", None, None).unwrap();
        assert_eq!(scan.competitor, CompetitorOutcome::NotRequested);

        let scan = s.scan("https://a.example/", None, Some("   ")).unwrap();
        assert_eq!(scan.competitor, CompetitorOutcome::NotRequested);
    }

    #[test]
    fn test_broken_links_counted() {
        let html = r#"<a href="/ok">ok</a><a href="/dead">dead</a><a href="/dead-too">x</a>"#;
        let s = scanner(&[("https://a.example/", html)]);
        let result = s.analyze("https://a.example/", None).unwrap();
        assert_eq!(result.links_checked, 3);
        assert_eq!(result.broken_links_count, 2);
        assert_eq!(result.sub_scores.links, 33);
    }

    #[test]
    fn test_compare_statements() {
        let s = scanner(&[
            ("https://a.example/", "<title>Short</title><h1>A</h1><h2>B</h2>"),
            ("https://b.example/", "<p>nothing</p>"),
        ]);
        let scan = s
            .scan("https://a.example/", None, Some("https://b.example/"))
            .unwrap();
        let comparison = scan.competitor.comparison().expect("competitor compared");
        assert_eq!(comparison.url, "https://b.example/");
        assert!(comparison.summary.contains("b.example"));
        assert!(comparison
            .advantages
            .iter()
            .any(|a| a.starts_with("On-page structure")));
        assert!(!comparison.advantages.iter().any(|a| a.starts_with("Links:")));
    }

    #[test]
    fn test_competitor_scanned_when_primary_fails() {
        let s = scanner(&[("https://b.example/", "<h1>B</h1>")]);
        let failed = s
            .scan("https://down.example/", None, Some("https://b.example/"))
            .unwrap_err();
        assert_eq!(failed.error.kind(), "unreachable");
        match failed.competitor {
            CompetitorOutcome::Scanned(theirs) => assert_eq!(theirs.url, "https://b.example/"),
            other => panic!("expected scanned competitor, got {:?}", other),
        }
    }

    #[test]
    fn test_link_checks_capped_above_config() {
        let links: String = (0..40)
            .map(|i| format!(r#"<a href="/p{}">p</a>"#, i))
            .collect();
        let mut config = Config::default();
        config.fetch.max_link_checks = 1_000;
        let pages = [("https://a.example/".to_string(), links)].into_iter().collect();
        let s = Scanner::new(Fixture { pages }, config);

        let result = s.analyze("https://a.example/", None).unwrap();
        assert_eq!(result.links_checked, crate::config::MAX_LINK_CHECKS_CAP);
    }

    #[test]
    fn test_hash_content_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
        assert_eq!(hash_content("abc").len(), 64);
    }
}
