//! Caller-facing payloads: the JSON shape hosts rely on, and a terminal rendering

use colored::Colorize;
use serde::Serialize;

use crate::audit::Severity;
use crate::error::{Result, ScanError};
use crate::scoring::SubScores;
use crate::scan::{CompetitorOutcome, FailedScan, PageMeta, Scan, ScanOutcome, ScanResult};

/// Sub-scores of a competitor as they appear in `competitor_data`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorData {
    pub url: String,
    pub score: u8,
    pub content: u8,
    pub keyword: u8,
    pub technical: u8,
    pub onpage: u8,
    pub links: u8,
}

impl CompetitorData {
    fn new(url: &str, score: u8, sub: SubScores) -> Self {
        Self {
            url: url.to_string(),
            score,
            content: sub.content,
            keyword: sub.keyword,
            technical: sub.technical,
            onpage: sub.onpage,
            links: sub.links,
        }
    }
}

/// Successful scan payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub url: String,
    pub score: u8,
    pub content: u8,
    pub keyword: u8,
    pub technical: u8,
    pub onpage: u8,
    pub links: u8,
    pub broken_links: usize,
    pub links_checked: usize,
    /// Keyword occurrences per word, a fraction in [0, 1] (not a percentage)
    pub keyword_density: f64,
    /// One decimal
    pub readability: f64,
    /// Newline-joined findings
    pub audit: String,
    /// Newline-joined recommendations
    pub tips: String,
    pub page: PageMeta,
    /// Absent when no competitor was requested, null when it could not be scanned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_data: Option<Option<CompetitorData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_advantages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_disadvantages: Option<String>,
}

/// Failure payload; `error` is the discriminator callers branch on.
///
/// A requested competitor is still reported, with the same omitted/null rule
/// as the success payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_data: Option<Option<CompetitorData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScanResponse {
    Report(Box<ScanReport>),
    Failure(ScanFailure),
}

impl ScanResponse {
    pub fn from_result(result: ScanOutcome) -> Self {
        match result {
            Ok(scan) => ScanResponse::Report(Box::new(ScanReport::from_scan(&scan))),
            Err(failed) => ScanResponse::Failure(ScanFailure::from_failed(&failed)),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScanResponse::Failure(_))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ScanFailure {
    pub fn from_error(error: &ScanError) -> Self {
        Self {
            error: error.kind(),
            message: error.to_string(),
            competitor_data: None,
            competitor_summary: None,
        }
    }

    pub fn from_failed(failed: &FailedScan) -> Self {
        let mut failure = Self::from_error(&failed.error);
        match &failed.competitor {
            CompetitorOutcome::NotRequested => {}
            CompetitorOutcome::Unavailable { url, kind, .. } => {
                failure.competitor_data = Some(None);
                failure.competitor_summary =
                    Some(format!("Competitor {} could not be scanned ({}).", url, kind));
            }
            CompetitorOutcome::Compared(c) => {
                failure.competitor_data =
                    Some(Some(CompetitorData::new(&c.url, c.score, c.sub_scores)));
                failure.competitor_summary = Some(c.summary.clone());
            }
            CompetitorOutcome::Scanned(theirs) => {
                failure.competitor_data =
                    Some(Some(CompetitorData::new(&theirs.url, theirs.score, theirs.sub_scores)));
                failure.competitor_summary = Some(format!(
                    "Competitor {} scored {}; your page could not be scanned.",
                    theirs.url, theirs.score
                ));
            }
        }
        failure
    }
}

impl ScanReport {
    pub fn from_scan(scan: &Scan) -> Self {
        let primary = &scan.primary;
        let sub = primary.sub_scores;

        let mut report = Self {
            url: primary.url.clone(),
            score: primary.score,
            content: sub.content,
            keyword: sub.keyword,
            technical: sub.technical,
            onpage: sub.onpage,
            links: sub.links,
            broken_links: primary.broken_links_count,
            links_checked: primary.links_checked,
            keyword_density: primary.keyword_density,
            readability: round_to(primary.readability, 1),
            audit: primary.audit_findings().join("\n"),
            tips: primary.tips.join("\n"),
            page: primary.page_meta.clone(),
            competitor_data: None,
            competitor_summary: None,
            competitor_advantages: None,
            competitor_disadvantages: None,
        };

        match &scan.competitor {
            CompetitorOutcome::NotRequested => {}
            CompetitorOutcome::Unavailable { url, kind, .. } => {
                report.competitor_data = Some(None);
                report.competitor_summary =
                    Some(format!("Competitor {} could not be scanned ({}).", url, kind));
                report.competitor_advantages = Some(String::new());
                report.competitor_disadvantages = Some(String::new());
            }
            CompetitorOutcome::Compared(c) => {
                report.competitor_data =
                    Some(Some(CompetitorData::new(&c.url, c.score, c.sub_scores)));
                report.competitor_summary = Some(c.summary.clone());
                report.competitor_advantages = Some(c.advantages.join("\n"));
                report.competitor_disadvantages = Some(c.disadvantages.join("\n"));
            }
            CompetitorOutcome::Scanned(theirs) => {
                report.competitor_data =
                    Some(Some(CompetitorData::new(&theirs.url, theirs.score, theirs.sub_scores)));
            }
        }

        report
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Human-readable report for the terminal
pub fn render_text(scan: &Scan) -> String {
    let primary = &scan.primary;
    let mut out = String::new();

    out.push_str(&format!(
        "\n{} {}\n\n",
        "SEO report for".bold(),
        primary.url.cyan()
    ));
    out.push_str(&format!(
        "  Overall score: {}\n\n",
        colorize_score(primary.score)
    ));

    for (name, value) in primary.sub_scores.entries() {
        out.push_str(&format!("  {:<10} {}\n", name, colorize_score(value)));
    }

    out.push_str(&format!(
        "\n  Words: {}  Readability: {:.1}  Broken links: {}/{}",
        primary.page_meta.word_count,
        primary.readability,
        primary.broken_links_count,
        primary.links_checked
    ));
    if let Some(keyword) = &primary.keyword {
        out.push_str(&format!(
            "  Keyword '{}': {:.2}%",
            keyword,
            primary.keyword_density * 100.0
        ));
    }
    out.push('\n');

    out.push_str(&format!("\n{}\n", "Audit".bold()));
    render_findings(&mut out, primary);

    out.push_str(&format!("\n{}\n", "Tips".bold()));
    for (i, tip) in primary.tips.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, tip));
    }

    match &scan.competitor {
        CompetitorOutcome::NotRequested => {}
        CompetitorOutcome::Unavailable { url, message, .. } => {
            out.push_str(&format!("\n{}\n", "Competitor".bold()));
            out.push_str(&format!("  {} {} ({})\n", "Could not scan".yellow(), url, message));
        }
        CompetitorOutcome::Compared(c) => {
            out.push_str(&format!("\n{} {}\n", "Competitor".bold(), c.url.cyan()));
            out.push_str(&format!("  {}\n", c.summary));
            for line in &c.advantages {
                out.push_str(&format!("  {} {}\n", "+".green(), line));
            }
            for line in &c.disadvantages {
                out.push_str(&format!("  {} {}\n", "-".red(), line));
            }
        }
        CompetitorOutcome::Scanned(theirs) => {
            out.push_str(&format!("\n{} {}\n", "Competitor".bold(), theirs.url.cyan()));
            out.push_str(&format!("  Overall score: {}\n", colorize_score(theirs.score)));
        }
    }

    out
}

fn render_findings(out: &mut String, result: &ScanResult) {
    for finding in &result.findings {
        let message = match finding.severity {
            Severity::Issue => finding.message.red().to_string(),
            Severity::Warning => finding.message.yellow().to_string(),
            Severity::Strength => finding.message.green().to_string(),
        };
        out.push_str(&format!("  {} {}\n", finding.severity.icon(), message));
    }
}

fn colorize_score(score: u8) -> String {
    let text = format!("{:>3}/100", score);
    if score >= 80 {
        text.green().bold().to_string()
    } else if score >= 50 {
        text.yellow().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let response = ScanResponse::from_result(Err(FailedScan {
            error: ScanError::Unreachable("http://x.invalid".into()),
            competitor: CompetitorOutcome::NotRequested,
        }));
        let json: serde_json::Value =
            serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["error"], "unreachable");
        assert!(json["message"].as_str().unwrap().contains("x.invalid"));
        assert!(response.is_failure());
        assert!(json.get("competitor_data").is_none());
    }

    #[test]
    fn test_failure_keeps_unavailable_competitor() {
        let failure = ScanFailure::from_failed(&FailedScan {
            error: ScanError::InvalidUrl("nope".into()),
            competitor: CompetitorOutcome::Unavailable {
                url: "https://b.example/".into(),
                kind: "unreachable",
                message: "down".into(),
            },
        });
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["error"], "invalid_url");
        assert!(json["competitor_data"].is_null());
        assert!(json.as_object().unwrap().contains_key("competitor_data"));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(72.35, 1), 72.4);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
