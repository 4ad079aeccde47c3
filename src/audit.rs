//! Audit findings and improvement tips
//!
//! Findings come out in a fixed category order (title, meta, headings, images,
//! links, canonical, structured data, mobile viewport, then content and
//! keyword). Tips follow the same order and are only padded with generic
//! advice when the page itself yields fewer than the configured minimum.

use serde::Serialize;

use crate::document::PageDocument;
use crate::fetch::LinkHealth;
use crate::scoring::{
    self, LengthFit, KEYWORD_IDEAL_MAX, KEYWORD_IDEAL_MIN, META_DESCRIPTION_MAX,
    META_DESCRIPTION_MIN, TITLE_MAX, TITLE_MIN,
};
use crate::text_stats::TextStats;

/// Word count under which a page is considered thin
pub const THIN_CONTENT_WORDS: usize = 300;
/// Readability under which the text is flagged as hard to read
pub const HARD_READABILITY: f64 = 50.0;
/// Readability at or above which the text counts as a strength
pub const EASY_READABILITY: f64 = 60.0;

/// Best-practice advice used only to top up short tip lists
const GENERIC_TIPS: &[&str] = &[
    "Link to related pages on your own site to spread authority and help crawlers.",
    "Compress images and serve modern formats such as WebP to speed up loading.",
    "Refresh the content regularly so it stays accurate and current.",
    "Earn backlinks from reputable sites in your niche.",
    "Use short, descriptive, hyphenated URLs that name the topic.",
    "Serve every page over HTTPS.",
    "Submit an XML sitemap to search engines.",
    "Check Core Web Vitals and fix slow-loading resources.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Title,
    Meta,
    Headings,
    Images,
    Links,
    Canonical,
    StructuredData,
    Mobile,
    Content,
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Issue,
    Warning,
    Strength,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Issue => "❌",
            Severity::Warning => "⚠️",
            Severity::Strength => "✅",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn new(category: Category, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.severity.icon(), self.message)
    }
}

/// Findings and tips for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Audit {
    pub findings: Vec<Finding>,
    pub tips: Vec<String>,
}

impl Audit {
    pub fn issues(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Issue)
    }

    pub fn strengths(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Strength)
    }

    pub fn rendered_findings(&self) -> Vec<String> {
        self.findings.iter().map(Finding::render).collect()
    }
}

/// Inputs the audit reads; all borrowed from one pipeline run
pub struct AuditInput<'a> {
    pub doc: &'a PageDocument,
    pub stats: &'a TextStats,
    pub keyword: Option<&'a str>,
    pub links: &'a LinkHealth,
    pub target_word_count: usize,
    pub min_tips: usize,
}

struct Builder {
    findings: Vec<Finding>,
    tips: Vec<String>,
}

impl Builder {
    fn issue(&mut self, category: Category, message: impl Into<String>, tip: impl Into<String>) {
        self.findings.push(Finding::new(category, Severity::Issue, message));
        self.tips.push(tip.into());
    }

    fn warning(&mut self, category: Category, message: impl Into<String>, tip: impl Into<String>) {
        self.findings.push(Finding::new(category, Severity::Warning, message));
        self.tips.push(tip.into());
    }

    fn strength(&mut self, category: Category, message: impl Into<String>) {
        self.findings.push(Finding::new(category, Severity::Strength, message));
    }
}

pub fn audit(input: &AuditInput<'_>) -> Audit {
    let mut b = Builder {
        findings: Vec::new(),
        tips: Vec::new(),
    };

    check_title(&mut b, input.doc);
    check_meta(&mut b, input.doc);
    check_headings(&mut b, input.doc);
    check_images(&mut b, input.doc);
    check_links(&mut b, input.doc, input.links);
    check_canonical(&mut b, input.doc);
    check_structured_data(&mut b, input.doc);
    check_viewport(&mut b, input.doc);
    check_content(&mut b, input.stats, input.target_word_count);
    if let Some(keyword) = input.keyword.map(str::trim).filter(|k| !k.is_empty()) {
        check_keyword(&mut b, input.doc, input.stats, keyword);
    }

    let mut tips = b.tips;
    pad_tips(&mut tips, input.min_tips);

    Audit {
        findings: b.findings,
        tips,
    }
}

/// Top up with generic advice until `min` tips exist; specific tips stay first
pub fn pad_tips(tips: &mut Vec<String>, min: usize) {
    for generic in GENERIC_TIPS {
        if tips.len() >= min {
            break;
        }
        if !tips.iter().any(|t| t == generic) {
            tips.push((*generic).to_string());
        }
    }
}

fn check_title(b: &mut Builder, doc: &PageDocument) {
    let len = doc.title.as_deref().map_or(0, |t| t.chars().count());
    match scoring::title_fit(doc) {
        LengthFit::Missing => b.issue(
            Category::Title,
            "Missing title tag",
            format!(
                "Add a descriptive <title> of {}-{} characters that names the page topic.",
                TITLE_MIN, TITLE_MAX
            ),
        ),
        LengthFit::TooShort => b.warning(
            Category::Title,
            format!("Title is too short ({} chars, recommended {}-{})", len, TITLE_MIN, TITLE_MAX),
            format!("Lengthen the title to at least {} characters.", TITLE_MIN),
        ),
        LengthFit::TooLong => b.warning(
            Category::Title,
            format!("Title is too long ({} chars, recommended {}-{})", len, TITLE_MIN, TITLE_MAX),
            format!("Shorten the title to {} characters so it is not truncated in results.", TITLE_MAX),
        ),
        LengthFit::Good => b.strength(Category::Title, format!("Title tag is well sized ({} chars)", len)),
    }
}

fn check_meta(b: &mut Builder, doc: &PageDocument) {
    let len = doc.meta_description.as_deref().map_or(0, |t| t.chars().count());
    match scoring::meta_fit(doc) {
        LengthFit::Missing => b.issue(
            Category::Meta,
            "Missing meta description",
            format!(
                "Write a meta description of {}-{} characters that summarises the page.",
                META_DESCRIPTION_MIN, META_DESCRIPTION_MAX
            ),
        ),
        LengthFit::TooShort => b.warning(
            Category::Meta,
            format!(
                "Meta description is too short ({} chars, recommended {}-{})",
                len, META_DESCRIPTION_MIN, META_DESCRIPTION_MAX
            ),
            format!("Expand the meta description to at least {} characters.", META_DESCRIPTION_MIN),
        ),
        LengthFit::TooLong => b.warning(
            Category::Meta,
            format!(
                "Meta description is too long ({} chars, recommended {}-{})",
                len, META_DESCRIPTION_MIN, META_DESCRIPTION_MAX
            ),
            format!("Trim the meta description to {} characters.", META_DESCRIPTION_MAX),
        ),
        LengthFit::Good => b.strength(
            Category::Meta,
            format!("Meta description is well sized ({} chars)", len),
        ),
    }
}

fn check_headings(b: &mut Builder, doc: &PageDocument) {
    match doc.h1_count() {
        0 => b.issue(
            Category::Headings,
            "Missing H1 heading",
            "Add a single H1 heading that states what the page is about.",
        ),
        1 => b.strength(Category::Headings, "Exactly one H1 heading"),
        n => b.warning(
            Category::Headings,
            format!("Multiple H1 headings ({})", n),
            "Keep exactly one H1 and demote the others to H2.",
        ),
    }

    let h2 = doc.headings.h2.len();
    if h2 == 0 {
        b.warning(
            Category::Headings,
            "No H2 subheadings",
            "Break the content into sections with H2 subheadings.",
        );
    } else {
        b.strength(Category::Headings, format!("{} H2 subheading{}", h2, plural(h2)));
    }
}

fn check_images(b: &mut Builder, doc: &PageDocument) {
    let total = doc.images.len();
    let missing = doc.images_missing_alt();
    if missing > 0 {
        b.issue(
            Category::Images,
            format!("{} image{} missing ALT text", missing, plural(missing)),
            format!(
                "Add descriptive ALT text to the {} image{} that lack it.",
                missing,
                plural(missing)
            ),
        );
    } else if total > 0 {
        b.strength(
            Category::Images,
            format!("All {} image{} have ALT text", total, plural(total)),
        );
    }
}

fn check_links(b: &mut Builder, doc: &PageDocument, links: &LinkHealth) {
    if links.broken > 0 {
        b.issue(
            Category::Links,
            format!(
                "{} broken link{} found ({} checked)",
                links.broken,
                plural(links.broken),
                links.checked
            ),
            format!("Fix or remove the {} broken link{}.", links.broken, plural(links.broken)),
        );
    } else if links.checked > 0 {
        b.strength(
            Category::Links,
            format!("All {} checked link{} are reachable", links.checked, plural(links.checked)),
        );
    } else if doc.links.is_empty() {
        b.warning(
            Category::Links,
            "No links found on the page",
            "Link to related pages so visitors and crawlers can go further.",
        );
    }
}

fn check_canonical(b: &mut Builder, doc: &PageDocument) {
    match &doc.canonical_url {
        Some(url) => b.strength(Category::Canonical, format!("Canonical URL set ({})", url)),
        None => b.issue(
            Category::Canonical,
            "Missing canonical tag",
            "Add a <link rel=\"canonical\"> tag to avoid duplicate-content issues.",
        ),
    }
}

fn check_structured_data(b: &mut Builder, doc: &PageDocument) {
    if doc.has_structured_data() {
        if doc.structured_data_types.is_empty() {
            b.strength(Category::StructuredData, "Structured data found");
        } else {
            let types: Vec<&str> = doc.structured_data_types.iter().map(String::as_str).collect();
            b.strength(
                Category::StructuredData,
                format!("Structured data found ({})", types.join(", ")),
            );
        }
    } else {
        b.issue(
            Category::StructuredData,
            "No structured data (schema.org) found",
            "Add JSON-LD structured data (schema.org) that describes the page.",
        );
    }

    if doc.json_ld_errors > 0 {
        b.warning(
            Category::StructuredData,
            format!(
                "{} JSON-LD block{} could not be parsed",
                doc.json_ld_errors,
                plural(doc.json_ld_errors)
            ),
            "Validate the JSON-LD blocks; invalid JSON is ignored by search engines.",
        );
    }
}

fn check_viewport(b: &mut Builder, doc: &PageDocument) {
    if doc.has_viewport_tag {
        b.strength(Category::Mobile, "Mobile viewport tag present");
    } else {
        b.issue(
            Category::Mobile,
            "Missing mobile viewport tag",
            "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"> for mobile visitors.",
        );
    }
}

fn check_content(b: &mut Builder, stats: &TextStats, target_word_count: usize) {
    let words = stats.word_count;
    if words < THIN_CONTENT_WORDS {
        b.issue(
            Category::Content,
            format!("Thin content ({} words)", words),
            format!("Expand the page toward {} words of useful content.", target_word_count),
        );
    } else if words < target_word_count {
        b.warning(
            Category::Content,
            format!("Content could be longer ({} words, target {})", words, target_word_count),
            format!("Add depth to the page; around {} words tends to rank better.", target_word_count),
        );
    } else {
        b.strength(Category::Content, format!("Substantial content ({} words)", words));
    }

    if words > 0 {
        if stats.readability < HARD_READABILITY {
            b.warning(
                Category::Content,
                format!("Text is hard to read (readability {:.0})", stats.readability),
                "Shorten sentences and prefer simpler words to improve readability.",
            );
        } else if stats.readability >= EASY_READABILITY {
            b.strength(
                Category::Content,
                format!("Text is easy to read (readability {:.0})", stats.readability),
            );
        }
    }
}

fn check_keyword(b: &mut Builder, doc: &PageDocument, stats: &TextStats, keyword: &str) {
    let percent = stats.keyword_density * 100.0;

    if stats.keyword_occurrences == 0 {
        b.issue(
            Category::Keyword,
            format!("Keyword '{}' not found in the page text", keyword),
            format!("Use '{}' naturally in the opening paragraph and body.", keyword),
        );
    } else if stats.keyword_density < KEYWORD_IDEAL_MIN {
        b.warning(
            Category::Keyword,
            format!("Keyword '{}' density is low ({:.2}%)", keyword, percent),
            format!(
                "Mention '{}' a few more times (aim for {:.0}-{:.1}% density).",
                keyword,
                KEYWORD_IDEAL_MIN * 100.0,
                KEYWORD_IDEAL_MAX * 100.0
            ),
        );
    } else if stats.keyword_density > KEYWORD_IDEAL_MAX {
        b.warning(
            Category::Keyword,
            format!("Keyword '{}' density is high ({:.2}%)", keyword, percent),
            format!("Reduce repetitions of '{}' to avoid looking like keyword stuffing.", keyword),
        );
    } else {
        b.strength(
            Category::Keyword,
            format!("Keyword '{}' density is healthy ({:.2}%)", keyword, percent),
        );
    }

    let needle = keyword.to_lowercase();
    let in_title = doc
        .title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(&needle));
    if in_title {
        b.strength(Category::Keyword, format!("Keyword '{}' appears in the title", keyword));
    } else {
        b.warning(
            Category::Keyword,
            format!("Keyword '{}' missing from the title", keyword),
            format!("Include '{}' in the page title.", keyword),
        );
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ImageInfo;

    fn run(doc: &PageDocument, links: &LinkHealth, keyword: Option<&str>) -> Audit {
        let stats = TextStats::compute(&doc.raw_text, keyword, 10);
        audit(&AuditInput {
            doc,
            stats: &stats,
            keyword,
            links,
            target_word_count: 800,
            min_tips: 6,
        })
    }

    fn category_order(audit: &Audit) -> Vec<Category> {
        let mut seen = Vec::new();
        for f in &audit.findings {
            if seen.last() != Some(&f.category) {
                seen.push(f.category);
            }
        }
        seen
    }

    #[test]
    fn test_findings_follow_category_order() {
        let doc = PageDocument::parse("<p>hello</p>", "https://example.com");
        let result = run(&doc, &LinkHealth::default(), Some("hello"));
        let order = category_order(&result);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(order.first(), Some(&Category::Title));
    }

    #[test]
    fn test_missing_alt_message() {
        let mut doc = PageDocument::default();
        doc.images = (0..10)
            .map(|i| ImageInfo {
                src: None,
                has_alt: i % 2 == 0,
                alt_length: if i % 2 == 0 { 5 } else { 0 },
            })
            .collect();
        let result = run(&doc, &LinkHealth::default(), None);
        let rendered = result.rendered_findings();
        assert!(rendered.contains(&"❌ 5 images missing ALT text".to_string()));
    }

    #[test]
    fn test_tips_padded_to_minimum() {
        let html = r#"<html><head>
            <title>A perfectly reasonable page title</title>
            <meta name="description" content="A meta description that is long enough to pass the length check.">
            <meta name="viewport" content="width=device-width">
            <link rel="canonical" href="https://example.com/">
            <script type="application/ld+json">{"@type":"WebPage"}</script>
            </head><body><h1>Title</h1><h2>Section</h2><p>Short text. <a href="/about">About</a></p></body></html>"#;
        let doc = PageDocument::parse(html, "https://example.com/");
        let result = run(&doc, &LinkHealth::default(), None);

        assert_eq!(result.tips.len(), 6);
        // page-derived tips come first
        assert!(result.tips[0].starts_with("Expand the page"));
        assert_eq!(result.tips[1..], GENERIC_TIPS[..5]);
    }

    #[test]
    fn test_no_padding_when_enough_specific_tips() {
        let doc = PageDocument::parse("<p>x</p>", "https://example.com");
        let links = LinkHealth {
            checked: 4,
            broken: 2,
            ..Default::default()
        };
        let result = run(&doc, &links, Some("widgets"));
        assert!(result.tips.len() >= 6);
        for generic in GENERIC_TIPS {
            assert!(!result.tips.iter().any(|t| t == generic));
        }
    }

    #[test]
    fn test_pad_tips_skips_duplicates() {
        let mut tips = vec![GENERIC_TIPS[0].to_string()];
        pad_tips(&mut tips, 3);
        assert_eq!(tips, vec![GENERIC_TIPS[0], GENERIC_TIPS[1], GENERIC_TIPS[2]]);
    }

    #[test]
    fn test_broken_link_entry() {
        let doc = PageDocument::default();
        let links = LinkHealth {
            checked: 10,
            broken: 3,
            ..Default::default()
        };
        let result = run(&doc, &links, None);
        let broken: Vec<_> = result
            .issues()
            .filter(|f| f.category == Category::Links)
            .collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].message, "3 broken links found (10 checked)");
    }
}
