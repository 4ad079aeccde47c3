//! PageDocument - structural view of one fetched page
//!
//! Everything the scorers and the audit need is pulled out of the HTML in a
//! single pass here. Parsing is lenient: malformed markup, broken JSON-LD and
//! empty bodies all still yield a document, only with fewer signals in it.

use std::collections::BTreeSet;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::text_stats;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Invalid title selector"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name]").expect("Invalid meta selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3").expect("Invalid heading selector"));
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("Invalid image selector"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Invalid anchor selector"));
static CANONICAL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel~="canonical"][href]"#).expect("Invalid canonical selector"));
static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("Invalid JSON-LD selector")
});
static MICRODATA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[itemtype]").expect("Invalid microdata selector"));
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Invalid body selector"));

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Href schemes that are not navigable links
const NON_NAVIGABLE_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:", "data:", "sms:"];

/// Second-level labels that sit under a two-letter country TLD (example.co.uk)
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "org", "net", "gov", "ac", "edu"];

/// An `<img>` element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub src: Option<String>,
    /// Alt attribute present and non-blank
    pub has_alt: bool,
    pub alt_length: usize,
}

/// An `<a href>` element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkInfo {
    pub href: String,
    /// Absolute http(s) target, if the href is navigable
    pub resolved: Option<String>,
    pub is_internal: bool,
    pub is_external: bool,
}

impl LinkInfo {
    /// Whether this link should be probed for liveness
    pub fn is_checkable(&self) -> bool {
        self.resolved.is_some() && !self.href.starts_with('#')
    }
}

/// H1/H2/H3 text in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

/// Immutable structural view of a parsed page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDocument {
    /// URL the document was parsed against (post-redirect)
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub headings: Headings,
    pub images: Vec<ImageInfo>,
    pub links: Vec<LinkInfo>,
    pub canonical_url: Option<String>,
    pub has_viewport_tag: bool,
    /// Schema types from JSON-LD `@type` and microdata `itemtype`
    pub structured_data_types: BTreeSet<String>,
    /// JSON-LD blocks that parsed successfully
    pub json_ld_blocks: usize,
    /// JSON-LD blocks dropped because they were not valid JSON
    pub json_ld_errors: usize,
    /// Visible body text, lowercased with whitespace collapsed
    pub raw_text: String,
    pub word_count: usize,
}

impl PageDocument {
    /// Parse possibly-invalid HTML fetched from `url`
    pub fn parse(html: &str, url: &str) -> Self {
        let document = Html::parse_document(html);
        let base = Url::parse(url).ok();

        let mut page = Self {
            url: url.to_string(),
            ..Default::default()
        };

        page.extract_title(&document);
        page.extract_meta(&document);
        page.extract_headings(&document);
        page.extract_images(&document);
        page.extract_links(&document, base.as_ref());
        page.extract_canonical(&document, base.as_ref());
        page.extract_structured_data(&document);
        page.extract_text(&document);
        page
    }

    pub fn h1_count(&self) -> usize {
        self.headings.h1.len()
    }

    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|img| !img.has_alt).count()
    }

    /// Share of images carrying alt text; 1.0 when the page has no images
    pub fn alt_coverage(&self) -> f64 {
        if self.images.is_empty() {
            return 1.0;
        }
        (self.images.len() - self.images_missing_alt()) as f64 / self.images.len() as f64
    }

    pub fn internal_links(&self) -> usize {
        self.links.iter().filter(|l| l.is_internal).count()
    }

    pub fn external_links(&self) -> usize {
        self.links.iter().filter(|l| l.is_external).count()
    }

    pub fn has_structured_data(&self) -> bool {
        self.json_ld_blocks > 0 || !self.structured_data_types.is_empty()
    }

    /// Distinct navigable link targets, in first-occurrence order
    pub fn link_candidates(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.links
            .iter()
            .filter(|l| l.is_checkable())
            .filter_map(|l| l.resolved.clone())
            .filter(|target| seen.insert(target.clone()))
            .collect()
    }

    fn extract_title(&mut self, document: &Html) {
        if let Some(element) = document.select(&TITLE_SELECTOR).next() {
            self.title = non_blank(collapse(&element.text().collect::<String>()));
        }
    }

    /// Meta names are matched case-insensitively; the first description wins
    fn extract_meta(&mut self, document: &Html) {
        for element in document.select(&META_SELECTOR) {
            let name = element.value().attr("name").unwrap_or_default().trim();
            if name.eq_ignore_ascii_case("viewport") {
                self.has_viewport_tag = true;
            } else if name.eq_ignore_ascii_case("description") && self.meta_description.is_none() {
                self.meta_description = element
                    .value()
                    .attr("content")
                    .and_then(|c| non_blank(collapse(c)));
            }
        }
    }

    fn extract_headings(&mut self, document: &Html) {
        for element in document.select(&HEADING_SELECTOR) {
            let text = collapse(&element.text().collect::<String>());
            match element.value().name() {
                "h1" => self.headings.h1.push(text),
                "h2" => self.headings.h2.push(text),
                _ => self.headings.h3.push(text),
            }
        }
    }

    fn extract_images(&mut self, document: &Html) {
        for element in document.select(&IMAGE_SELECTOR) {
            let alt = element.value().attr("alt").map(str::trim).unwrap_or_default();
            self.images.push(ImageInfo {
                src: element.value().attr("src").map(String::from),
                has_alt: !alt.is_empty(),
                alt_length: alt.chars().count(),
            });
        }
    }

    fn extract_links(&mut self, document: &Html, base: Option<&Url>) {
        let own_domain = base.and_then(|u| u.host_str()).map(registrable_domain);

        for element in document.select(&ANCHOR_SELECTOR) {
            let href = element.value().attr("href").unwrap_or_default().trim().to_string();
            self.links.push(classify_link(href, base, own_domain.as_deref()));
        }
    }

    fn extract_canonical(&mut self, document: &Html, base: Option<&Url>) {
        self.canonical_url = document
            .select(&CANONICAL_SELECTOR)
            .filter_map(|el| el.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
            .map(|href| match base.and_then(|b| b.join(href).ok()) {
                Some(resolved) => resolved.to_string(),
                None => href.to_string(),
            });
    }

    /// A block that fails to parse is skipped, never fatal
    fn extract_structured_data(&mut self, document: &Html) {
        for element in document.select(&JSON_LD_SELECTOR) {
            let text: String = element.text().collect();
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => {
                    self.json_ld_blocks += 1;
                    collect_json_ld_types(&json, &mut self.structured_data_types);
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "skipping malformed JSON-LD block");
                    self.json_ld_errors += 1;
                }
            }
        }

        for element in document.select(&MICRODATA_SELECTOR) {
            if let Some(itemtype) = element.value().attr("itemtype") {
                for t in itemtype.split_whitespace() {
                    if let Some(name) = t.trim_end_matches('/').rsplit('/').next() {
                        if !name.is_empty() {
                            self.structured_data_types.insert(name.to_string());
                        }
                    }
                }
            }
        }
    }

    fn extract_text(&mut self, document: &Html) {
        let root = document
            .select(&BODY_SELECTOR)
            .next()
            .unwrap_or_else(|| document.root_element());

        self.raw_text = collapse(&visible_text(root)).to_lowercase();
        self.word_count = text_stats::word_count(&self.raw_text);
    }
}

/// Text nodes under `root` that are not inside script/style-like elements
fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

fn classify_link(href: String, base: Option<&Url>, own_domain: Option<&str>) -> LinkInfo {
    let lower = href.to_ascii_lowercase();

    if href.is_empty() || NON_NAVIGABLE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return LinkInfo {
            href,
            resolved: None,
            is_internal: false,
            is_external: false,
        };
    }

    let absolute = lower.starts_with("http://") || lower.starts_with("https://");
    let resolved = match base {
        Some(b) => b.join(&href).ok(),
        None => Url::parse(&href).ok(),
    }
    .filter(|u| matches!(u.scheme(), "http" | "https"))
    .map(|mut u| {
        u.set_fragment(None);
        u
    });

    // Relative and scheme-relative paths count as the page's own site
    let is_internal = if absolute {
        match (resolved.as_ref().and_then(|u| u.host_str()), own_domain) {
            (Some(host), Some(own)) => registrable_domain(host) == own,
            _ => false,
        }
    } else {
        true
    };

    LinkInfo {
        href,
        resolved: resolved.map(|u| u.to_string()),
        is_internal,
        is_external: !is_internal,
    }
}

/// Approximate registrable domain: last two labels, three under `co.uk`-style suffixes
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let trimmed = host.trim_start_matches('[').trim_end_matches(']');
    if trimmed.parse::<IpAddr>().is_ok() {
        return host;
    }

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();
    if n <= 2 {
        return host.to_string();
    }

    let keep = if labels[n - 1].len() == 2 && SECOND_LEVEL_LABELS.contains(&labels[n - 2]) {
        3
    } else {
        2
    };
    labels[n - keep..].join(".")
}

/// Collect `@type` values recursively, skipping `@context`
fn collect_json_ld_types(json: &serde_json::Value, types: &mut BTreeSet<String>) {
    match json {
        serde_json::Value::Object(map) => {
            match map.get("@type") {
                Some(serde_json::Value::String(s)) => {
                    types.insert(s.clone());
                }
                Some(serde_json::Value::Array(arr)) => {
                    for item in arr {
                        if let serde_json::Value::String(s) = item {
                            types.insert(s.clone());
                        }
                    }
                }
                _ => {}
            }
            for (key, value) in map {
                if key != "@context" {
                    collect_json_ld_types(value, types);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr {
                collect_json_ld_types(item, types);
            }
        }
        _ => {}
    }
}

fn collapse(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

fn non_blank(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.example.com/blog/post";

    #[test]
    fn test_basic_extraction() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head>
                <title>  Growing   Tomatoes at Home </title>
                <meta name="Description" content="A practical guide to growing tomatoes.">
                <meta name="viewport" content="width=device-width, initial-scale=1">
                <link rel="canonical" href="/blog/post">
            </head>
            <body>
                <h1>Tomatoes</h1>
                <h2>Soil</h2>
                <h3>Compost</h3>
                <h2>Water</h2>
                <p>Plant them in spring.</p>
                <script>var ignored = "not visible text";</script>
            </body>
            </html>
        "#;

        let doc = PageDocument::parse(html, PAGE_URL);

        assert_eq!(doc.title.as_deref(), Some("Growing Tomatoes at Home"));
        assert_eq!(
            doc.meta_description.as_deref(),
            Some("A practical guide to growing tomatoes.")
        );
        assert!(doc.has_viewport_tag);
        assert_eq!(doc.canonical_url.as_deref(), Some("https://www.example.com/blog/post"));
        assert_eq!(doc.headings.h1, vec!["Tomatoes"]);
        assert_eq!(doc.headings.h2, vec!["Soil", "Water"]);
        assert_eq!(doc.headings.h3, vec!["Compost"]);
        assert!(!doc.raw_text.contains("ignored"));
        assert!(doc.raw_text.contains("plant them in spring."));
        assert_eq!(doc.word_count, 8);
    }

    #[test]
    fn test_empty_page_is_valid() {
        let doc = PageDocument::parse("", PAGE_URL);
        assert_eq!(doc.title, None);
        assert_eq!(doc.meta_description, None);
        assert_eq!(doc.word_count, 0);
        assert!(doc.links.is_empty());
        assert!(!doc.has_structured_data());
    }

    #[test]
    fn test_images_alt_presence() {
        let html = r#"<body>
            <img src="a.png" alt="A red tomato">
            <img src="b.png" alt="   ">
            <img src="c.png">
        </body>"#;
        let doc = PageDocument::parse(html, PAGE_URL);

        assert_eq!(doc.images.len(), 3);
        assert!(doc.images[0].has_alt);
        assert_eq!(doc.images[0].alt_length, 12);
        assert_eq!(doc.images_missing_alt(), 2);
        assert!((doc.alt_coverage() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_link_classification() {
        let html = r##"<body>
            <a href="/about">About</a>
            <a href="contact.html">Contact</a>
            <a href="https://blog.example.com/x">Blog</a>
            <a href="//cdn.other.org/file">CDN</a>
            <a href="https://other.org/">Other</a>
            <a href="mailto:me@example.com">Mail</a>
            <a href="#top">Top</a>
        </body>"##;
        let doc = PageDocument::parse(html, PAGE_URL);

        let flags: Vec<(bool, bool)> =
            doc.links.iter().map(|l| (l.is_internal, l.is_external)).collect();
        assert_eq!(
            flags,
            vec![
                (true, false),
                (true, false),
                (true, false),
                (true, false),
                (false, true),
                (false, false),
                (true, false),
            ]
        );
        assert_eq!(doc.internal_links(), 5);
        assert_eq!(doc.external_links(), 1);
    }

    #[test]
    fn test_link_candidates_dedup_in_order() {
        let html = r##"<body>
            <a href="/a">A</a>
            <a href="https://other.org/">O</a>
            <a href="/a#section">A again</a>
            <a href="#top">Top</a>
            <a href="tel:123">Call</a>
        </body>"##;
        let doc = PageDocument::parse(html, PAGE_URL);

        assert_eq!(
            doc.link_candidates(),
            vec!["https://www.example.com/a", "https://other.org/"]
        );
    }

    #[test]
    fn test_json_ld_extraction() {
        let html = r#"
            <head>
                <script type="application/ld+json">
                {
                    "@context": "https://schema.org",
                    "@type": "Product",
                    "offers": { "@type": "Offer", "price": "9.99" }
                }
                </script>
                <script type="application/ld+json">{ not json </script>
            </head>
            <body><div itemscope itemtype="https://schema.org/Recipe"></div></body>
        "#;
        let doc = PageDocument::parse(html, PAGE_URL);

        assert_eq!(doc.json_ld_blocks, 1);
        assert_eq!(doc.json_ld_errors, 1);
        assert!(doc.has_structured_data());
        let types: Vec<&str> = doc.structured_data_types.iter().map(String::as_str).collect();
        assert_eq!(types, vec!["Offer", "Product", "Recipe"]);
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let html = "<html><head><title>Broken</title><body><h1>Still <b>here</h1><p>text <img src=x>";
        let doc = PageDocument::parse(html, PAGE_URL);
        assert_eq!(doc.images.len(), 1);
        assert!(doc.h1_count() <= 1);
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("www.example.com"), "example.com");
        assert_eq!(registrable_domain("blog.shop.example.com"), "example.com");
        assert_eq!(registrable_domain("shop.example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("localhost"), "localhost");
        assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
    }
}
