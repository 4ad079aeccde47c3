//! Sub-score calculators and the weighted aggregate
//!
//! Every calculator is total: any combination of signals, including an empty
//! page, maps to an integer in [0, 100].

use serde::Serialize;

use crate::config::ScoreWeights;
use crate::document::PageDocument;
use crate::fetch::LinkHealth;
use crate::text_stats::TextStats;

/// Floor of the aggregate score; a fetch failure is reported as an error, never as 0
pub const AGGREGATE_MIN: u8 = 5;

// Content
pub const CONTENT_LENGTH_WEIGHT: f64 = 0.35;
pub const CONTENT_RICHNESS_WEIGHT: f64 = 0.20;
pub const CONTENT_READABILITY_WEIGHT: f64 = 0.20;
pub const CONTENT_HEADINGS_WEIGHT: f64 = 0.25;
/// Distinct terms that earn full richness credit
pub const RICHNESS_TARGET_TERMS: f64 = 100.0;

// Heading structure
pub const SINGLE_H1_CREDIT: f64 = 60.0;
pub const MULTIPLE_H1_CREDIT: f64 = 30.0;
pub const H2_CREDIT: f64 = 25.0;
pub const H3_CREDIT: f64 = 15.0;

// Keyword
pub const KEYWORD_NEUTRAL_SCORE: u8 = 55;
pub const KEYWORD_IDEAL_MIN: f64 = 0.01;
pub const KEYWORD_IDEAL_MAX: f64 = 0.025;
pub const KEYWORD_SPARSE_BASE: f64 = 40.0;
pub const KEYWORD_STUFFING_PENALTY: f64 = 2000.0;
pub const KEYWORD_STUFFING_FLOOR: f64 = 20.0;

// Technical
pub const META_DESCRIPTION_MIN: usize = 50;
pub const META_DESCRIPTION_MAX: usize = 160;
pub const TITLE_MIN: usize = 20;
pub const TITLE_MAX: usize = 70;
pub const TECH_META_CREDIT: f64 = 20.0;
pub const TECH_VIEWPORT_CREDIT: f64 = 20.0;
pub const TECH_SCHEMA_CREDIT: f64 = 15.0;
pub const TECH_TITLE_CREDIT: f64 = 20.0;
pub const TECH_ALT_CREDIT: f64 = 25.0;
pub const MISSING_ALT_PENALTY: f64 = 2.0;
pub const MISSING_ALT_PENALTY_CAP: f64 = 20.0;
pub const BROKEN_LINK_PENALTY: f64 = 5.0;
pub const BROKEN_LINK_PENALTY_CAP: f64 = 30.0;

// On-page
pub const ONPAGE_HEADINGS_WEIGHT: f64 = 0.6;
pub const ONPAGE_META_WEIGHT: f64 = 0.4;
/// Meta description present but outside the recommended length
pub const META_PRESENT_CREDIT: f64 = 60.0;

// Links
pub const LINKS_NEUTRAL_SCORE: u8 = 70;

/// The five sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubScores {
    pub content: u8,
    pub keyword: u8,
    pub technical: u8,
    pub onpage: u8,
    pub links: u8,
}

impl SubScores {
    pub fn compute(
        doc: &PageDocument,
        stats: &TextStats,
        keyword: Option<&str>,
        links: &LinkHealth,
        target_word_count: usize,
    ) -> Self {
        Self {
            content: content_score(doc, stats, target_word_count),
            keyword: keyword_score(keyword, stats.keyword_density),
            technical: technical_score(doc, links),
            onpage: onpage_score(doc),
            links: links_score(links),
        }
    }

    /// Named pairs in display order
    pub fn entries(&self) -> [(&'static str, u8); 5] {
        [
            ("content", self.content),
            ("keyword", self.keyword),
            ("technical", self.technical),
            ("onpage", self.onpage),
            ("links", self.links),
        ]
    }

    /// Human-readable area names in the same order as `entries`
    pub fn labelled(&self) -> [(&'static str, u8); 5] {
        [
            ("Content", self.content),
            ("Keyword targeting", self.keyword),
            ("Technical SEO", self.technical),
            ("On-page structure", self.onpage),
            ("Links", self.links),
        ]
    }
}

/// Length tier of a title or meta description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthFit {
    Missing,
    TooShort,
    Good,
    TooLong,
}

pub fn length_fit(text: Option<&str>, min: usize, max: usize) -> LengthFit {
    match text.map(|t| t.chars().count()) {
        None | Some(0) => LengthFit::Missing,
        Some(n) if n < min => LengthFit::TooShort,
        Some(n) if n > max => LengthFit::TooLong,
        Some(_) => LengthFit::Good,
    }
}

pub fn title_fit(doc: &PageDocument) -> LengthFit {
    length_fit(doc.title.as_deref(), TITLE_MIN, TITLE_MAX)
}

pub fn meta_fit(doc: &PageDocument) -> LengthFit {
    length_fit(doc.meta_description.as_deref(), META_DESCRIPTION_MIN, META_DESCRIPTION_MAX)
}

/// One H1 is full credit; H2 and H3 presence add bounded credit
pub fn heading_structure_score(doc: &PageDocument) -> f64 {
    let h1 = match doc.h1_count() {
        0 => 0.0,
        1 => SINGLE_H1_CREDIT,
        _ => MULTIPLE_H1_CREDIT,
    };
    let h2 = if doc.headings.h2.is_empty() { 0.0 } else { H2_CREDIT };
    let h3 = if doc.headings.h3.is_empty() { 0.0 } else { H3_CREDIT };
    (h1 + h2 + h3).min(100.0)
}

pub fn content_score(doc: &PageDocument, stats: &TextStats, target_word_count: usize) -> u8 {
    let length = (stats.word_count as f64 / target_word_count.max(1) as f64).min(1.0) * 100.0;
    let richness = (stats.distinct_terms as f64 / RICHNESS_TARGET_TERMS).min(1.0) * 100.0;
    let readability = if stats.word_count == 0 { 0.0 } else { stats.readability };

    to_score(
        length * CONTENT_LENGTH_WEIGHT
            + richness * CONTENT_RICHNESS_WEIGHT
            + readability * CONTENT_READABILITY_WEIGHT
            + heading_structure_score(doc) * CONTENT_HEADINGS_WEIGHT,
    )
}

/// Density in the ideal band scores 100; sparse use ramps up, stuffing ramps down
pub fn keyword_score(keyword: Option<&str>, density: f64) -> u8 {
    let has_keyword = keyword.is_some_and(|k| !k.trim().is_empty());
    if !has_keyword {
        return KEYWORD_NEUTRAL_SCORE;
    }

    let score = if density <= 0.0 {
        0.0
    } else if density < KEYWORD_IDEAL_MIN {
        KEYWORD_SPARSE_BASE + (100.0 - KEYWORD_SPARSE_BASE) * density / KEYWORD_IDEAL_MIN
    } else if density <= KEYWORD_IDEAL_MAX {
        100.0
    } else {
        (100.0 - (density - KEYWORD_IDEAL_MAX) * KEYWORD_STUFFING_PENALTY)
            .max(KEYWORD_STUFFING_FLOOR)
    };
    to_score(score)
}

pub fn technical_score(doc: &PageDocument, links: &LinkHealth) -> u8 {
    let mut score = 0.0;

    score += match meta_fit(doc) {
        LengthFit::Good => TECH_META_CREDIT,
        LengthFit::Missing => 0.0,
        _ => TECH_META_CREDIT / 2.0,
    };
    score += match title_fit(doc) {
        LengthFit::Good => TECH_TITLE_CREDIT,
        LengthFit::Missing => 0.0,
        _ => TECH_TITLE_CREDIT / 2.0,
    };
    if doc.has_viewport_tag {
        score += TECH_VIEWPORT_CREDIT;
    }
    if doc.has_structured_data() {
        score += TECH_SCHEMA_CREDIT;
    }
    score += doc.alt_coverage() * TECH_ALT_CREDIT;

    score -= (doc.images_missing_alt() as f64 * MISSING_ALT_PENALTY).min(MISSING_ALT_PENALTY_CAP);
    score -= (links.broken as f64 * BROKEN_LINK_PENALTY).min(BROKEN_LINK_PENALTY_CAP);

    to_score(score)
}

pub fn onpage_score(doc: &PageDocument) -> u8 {
    let meta = match meta_fit(doc) {
        LengthFit::Good => 100.0,
        LengthFit::Missing => 0.0,
        _ => META_PRESENT_CREDIT,
    };
    to_score(heading_structure_score(doc) * ONPAGE_HEADINGS_WEIGHT + meta * ONPAGE_META_WEIGHT)
}

/// Live share of checked links; pages with nothing checked get a neutral score
pub fn links_score(links: &LinkHealth) -> u8 {
    if links.checked == 0 {
        return LINKS_NEUTRAL_SCORE;
    }
    to_score(links.live() as f64 / links.checked as f64 * 100.0)
}

/// Weighted sum of the sub-scores, rounded and clamped to [5, 100]
pub fn aggregate(sub: &SubScores, weights: &ScoreWeights) -> u8 {
    let total = f64::from(sub.content) * weights.content
        + f64::from(sub.keyword) * weights.keyword
        + f64::from(sub.technical) * weights.technical
        + f64::from(sub.onpage) * weights.onpage
        + f64::from(sub.links) * weights.links;
    to_score(total).max(AGGREGATE_MIN)
}

/// Round half away from zero and clamp into [0, 100]
fn to_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
