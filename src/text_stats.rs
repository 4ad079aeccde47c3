//! Word-level statistics over a page's visible text

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Lower bound of the readability estimate
pub const READABILITY_MIN: f64 = 5.0;
/// Upper bound of the readability estimate
pub const READABILITY_MAX: f64 = 95.0;
/// Shortest word considered a candidate term
pub const MIN_TERM_CHARS: usize = 4;

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}\p{N}]+)*").expect("Invalid word regex")
});

static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("Invalid sentence regex"));

/// Frequent function words long enough to pass the term length filter
const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "could", "does", "each", "from",
    "have", "here", "into", "just", "like", "more", "most", "only", "other", "over", "should",
    "some", "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "very", "were", "what", "when", "where", "which", "while", "will", "with",
    "would", "your",
];

/// A term with its frequency-dispersion score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTerm {
    pub term: String,
    pub count: usize,
    pub score: f64,
}

/// Text statistics for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStats {
    pub word_count: usize,
    pub sentence_count: usize,
    /// Bounded reading-ease proxy in [5, 95]
    pub readability: f64,
    /// Keyword occurrences per word, 0 when no keyword
    pub keyword_density: f64,
    pub keyword_occurrences: usize,
    /// Distinct candidate terms on the page
    pub distinct_terms: usize,
    pub top_terms: Vec<RankedTerm>,
}

impl TextStats {
    pub fn compute(text: &str, keyword: Option<&str>, top_n: usize) -> Self {
        let words = tokenize(text);
        let sentences = sentence_count(text);
        let keyword_occurrences = keyword.map_or(0, |k| count_phrase(&words, &tokenize(k)));

        Self {
            word_count: words.len(),
            sentence_count: sentences,
            readability: reading_ease(&words, sentences),
            keyword_density: density(keyword_occurrences, words.len()),
            keyword_occurrences,
            distinct_terms: term_counts(&words).len(),
            top_terms: rank(&words, top_n),
        }
    }
}

/// Lowercased word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Sentences with at least one word; text without terminal punctuation is one sentence
pub fn sentence_count(text: &str) -> usize {
    SENTENCE_END_RE
        .split(text)
        .filter(|s| WORD_RE.is_match(s))
        .count()
}

/// Vowel-group syllable estimate, never below one
pub fn syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let mut count = 0;
    let mut prev_vowel = false;
    for c in lower.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if count > 1 && lower.ends_with('e') && !lower.ends_with("le") {
        count -= 1;
    }
    count.max(1)
}

/// Reading-ease proxy from words per sentence and syllables per word.
///
/// Uses the Flesch reading-ease shape, clamped to [5, 95]. Empty text scores 5.
pub fn readability(text: &str) -> f64 {
    reading_ease(&tokenize(text), sentence_count(text))
}

fn reading_ease(words: &[String], sentences: usize) -> f64 {
    if words.is_empty() {
        return READABILITY_MIN;
    }

    let sentences = sentences.max(1) as f64;
    let word_total = words.len() as f64;
    let syllable_total: usize = words.iter().map(|w| syllables(w)).sum();

    let words_per_sentence = word_total / sentences;
    let syllables_per_word = syllable_total as f64 / word_total;
    let ease = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;

    ease.clamp(READABILITY_MIN, READABILITY_MAX)
}

/// Case-insensitive keyword occurrences divided by total words
pub fn keyword_density(keyword: Option<&str>, text: &str) -> f64 {
    let Some(keyword) = keyword else {
        return 0.0;
    };
    let words = tokenize(text);
    density(count_phrase(&words, &tokenize(keyword)), words.len())
}

/// Top `top_n` candidate terms by frequency-dispersion score.
///
/// Score is `tf * ln(1 + total / (count + 1))`. Ties keep first-occurrence order.
pub fn ranked_terms(text: &str, top_n: usize) -> Vec<RankedTerm> {
    rank(&tokenize(text), top_n)
}

fn density(occurrences: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    occurrences as f64 / total as f64
}

/// Non-overlapping matches of `phrase` within `words`
fn count_phrase(words: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || words.len() < phrase.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + phrase.len() <= words.len() {
        if words[i..i + phrase.len()] == *phrase {
            count += 1;
            i += phrase.len();
        } else {
            i += 1;
        }
    }
    count
}

fn is_candidate(word: &str) -> bool {
    word.chars().count() >= MIN_TERM_CHARS
        && !STOP_WORDS.contains(&word)
        && !word.chars().all(|c| c.is_ascii_digit())
}

/// Candidate counts in first-occurrence order
fn term_counts(words: &[String]) -> Vec<(&str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for word in words.iter().filter(|w| is_candidate(w)) {
        match index.get(word.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word.as_str(), counts.len());
                counts.push((word.as_str(), 1));
            }
        }
    }
    counts
}

fn rank(words: &[String], top_n: usize) -> Vec<RankedTerm> {
    let total = words.len() as f64;
    let mut ranked: Vec<RankedTerm> = term_counts(words)
        .into_iter()
        .map(|(term, count)| {
            let tf = count as f64 / total;
            RankedTerm {
                term: term.to_string(),
                count,
                score: tf * (1.0 + total / (count as f64 + 1.0)).ln(),
            }
        })
        .collect();

    // sort_by is stable, so equal scores keep first-occurrence order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_keeps_apostrophes() {
        assert_eq!(
            tokenize("Don't STOP, it's 2024!"),
            vec!["don't", "stop", "it's", "2024"]
        );
    }

    #[test]
    fn test_sentence_count() {
        assert_eq!(sentence_count("One. Two! Three?"), 3);
        assert_eq!(sentence_count("no punctuation here"), 1);
        assert_eq!(sentence_count("..."), 0);
        assert_eq!(sentence_count(""), 0);
    }

    #[test]
    fn test_syllables() {
        assert_eq!(syllables("cat"), 1);
        assert_eq!(syllables("garden"), 2);
        assert_eq!(syllables("make"), 1);
        assert_eq!(syllables("table"), 2);
        assert_eq!(syllables("rhythm"), 1);
        assert_eq!(syllables("2024"), 1);
    }

    #[test]
    fn test_readability_is_bounded() {
        assert_eq!(readability(""), READABILITY_MIN);
        let simple = "The cat sat. The dog ran. We had fun.";
        let dense = "Institutionalization of interdisciplinary epistemological considerations \
                     notwithstanding, organizational responsibilities necessitate comprehensive \
                     reconceptualization of administrative infrastructure requirements";
        let easy = readability(simple);
        let hard = readability(dense);
        assert!((READABILITY_MIN..=READABILITY_MAX).contains(&easy));
        assert!((READABILITY_MIN..=READABILITY_MAX).contains(&hard));
        assert!(easy > hard);
    }

    #[test]
    fn test_keyword_density_absent_keyword_or_text() {
        assert_eq!(keyword_density(None, "some text about seo"), 0.0);
        assert_eq!(keyword_density(Some("seo"), ""), 0.0);
        assert_eq!(keyword_density(Some("   "), "seo seo"), 0.0);
    }

    #[test]
    fn test_keyword_density_case_insensitive_phrase() {
        let text = "Rust tools. rust TOOLS are fast. Tools for rust";
        assert!((keyword_density(Some("SEO"), text)).abs() < f64::EPSILON);
        let density = keyword_density(Some("Rust Tools"), text);
        assert!((density - 2.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranked_terms_repeated_term_first() {
        let mut words: Vec<String> = (0..950).map(|i| format!("unique{:04}", i)).collect();
        for i in 0..50 {
            words.insert(i * 19, "gardening".to_string());
        }
        let text = words.join(" ");
        assert_eq!(word_count(&text), 1000);

        let top = ranked_terms(&text, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].term, "gardening");
        assert_eq!(top[0].count, 50);
    }

    #[test]
    fn test_ranked_terms_ties_keep_first_occurrence() {
        let top = ranked_terms("beta alpha gamma beta alpha the cat", 3);
        let terms: Vec<&str> = top.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_ranked_terms_skip_short_and_stop_words() {
        let top = ranked_terms("this that with cats dogs a an 12345", 10);
        let terms: Vec<&str> = top.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["cats", "dogs"]);
    }

    #[test]
    fn test_text_stats_compute() {
        let stats = TextStats::compute("seo tips. more seo tips here!", Some("seo"), 3);
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.sentence_count, 2);
        assert_eq!(stats.keyword_occurrences, 2);
        assert!((stats.keyword_density - 2.0 / 6.0).abs() < 1e-9);
        assert_eq!(stats.distinct_terms, 1);
    }

    #[test]
    fn test_text_stats_readability_matches_standalone() {
        let text = "The garden grows. Compost helps the soil! Water it often?";
        let stats = TextStats::compute(text, None, 5);
        assert_eq!(stats.readability, readability(text));
        assert_eq!(stats.sentence_count, 3);
    }
}
