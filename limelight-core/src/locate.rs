//! Span locator: find a classifier quotation in the normalized text
//!
//! Exact substring search is the primary strategy. The classifier sometimes
//! paraphrases or truncates quotes, so when exact search finds nothing and
//! the query is substantial enough, a word-window Jaccard scan trades
//! precision for recall.

use std::collections::HashSet;

use crate::index::normalize;

/// Minimum word count before the fuzzy fallback is allowed to run
const FUZZY_MIN_WORDS: usize = 3;
/// Minimum query length in characters before the fuzzy fallback runs
const FUZZY_MIN_CHARS: usize = 10;
/// Cap on the sliding window, in words
const FUZZY_MAX_WINDOW: usize = 20;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Approximate,
}

/// One located occurrence, as `[start, end)` byte offsets into the
/// normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanMatch {
    pub start: usize,
    pub end: usize,
    pub kind: MatchKind,
}

impl SpanMatch {
    pub fn intersects(&self, other: &SpanMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Locate all occurrences of `query` in `text`. The query is normalized
/// before matching; `text` is assumed to already be normalized (it comes
/// from the segment index).
pub fn locate(text: &str, query: &str, fuzzy_threshold: f64) -> Vec<SpanMatch> {
    let query = normalize(query);
    if query.is_empty() {
        return Vec::new();
    }
    let exact = exact_occurrences(text, &query);
    if !exact.is_empty() {
        return exact;
    }
    fuzzy_occurrences(text, &query, fuzzy_threshold)
}

/// Left-to-right scan for every exact occurrence. The cursor advances one
/// character past each match start, so overlapping occurrences of repeated
/// text are all reported. Known quirk, kept deliberately.
pub fn exact_occurrences(text: &str, query: &str) -> Vec<SpanMatch> {
    let mut matches = Vec::new();
    let mut from = 0;
    while from <= text.len() {
        let Some(rel) = text[from..].find(query) else {
            break;
        };
        let at = from + rel;
        matches.push(SpanMatch {
            start: at,
            end: at + query.len(),
            kind: MatchKind::Exact,
        });
        let step = text[at..].chars().next().map_or(1, char::len_utf8);
        from = at + step;
    }
    matches
}

/// Word-window scan: slide a window of `min(2 x query words, 20)` words over
/// the text and report every window whose word-set Jaccard similarity with
/// the query reaches the threshold. Overlapping windows are not merged.
/// Order and duplicate counts are ignored on purpose; see the design notes.
pub fn fuzzy_occurrences(text: &str, query: &str, threshold: f64) -> Vec<SpanMatch> {
    let query_words: Vec<&str> = query.split_whitespace().collect();
    if query_words.len() < FUZZY_MIN_WORDS || query.chars().count() < FUZZY_MIN_CHARS {
        return Vec::new();
    }

    let base = text.as_ptr() as usize;
    let words: Vec<(usize, &str)> = text
        .split_whitespace()
        .map(|w| (w.as_ptr() as usize - base, w))
        .collect();

    let window = (2 * query_words.len()).min(FUZZY_MAX_WINDOW);
    if words.len() < window {
        return Vec::new();
    }

    let query_set: HashSet<String> =
        query_words.iter().map(|w| w.to_lowercase()).collect();

    let mut matches = Vec::new();
    for i in 0..=(words.len() - window) {
        let window_set: HashSet<String> = words[i..i + window]
            .iter()
            .map(|(_, w)| w.to_lowercase())
            .collect();
        if jaccard(&query_set, &window_set) >= threshold {
            let start = words[i].0;
            let (last_off, last_word) = words[i + window - 1];
            matches.push(SpanMatch {
                start,
                end: last_off + last_word.len(),
                kind: MatchKind::Approximate,
            });
        }
    }
    matches
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_exact_finds_all_occurrences() {
        let matches = exact_occurrences("the cat and the dog", "the");
        assert_eq!(
            matches.iter().map(|m| m.start).collect::<Vec<_>>(),
            vec![0, 12]
        );
        assert!(matches.iter().all(|m| m.kind == MatchKind::Exact));
    }

    #[test]
    fn test_exact_reports_overlapping_occurrences() {
        // cursor only advances one char past a match start
        let matches = exact_occurrences("aaaa", "aa");
        assert_eq!(
            matches.iter().map(|m| m.start).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_locate_normalizes_the_query() {
        let matches = locate("the sky is falling", "  the   sky ", DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].start, matches[0].end), (0, 7));
    }

    #[test]
    fn test_fuzzy_requires_substantial_query() {
        // two words: too few, even though it is long enough
        assert!(fuzzy_occurrences("alpha beta gamma delta", "alphax betax", 0.1).is_empty());
        // three words but under ten characters
        assert!(fuzzy_occurrences("ab cd ef gh ij kl", "ab cd xx", 0.1).is_empty());
    }

    #[test]
    fn test_fuzzy_finds_paraphrased_region() {
        // 6 query words -> 12-word window; the text is one such window whose
        // word set shares 6 of 7 members with the query (similarity ~0.857)
        let text = "be very afraid of of the the future future very afraid friends";
        let query = "be very afraid of the future";
        let matches = locate(text, query, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Approximate);
        assert_eq!((matches[0].start, matches[0].end), (0, text.len()));
    }

    #[test]
    fn test_fuzzy_accepts_window_at_exact_threshold() {
        // 8 query words -> 16-word window; the text is one such window whose
        // set shares 7 of 10 union members with the query, exactly 0.70
        let query = "alpha beta gamma delta echo fox golf hotel";
        let text = "alpha alpha beta beta gamma gamma delta delta \
                    echo echo fox fox golf golf xray yankee";
        let matches = locate(text, query, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Approximate);
        assert_eq!((matches[0].start, matches[0].end), (0, text.len()));

        // swap one duplicate for a third stranger: 7 of 11, rejected
        let text = "alpha alpha beta beta gamma gamma delta delta \
                    echo echo fox fox golf zulu xray yankee";
        assert!(locate(text, query, DEFAULT_FUZZY_THRESHOLD).is_empty());
    }

    #[test]
    fn test_fuzzy_skips_when_window_exceeds_text() {
        let matches = fuzzy_occurrences("only four words here", "one two three four five", 0.0);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_jaccard_threshold_boundary() {
        // |A n B| = 7, |A u B| = 10 -> exactly 0.70
        let a = set(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let b = set(&["a", "b", "c", "d", "e", "f", "g", "x", "y"]);
        let sim = jaccard(&a, &b);
        assert!(sim >= 0.7);
        assert!((sim - 0.7).abs() < 1e-12);

        // |A n B| = 9, |A u B| = 13 -> ~0.692, rejected
        let a = set(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"]);
        let b = set(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "x", "y"]);
        assert!(jaccard(&a, &b) < 0.7);
    }

    #[test]
    fn test_fuzzy_window_is_capped() {
        // 15-word query would give a 30-word window; the cap is 20
        let query: Vec<String> = (0..15).map(|i| format!("w{i}")).collect();
        let query = query.join(" ");
        let text: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
        let text = text.join(" ");
        let matches = fuzzy_occurrences(&text, &query, 0.5);
        // every 20-word window over 25 words that clears the threshold
        assert!(!matches.is_empty());
        for m in &matches {
            let words = text[m.start..m.end].split_whitespace().count();
            assert_eq!(words, 20);
        }
    }
}
