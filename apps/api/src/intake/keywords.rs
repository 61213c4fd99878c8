//! Keyword relevance: decides whether a channel post looks like a job worth applying to.
//!
//! Pure, deterministic, no I/O. Each configured keyword counts at most once, matched as a
//! case-insensitive substring of the post. The result reports keywords in configuration
//! order so notifications and logs read the same way the operator wrote them.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Output data model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatchResult {
    pub matched: bool,
    pub match_count: usize,
    pub found_keywords: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Matcher
// ────────────────────────────────────────────────────────────────────────────

/// Keyword set plus the minimum number of distinct hits a post needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    minimum_matches: usize,
}

impl KeywordMatcher {
    /// Lower-cases keywords, drops blanks and duplicates, keeps first-seen order.
    pub fn new<I, S>(keywords: I, minimum_matches: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self {
            keywords: normalized,
            minimum_matches,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn minimum_matches(&self) -> usize {
        self.minimum_matches
    }

    pub fn evaluate(&self, text: &str) -> KeywordMatchResult {
        match_keywords(text, &self.keywords, self.minimum_matches)
    }
}

/// Scores `text` against `keywords`.
///
/// Empty text never matches, whatever the threshold.
pub fn match_keywords(text: &str, keywords: &[String], minimum_matches: usize) -> KeywordMatchResult {
    if text.is_empty() {
        return KeywordMatchResult::default();
    }

    let lower_text = text.to_lowercase();
    let mut found_keywords: Vec<String> = Vec::new();

    for keyword in keywords {
        let keyword_lower = keyword.to_lowercase();
        if keyword_lower.is_empty() || found_keywords.contains(&keyword_lower) {
            continue;
        }
        if lower_text.contains(&keyword_lower) {
            found_keywords.push(keyword_lower);
        }
    }

    let match_count = found_keywords.len();
    KeywordMatchResult {
        matched: match_count >= minimum_matches,
        match_count,
        found_keywords,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
