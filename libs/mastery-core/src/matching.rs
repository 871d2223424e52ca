//! Spoken-answer matching against a target word.

use crate::homophones::HomophoneIndex;
use crate::types::MatchVerdict;
use serde::{Deserialize, Serialize};

/// Default share of the target length tolerated as edit distance.
pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.35;

const STRIPPED_CHARS: &[char] = &['.', ',', '!', '?', '\'', '"'];

/// Which rule accepted a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Homophone,
    Token,
    TokenHomophone,
    EditDistance,
}

/// Normalize a transcript or target: drop `. , ! ? ' "`, trim, lowercase.
pub fn normalize(s: &str) -> String {
    let stripped: String = s.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    stripped.trim().to_lowercase()
}

/// Decides whether a recognized utterance is a correct reading of a word.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    homophones: HomophoneIndex,
    tolerance_ratio: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(HomophoneIndex::builtin())
    }
}

impl FuzzyMatcher {
    pub fn new(homophones: HomophoneIndex) -> Self {
        Self {
            homophones,
            tolerance_ratio: DEFAULT_TOLERANCE_RATIO,
        }
    }

    pub fn with_tolerance_ratio(mut self, ratio: f64) -> Self {
        self.tolerance_ratio = ratio;
        self
    }

    pub fn homophones(&self) -> &HomophoneIndex {
        &self.homophones
    }

    /// Maximum edit distance accepted for a target of `target_len` chars.
    pub fn tolerance(&self, target_len: usize) -> usize {
        ((target_len as f64 * self.tolerance_ratio).floor() as usize).max(1)
    }

    pub fn is_match(&self, transcript: &str, target: &str) -> bool {
        self.check(transcript, target).is_some()
    }

    /// Run the matching rules in order and report the first that accepts.
    pub fn check(&self, transcript: &str, target: &str) -> Option<MatchKind> {
        self.check_normalized(&normalize(transcript), &normalize(target))
    }

    /// Same as [`check`](Self::check) for inputs already passed through [`normalize`].
    ///
    /// Empty transcripts and empty targets never match.
    pub fn check_normalized(&self, transcript: &str, target: &str) -> Option<MatchKind> {
        if transcript.is_empty() || target.is_empty() {
            return None;
        }

        if transcript == target {
            return Some(MatchKind::Exact);
        }

        if self.homophones.are_homophones(transcript, target) {
            return Some(MatchKind::Homophone);
        }

        let tokens: Vec<&str> = transcript.split_whitespace().collect();
        if tokens.iter().any(|token| *token == target) {
            return Some(MatchKind::Token);
        }

        if tokens
            .iter()
            .any(|token| self.homophones.are_homophones(token, target))
        {
            return Some(MatchKind::TokenHomophone);
        }

        let tolerance = self.tolerance(target.chars().count());
        if levenshtein_distance(transcript, target) <= tolerance {
            return Some(MatchKind::EditDistance);
        }

        None
    }

    /// Build a verdict for a recognizer result.
    pub fn verdict(&self, transcript: &str, target: &str, confidence: f64) -> MatchVerdict {
        MatchVerdict {
            transcript: transcript.to_string(),
            confidence,
            is_match: self.is_match(transcript, target),
        }
    }
}

/// Calculate Levenshtein distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rows instead of the full matrix
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);

            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
