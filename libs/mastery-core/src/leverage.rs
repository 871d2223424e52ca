//! Cross-book word prioritization.
//!
//! A word that shows up in many books unlocks more reading per unit of
//! practice than one that is merely frequent in a single book:
//!
//! ```text
//! leverage = round(book_count * ln(1 + total_occurrences) * 1000)
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Aggregate statistics for one word across the book corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalWordStat {
    pub word: String,
    pub book_count: u32,
    pub total_occurrences: u64,
}

impl GlobalWordStat {
    pub fn new(word: &str, book_count: u32, total_occurrences: u64) -> Self {
        Self {
            word: word.to_string(),
            book_count,
            total_occurrences,
        }
    }

    pub fn leverage_score(&self) -> i64 {
        leverage_score(self.book_count, self.total_occurrences)
    }
}

/// Compute the leverage score for raw counts.
pub fn leverage_score(book_count: u32, total_occurrences: u64) -> i64 {
    let occurrences = (total_occurrences as f64).ln_1p();
    (f64::from(book_count) * occurrences * 1000.0).round() as i64
}

/// Order a book's unmastered words by leverage, highest first.
///
/// Ties sort alphabetically. Words without stats score 0.
pub fn prioritize(
    book_words: &HashSet<String>,
    mastered_words: &HashSet<String>,
    stats: &HashMap<String, GlobalWordStat>,
) -> Vec<String> {
    let mut scored: Vec<(i64, &String)> = book_words
        .iter()
        .filter(|word| !mastered_words.contains(*word))
        .map(|word| {
            let score = stats.get(word).map_or(0, GlobalWordStat::leverage_score);
            (score, word)
        })
        .collect();

    scored.sort_by(|a, b| (Reverse(a.0), a.1).cmp(&(Reverse(b.0), b.1)));
    scored.into_iter().map(|(_, word)| word.clone()).collect()
}

/// Like [`prioritize`], keeping at most `limit` words.
pub fn prioritize_top(
    book_words: &HashSet<String>,
    mastered_words: &HashSet<String>,
    stats: &HashMap<String, GlobalWordStat>,
    limit: usize,
) -> Vec<String> {
    let mut words = prioritize(book_words, mastered_words, stats);
    words.truncate(limit);
    words
}

/// Index a stats snapshot by word.
pub fn index_stats(stats: impl IntoIterator<Item = GlobalWordStat>) -> HashMap<String, GlobalWordStat> {
    stats.into_iter().map(|stat| (stat.word.clone(), stat)).collect()
}
