//! Homophone lookup for spoken-answer matching.
//!
//! # Group file format
//! ```text
//! # one group per line, comma separated
//! their, there, they're
//! read, red
//! ```

use crate::error::{EngineError, Result};
use crate::matching::normalize;
use std::collections::{HashMap, HashSet};

/// Built-in sound-alike groups for early readers. Digit forms cover
/// recognizers that transcribe number words as numerals.
const BUILTIN_GROUPS: &[&[&str]] = &[
    &["their", "there", "they're"],
    &["read", "red"],
    &["read", "reed"],
    &["lead", "led"],
    &["to", "too", "two", "2"],
    &["for", "four", "fore", "4"],
    &["one", "won", "1"],
    &["ate", "eight", "8"],
    &["see", "sea"],
    &["sun", "son"],
    &["be", "bee"],
    &["know", "no"],
    &["knew", "new"],
    &["knows", "nose"],
    &["knight", "night"],
    &["knot", "not"],
    &["right", "write", "rite"],
    &["hear", "here"],
    &["blue", "blew"],
    &["by", "buy", "bye"],
    &["flower", "flour"],
    &["hole", "whole"],
    &["meet", "meat"],
    &["pair", "pear"],
    &["peace", "piece"],
    &["plain", "plane"],
    &["rain", "reign", "rein"],
    &["road", "rode"],
    &["sail", "sale"],
    &["tail", "tale"],
    &["week", "weak"],
    &["wood", "would"],
    &["your", "you're"],
    &["its", "it's"],
    &["weather", "whether"],
    &["which", "witch"],
    &["wear", "where"],
    &["bear", "bare"],
    &["dear", "deer"],
    &["hair", "hare"],
    &["mail", "male"],
    &["made", "maid"],
    &["so", "sew", "sow"],
    &["tea", "tee"],
    &["toe", "tow"],
    &["wait", "weight"],
    &["way", "weigh"],
    &["break", "brake"],
    &["cent", "sent", "scent"],
    &["eye", "i"],
    &["our", "hour"],
    &["ant", "aunt"],
    &["berry", "bury"],
    &["cell", "sell"],
    &["flew", "flu"],
    &["heal", "heel"],
    &["main", "mane"],
    &["oh", "owe"],
    &["pail", "pale"],
    &["rose", "rows"],
    &["stair", "stare"],
    &["steal", "steel"],
    &["threw", "through"],
    &["waist", "waste"],
    &["wrap", "rap"],
    &["ring", "wring"],
    &["night", "nite"],
    &["fair", "fare"],
    &["sore", "soar"],
    &["tide", "tied"],
];

/// Set of words that are interchangeable for matching purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomophoneGroup {
    pub words: Vec<String>,
}

impl HomophoneGroup {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            words: words.iter().map(|w| w.as_ref().to_string()).collect(),
        }
    }
}

/// Precomputed adjacency: every group member maps to all other members.
#[derive(Debug, Clone, Default)]
pub struct HomophoneIndex {
    adjacency: HashMap<String, HashSet<String>>,
}

impl HomophoneIndex {
    /// Empty index (only identical words are homophones).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index built from the built-in table.
    pub fn builtin() -> Self {
        let mut index = Self::empty();
        for &group in BUILTIN_GROUPS {
            index.add_group(&HomophoneGroup::new(group));
        }
        index
    }

    pub fn from_groups(groups: &[HomophoneGroup]) -> Self {
        let mut index = Self::empty();
        index.extend(groups);
        index
    }

    pub fn extend(&mut self, groups: &[HomophoneGroup]) {
        for group in groups {
            self.add_group(group);
        }
    }

    fn add_group(&mut self, group: &HomophoneGroup) {
        let members: Vec<String> = group.words.iter().map(|w| normalize(w)).collect();
        for member in &members {
            if member.is_empty() {
                continue;
            }
            let entry = self.adjacency.entry(member.clone()).or_default();
            for other in &members {
                if other != member && !other.is_empty() {
                    entry.insert(other.clone());
                }
            }
        }
    }

    /// Case-insensitive homophone check. Identical words count.
    pub fn are_homophones(&self, a: &str, b: &str) -> bool {
        let a = normalize(a);
        let b = normalize(b);
        if a == b {
            return true;
        }
        self.adjacency
            .get(&a)
            .is_some_and(|others| others.contains(&b))
    }

    /// Sound-alikes of a word, sorted.
    pub fn homophones_of(&self, word: &str) -> Vec<String> {
        let mut words: Vec<String> = self
            .adjacency
            .get(&normalize(word))
            .map(|others| others.iter().cloned().collect())
            .unwrap_or_default();
        words.sort();
        words
    }

    /// Number of words with at least one homophone.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

/// Parse homophone groups from text, one comma-separated group per line.
pub fn parse_groups(content: &str) -> Result<Vec<HomophoneGroup>> {
    let mut groups = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut words = Vec::new();
        let mut distinct = HashSet::new();
        for raw in trimmed.split(',') {
            let word = raw.trim();
            if normalize(word).is_empty() {
                return Err(EngineError::EmptyHomophoneWord { line: line_num });
            }
            distinct.insert(normalize(word));
            words.push(word.to_string());
        }

        if distinct.len() < 2 {
            return Err(EngineError::InvalidHomophoneGroup { line: line_num });
        }
        groups.push(HomophoneGroup { words });
    }

    Ok(groups)
}
