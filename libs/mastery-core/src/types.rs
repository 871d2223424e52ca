//! Core types for the word mastery engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable word identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(pub String);

impl WordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A word handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub text: String,
}

impl Word {
    /// Create a word whose id is its own text.
    pub fn new(text: &str) -> Self {
        Self {
            id: WordId::from(text),
            text: text.to_string(),
        }
    }

    pub fn with_id(id: impl Into<WordId>, text: &str) -> Self {
        Self {
            id: id.into(),
            text: text.to_string(),
        }
    }
}

/// Scheduling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Mode {
    /// Words leave the deck once answered correctly `threshold` times.
    Mastery { threshold: u32 },
    /// Every word is shown exactly once.
    History,
}

impl Mode {
    /// Correct answers needed before a word counts as mastered.
    pub fn threshold(self) -> u32 {
        match self {
            Self::Mastery { threshold } => threshold,
            Self::History => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mastery { .. } => "mastery",
            Self::History => "history",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Mastery { threshold: 3 }
    }
}

/// Per-word progress within one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordProgress {
    pub word_id: WordId,
    pub text: String,
    pub session_correct_count: u32,
    pub total_attempts: u32,
}

impl WordProgress {
    pub fn new(word: &Word) -> Self {
        Self {
            word_id: word.id.clone(),
            text: word.text.clone(),
            session_correct_count: 0,
            total_attempts: 0,
        }
    }

    /// Record one answer.
    pub fn record(&mut self, correct: bool) {
        self.total_attempts += 1;
        if correct {
            self.session_correct_count += 1;
        }
    }

    pub fn is_mastered(&self, threshold: u32) -> bool {
        self.session_correct_count >= threshold
    }
}

/// One answer recorded in history mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResult {
    pub word_id: WordId,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Output of the spoken-answer matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchVerdict {
    pub transcript: String,
    pub confidence: f64,
    pub is_match: bool,
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Active,
    Complete,
}

/// Engine-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub mode: Mode,
    /// Shuffle the initial deck. Off keeps the caller's order (e.g. leverage order).
    pub shuffle: bool,
    pub tolerance_ratio: f64,
    pub restart_delay_ms: u64,
    pub words_per_session: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            shuffle: true,
            tolerance_ratio: 0.35,
            restart_delay_ms: 250,
            words_per_session: 20,
        }
    }
}

/// Per-book overrides (all fields optional).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSettings {
    pub book_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_per_session: Option<usize>,
}

impl BookSettings {
    /// Create new book settings with only the id set.
    pub fn new(book_id: String) -> Self {
        Self {
            book_id,
            mode: None,
            shuffle: None,
            words_per_session: None,
        }
    }
}

/// Engine settings merged with book overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub mode: Mode,
    pub shuffle: bool,
    pub tolerance_ratio: f64,
    pub restart_delay_ms: u64,
    pub words_per_session: usize,
}

impl EffectiveSettings {
    /// Merge engine settings with optional book settings.
    pub fn merge(global: &EngineSettings, book: Option<&BookSettings>) -> Self {
        match book {
            Some(b) => Self {
                mode: b.mode.unwrap_or(global.mode),
                shuffle: b.shuffle.unwrap_or(global.shuffle),
                tolerance_ratio: global.tolerance_ratio,
                restart_delay_ms: global.restart_delay_ms,
                words_per_session: b.words_per_session.unwrap_or(global.words_per_session),
            },
            None => Self {
                mode: global.mode,
                shuffle: global.shuffle,
                tolerance_ratio: global.tolerance_ratio,
                restart_delay_ms: global.restart_delay_ms,
                words_per_session: global.words_per_session,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_mode_threshold_is_one() {
        assert_eq!(Mode::History.threshold(), 1);
        assert_eq!(Mode::Mastery { threshold: 5 }.threshold(), 5);
    }

    #[test]
    fn progress_counts_attempts_and_correct() {
        let mut progress = WordProgress::new(&Word::new("cat"));
        progress.record(false);
        progress.record(true);
        assert_eq!(progress.total_attempts, 2);
        assert_eq!(progress.session_correct_count, 1);
        assert!(progress.is_mastered(1));
        assert!(!progress.is_mastered(2));
    }

    #[test]
    fn merge_prefers_book_overrides() {
        let global = EngineSettings::default();
        let mut book = BookSettings::new("book-1".to_string());
        book.mode = Some(Mode::History);
        book.words_per_session = Some(5);

        let merged = EffectiveSettings::merge(&global, Some(&book));
        assert_eq!(merged.mode, Mode::History);
        assert_eq!(merged.words_per_session, 5);
        assert!(merged.shuffle);
        assert_eq!(merged.tolerance_ratio, 0.35);
    }

    #[test]
    fn merge_without_book_uses_global() {
        let global = EngineSettings::default();
        let merged = EffectiveSettings::merge(&global, None);
        assert_eq!(merged.mode, Mode::Mastery { threshold: 3 });
        assert_eq!(merged.restart_delay_ms, 250);
    }
}
