//! Per-session word scheduler.
//!
//! Mastery mode keeps a word in rotation until it has been answered
//! correctly `threshold` times; history mode shows every word once.
//! Missed words go back into the queue a few positions ahead of the
//! front so they come back soon, but never back-to-back.

use crate::error::{EngineError, Result};
use crate::types::{Mode, SessionState, Word, WordId, WordProgress, WordResult};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Lowest 0-based queue index a missed word is reinserted at (3rd position).
pub const REINSERT_MIN_INDEX: usize = 2;
/// Highest 0-based queue index a missed word is reinserted at (5th position).
pub const REINSERT_MAX_INDEX: usize = 4;

/// What the caller should do after initializing or answering.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Present `word` next. `mastered` is set when the previous answer
    /// mastered a word.
    Present {
        word: WordId,
        mastered: Option<WordId>,
    },
    /// The session is over.
    Complete(SessionSummary),
}

/// Mode-specific completion payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Mastered words in the order they were mastered.
    Mastered(Vec<WordId>),
    /// One entry per word shown, in presentation order.
    Reviewed(Vec<WordResult>),
}

/// Delivered once when a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: Outcome,
}

impl SessionSummary {
    /// Mastered words, empty for review sessions.
    pub fn mastered(&self) -> &[WordId] {
        match &self.outcome {
            Outcome::Mastered(words) => words,
            Outcome::Reviewed(_) => &[],
        }
    }

    /// Words answered incorrectly during a review session. Callers use
    /// this to demote previously mastered words.
    pub fn missed(&self) -> Vec<WordId> {
        match &self.outcome {
            Outcome::Mastered(_) => Vec::new(),
            Outcome::Reviewed(results) => results
                .iter()
                .filter(|r| !r.correct)
                .map(|r| r.word_id.clone())
                .collect(),
        }
    }

    /// Share of correct answers in a review session.
    pub fn accuracy(&self) -> Option<f64> {
        match &self.outcome {
            Outcome::Reviewed(results) if !results.is_empty() => {
                let correct = results.iter().filter(|r| r.correct).count();
                Some(correct as f64 / results.len() as f64)
            }
            _ => None,
        }
    }
}

/// Chooses the next word and tracks progress for one session at a time.
pub struct SessionScheduler<R = StdRng> {
    rng: R,
    shuffle: bool,
    mode: Mode,
    state: SessionState,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    order: Vec<WordId>,
    progress: HashMap<WordId, WordProgress>,
    queue: VecDeque<WordId>,
    mastered: Vec<WordId>,
    results: Vec<WordResult>,
}

impl SessionScheduler<StdRng> {
    /// Scheduler with an entropy-seeded RNG of its own.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Scheduler with a reproducible RNG.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SessionScheduler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SessionScheduler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            shuffle: true,
            mode: Mode::default(),
            state: SessionState::Uninitialized,
            session_id: Uuid::nil(),
            started_at: Utc::now(),
            order: Vec::new(),
            progress: HashMap::new(),
            queue: VecDeque::new(),
            mastered: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Keep the caller's initial order instead of shuffling it.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Start a new session, discarding all state from any previous one.
    ///
    /// Words with a repeated id collapse to their first occurrence. An
    /// empty word list completes immediately with an empty summary.
    pub fn initialize(&mut self, words: &[Word], mode: Mode) -> Result<Step> {
        if let Mode::Mastery { threshold: 0 } = mode {
            return Err(EngineError::InvalidThreshold(0));
        }

        self.mode = mode;
        self.session_id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.order.clear();
        self.progress.clear();
        self.queue.clear();
        self.mastered.clear();
        self.results.clear();

        for word in words {
            if self.progress.contains_key(&word.id) {
                continue;
            }
            self.progress.insert(word.id.clone(), WordProgress::new(word));
            self.order.push(word.id.clone());
        }

        let mut initial = self.order.clone();
        if self.shuffle {
            initial.shuffle(&mut self.rng);
        }
        self.queue.extend(initial);

        tracing::info!(
            session = %self.session_id,
            mode = mode.as_str(),
            words = self.order.len(),
            "session initialized"
        );

        if self.queue.is_empty() {
            return Ok(self.complete());
        }
        self.state = SessionState::Active;
        Ok(self.next_step(None))
    }

    /// Word at the front of the queue.
    pub fn current_word(&self) -> Option<&WordId> {
        self.queue.front()
    }

    /// Record a verdict for the current word and advance.
    pub fn submit_answer(&mut self, is_correct: bool) -> Result<Step> {
        if self.state != SessionState::Active {
            return Err(EngineError::SessionNotActive("submit_answer"));
        }
        let Some(word_id) = self.queue.pop_front() else {
            return Ok(self.complete());
        };

        if let Some(progress) = self.progress.get_mut(&word_id) {
            progress.record(is_correct);
            tracing::debug!(
                word = %word_id,
                correct = is_correct,
                session_correct = progress.session_correct_count,
                attempts = progress.total_attempts,
                "answer recorded"
            );
        }

        match self.mode {
            Mode::Mastery { threshold } => Ok(self.advance_mastery(word_id, threshold)),
            Mode::History => Ok(self.advance_history(word_id, is_correct)),
        }
    }

    fn advance_mastery(&mut self, word_id: WordId, threshold: u32) -> Step {
        let mastered = self
            .progress
            .get(&word_id)
            .is_some_and(|p| p.is_mastered(threshold));

        if mastered {
            tracing::debug!(word = %word_id, "word mastered");
            self.queue.retain(|id| id != &word_id);
            self.mastered.push(word_id.clone());
            if self.mastered.len() == self.progress.len() {
                return self.complete();
            }
            if self.queue.is_empty() {
                self.rebuild_queue();
            }
            return self.next_step(Some(word_id));
        }

        if self.queue.is_empty() {
            self.rebuild_queue();
        } else {
            let index = reinsert_index(&mut self.rng, self.queue.len());
            self.queue.insert(index, word_id);
        }
        self.next_step(None)
    }

    fn advance_history(&mut self, word_id: WordId, is_correct: bool) -> Step {
        self.results.push(WordResult {
            word_id,
            correct: is_correct,
            answered_at: Utc::now(),
        });
        self.next_step(None)
    }

    /// Refill the queue with every unmastered word in fresh random order.
    fn rebuild_queue(&mut self) {
        let threshold = self.mode.threshold();
        let mut pending: Vec<WordId> = self
            .order
            .iter()
            .filter(|id| {
                self.progress
                    .get(*id)
                    .is_some_and(|p| !p.is_mastered(threshold))
            })
            .cloned()
            .collect();
        pending.shuffle(&mut self.rng);
        self.queue.extend(pending);
    }

    fn next_step(&mut self, mastered: Option<WordId>) -> Step {
        match self.queue.front() {
            Some(word) => Step::Present {
                word: word.clone(),
                mastered,
            },
            None => self.complete(),
        }
    }

    fn complete(&mut self) -> Step {
        self.state = SessionState::Complete;
        let outcome = match self.mode {
            Mode::Mastery { .. } => Outcome::Mastered(self.mastered.clone()),
            Mode::History => Outcome::Reviewed(self.results.clone()),
        };

        tracing::info!(
            session = %self.session_id,
            mastered = self.mastered.len(),
            reviewed = self.results.len(),
            "session complete"
        );

        Step::Complete(SessionSummary {
            session_id: self.session_id,
            mode: self.mode,
            started_at: self.started_at,
            finished_at: Utc::now(),
            outcome,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn progress(&self, word_id: &WordId) -> Option<&WordProgress> {
        self.progress.get(word_id)
    }

    /// Words mastered so far, in mastery order.
    pub fn mastered(&self) -> &[WordId] {
        &self.mastered
    }

    /// Current queue, front first.
    pub fn queue(&self) -> impl Iterator<Item = &WordId> {
        self.queue.iter()
    }

    /// Number of distinct words still to be mastered or shown.
    pub fn remaining(&self) -> usize {
        match self.mode {
            Mode::Mastery { .. } => self.progress.len() - self.mastered.len(),
            Mode::History => self.queue.len(),
        }
    }
}

/// Insert position for a missed word, `remaining` being the queue length
/// after the pop. Short queues clamp to the end: with one entry left the
/// word comes back 2nd, with two entries left it comes back 3rd.
pub fn reinsert_index<R: Rng + ?Sized>(rng: &mut R, remaining: usize) -> usize {
    let low = REINSERT_MIN_INDEX.min(remaining);
    let high = REINSERT_MAX_INDEX.min(remaining);
    rng.gen_range(low..=high)
}
