//! Word mastery engine shared by the reading drills and arcade games.
//!
//! Provides:
//! - Session scheduler (mastery and review modes, spaced reinsertion of misses)
//! - Cross-book leverage scoring for ordering a book's vocabulary
//! - Spoken-answer matching (homophones + Levenshtein tolerance)
//! - Continuous voice sessions against several on-screen targets
//! - Shared types (Word, WordProgress, Mode, settings)

pub mod error;
pub mod homophones;
pub mod leverage;
pub mod matching;
pub mod scheduler;
pub mod types;
pub mod voice;

pub use error::{EngineError, Result};
pub use homophones::{parse_groups, HomophoneGroup, HomophoneIndex};
pub use leverage::{index_stats, leverage_score, prioritize, prioritize_top, GlobalWordStat};
pub use matching::{levenshtein_distance, normalize, FuzzyMatcher, MatchKind};
pub use scheduler::{Outcome, SessionScheduler, SessionSummary, Step};
pub use types::{
    BookSettings, EffectiveSettings, EngineSettings, MatchVerdict, Mode, SessionState, Word,
    WordId, WordProgress, WordResult,
};
pub use voice::{
    ContinuousVoiceSession, RecognitionErrorKind, RecognitionEvent, SpeechRecognizer,
    TargetMatch, VoiceConfig, VoiceError, VoiceHandle, VoiceHandler,
};
