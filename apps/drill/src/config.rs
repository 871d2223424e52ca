//! Drill configuration from environment variables (and `.env`).

use anyhow::{bail, Context, Result};
use mastery_core::{
    parse_groups, BookSettings, EffectiveSettings, EngineSettings, FuzzyMatcher, HomophoneIndex,
    Mode,
};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct DrillConfig {
    pub words_file: PathBuf,
    pub stats_file: Option<PathBuf>,
    pub homophones_file: Option<PathBuf>,
    /// JSON `BookSettings` overriding mode, shuffle or deck size for one book.
    pub book_file: Option<PathBuf>,
    pub settings: EngineSettings,
    pub seed: Option<u64>,
    pub voice: bool,
}

impl DrillConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let words_file = lookup("DRILL_WORDS_FILE")
            .map(PathBuf::from)
            .context("DRILL_WORDS_FILE must be set")?;

        let defaults = EngineSettings::default();
        let threshold = parse(&lookup, "DRILL_THRESHOLD")?.unwrap_or(defaults.mode.threshold());
        let mode = match lookup("DRILL_MODE").as_deref().map(str::trim) {
            None | Some("mastery") => Mode::Mastery { threshold },
            Some("history") => Mode::History,
            Some(other) => bail!("unknown DRILL_MODE: {other} (expected mastery or history)"),
        };

        let settings = EngineSettings {
            mode,
            shuffle: parse(&lookup, "DRILL_SHUFFLE")?.unwrap_or(defaults.shuffle),
            tolerance_ratio: parse(&lookup, "DRILL_TOLERANCE")?.unwrap_or(defaults.tolerance_ratio),
            restart_delay_ms: parse(&lookup, "DRILL_RESTART_DELAY_MS")?
                .unwrap_or(defaults.restart_delay_ms),
            words_per_session: parse(&lookup, "DRILL_WORDS_PER_SESSION")?
                .unwrap_or(defaults.words_per_session),
        };

        Ok(Self {
            words_file,
            stats_file: lookup("DRILL_STATS_FILE").map(PathBuf::from),
            homophones_file: lookup("DRILL_HOMOPHONES_FILE").map(PathBuf::from),
            book_file: lookup("DRILL_BOOK_FILE").map(PathBuf::from),
            settings,
            seed: parse(&lookup, "DRILL_SEED")?,
            voice: parse(&lookup, "DRILL_VOICE")?.unwrap_or(false),
        })
    }

    /// Engine settings with the book overrides applied, if a book file is set.
    pub fn effective_settings(&self) -> Result<EffectiveSettings> {
        let book = match &self.book_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let book = parse_book(&content)
                    .with_context(|| format!("invalid book settings {}", path.display()))?;
                tracing::info!("Using settings for book {}", book.book_id);
                Some(book)
            }
            None => None,
        };
        Ok(EffectiveSettings::merge(&self.settings, book.as_ref()))
    }

    /// Matcher with the built-in homophones plus any extra groups file.
    pub fn load_matcher(&self) -> Result<FuzzyMatcher> {
        let mut index = HomophoneIndex::builtin();
        if let Some(path) = &self.homophones_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let groups = parse_groups(&content)
                .with_context(|| format!("invalid homophone file {}", path.display()))?;
            tracing::info!("Loaded {} extra homophone groups", groups.len());
            index.extend(&groups);
        }
        Ok(FuzzyMatcher::new(index).with_tolerance_ratio(self.settings.tolerance_ratio))
    }
}

pub fn parse_book(content: &str) -> Result<BookSettings> {
    serde_json::from_str(content).context("expected a JSON object with a book_id")
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid {key}: {raw}"))
        })
        .transpose()
}
