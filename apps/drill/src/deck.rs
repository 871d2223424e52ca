//! Building a session deck from a word file and an optional stats snapshot.

use anyhow::{Context, Result};
use mastery_core::{index_stats, prioritize_top, EffectiveSettings, GlobalWordStat, Word};
use std::collections::{HashMap, HashSet};

use crate::config::DrillConfig;

/// One word per line; blank lines and `#` comments are skipped, repeats dropped.
pub fn parse_word_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// JSON array of `{ "word", "book_count", "total_occurrences" }` records.
pub fn parse_stats(content: &str) -> Result<HashMap<String, GlobalWordStat>> {
    let stats: Vec<GlobalWordStat> =
        serde_json::from_str(content).context("stats file is not a valid stats array")?;
    Ok(index_stats(stats))
}

/// Pick the session words: leverage order when stats exist, file order otherwise.
pub fn build_deck(
    words: Vec<String>,
    stats: Option<&HashMap<String, GlobalWordStat>>,
    limit: usize,
) -> Vec<Word> {
    let selected = match stats {
        Some(stats) => {
            let book: HashSet<String> = words.into_iter().collect();
            prioritize_top(&book, &HashSet::new(), stats, limit)
        }
        None => words.into_iter().take(limit).collect(),
    };
    selected.iter().map(|w| Word::new(w)).collect()
}

pub fn load(config: &DrillConfig, settings: &EffectiveSettings) -> Result<Vec<Word>> {
    let content = std::fs::read_to_string(&config.words_file)
        .with_context(|| format!("failed to read {}", config.words_file.display()))?;
    let words = parse_word_list(&content);

    let stats = match &config.stats_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Some(parse_stats(&content)?)
        }
        None => None,
    };

    let deck = build_deck(words, stats.as_ref(), settings.words_per_session);
    tracing::info!("Deck ready with {} words", deck.len());
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_word_list() {
        let words = parse_word_list("# book one\ncat\n\n  dog \nCat\nsun\n");
        assert_eq!(words, vec!["cat", "dog", "sun"]);
    }

    #[test]
    fn test_parse_stats() {
        let json = r#"[
            {"word": "the", "book_count": 12, "total_occurrences": 340},
            {"word": "moon", "book_count": 2, "total_occurrences": 9}
        ]"#;
        let stats = parse_stats(json).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["moon"].book_count, 2);
    }

    #[test]
    fn test_parse_stats_rejects_garbage() {
        assert!(parse_stats("{\"word\": 1}").is_err());
    }

    #[test]
    fn test_build_deck_uses_leverage() {
        let stats = parse_stats(
            r#"[{"word": "moon", "book_count": 2, "total_occurrences": 9},
                {"word": "the", "book_count": 12, "total_occurrences": 340}]"#,
        )
        .unwrap();
        let words = vec!["cat".to_string(), "moon".to_string(), "the".to_string()];
        let deck = build_deck(words, Some(&stats), 2);
        let texts: Vec<&str> = deck.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["the", "moon"]);
    }

    #[test]
    fn test_build_deck_keeps_file_order_without_stats() {
        let words = vec!["cat".to_string(), "dog".to_string(), "sun".to_string()];
        let deck = build_deck(words, None, 2);
        assert_eq!(deck, vec![Word::new("cat"), Word::new("dog")]);
    }
}
