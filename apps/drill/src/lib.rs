pub mod config;
pub mod deck;
pub mod input;
pub mod session;

use std::sync::Arc;

use mastery_core::{Outcome, SessionSummary};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DrillConfig;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DrillConfig::from_env()?;
    let settings = config.effective_settings()?;

    tracing::info!("Loading words from {}", config.words_file.display());
    let deck = deck::load(&config, &settings)?;
    let matcher = Arc::new(config.load_matcher()?);

    match session::drill(&config, &settings, &deck, matcher).await? {
        Some(summary) => print_summary(&summary),
        None => println!("Stopped early."),
    }

    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    let elapsed = summary.finished_at - summary.started_at;
    match &summary.outcome {
        Outcome::Mastered(words) => {
            let list: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            println!("Mastered {} words: {}", words.len(), list.join(", "));
        }
        Outcome::Reviewed(results) => {
            let accuracy = summary.accuracy().unwrap_or(0.0) * 100.0;
            println!("Reviewed {} words, {:.0}% correct", results.len(), accuracy);
            let missed: Vec<String> = summary.missed().iter().map(|w| w.to_string()).collect();
            if !missed.is_empty() {
                println!("Needs more practice: {}", missed.join(", "));
            }
        }
    }
    tracing::info!(
        "Session {} finished in {}s",
        summary.session_id,
        elapsed.num_seconds()
    );
}
