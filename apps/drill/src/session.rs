//! Interactive drill loop.

use anyhow::{Context, Result};
use mastery_core::{
    ContinuousVoiceSession, EffectiveSettings, FuzzyMatcher, RecognitionEvent, SessionScheduler, SessionSummary, Step,
    TargetMatch, VoiceConfig, VoiceError, VoiceHandle, VoiceHandler, Word, WordId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::DrillConfig;
use crate::input::{self, Command, LineRecognizer};

/// What the voice session reports back to the drill loop.
#[derive(Debug)]
enum Signal {
    Matched(String),
    /// A final transcript that matched nothing.
    Missed(String),
    Ended,
}

struct SignalHandler {
    tx: UnboundedSender<Signal>,
}

impl VoiceHandler for SignalHandler {
    fn on_match(&mut self, found: &TargetMatch) {
        let _ = self.tx.send(Signal::Matched(found.word.clone()));
    }

    fn on_no_match(&mut self, transcript: &str) {
        let _ = self.tx.send(Signal::Missed(transcript.to_string()));
    }

    fn on_error(&mut self, error: &VoiceError) {
        tracing::warn!("Voice input error: {}", error);
    }

    fn on_end(&mut self) {
        let _ = self.tx.send(Signal::Ended);
    }
}

/// A running voice session plus the channel its "recognizer" reads from.
/// Dropping it drops the handle, which stops the session.
struct VoiceLink {
    handle: VoiceHandle,
    events: UnboundedSender<RecognitionEvent>,
}

impl VoiceLink {
    fn start(
        matcher: Arc<FuzzyMatcher>,
        restart_delay: Duration,
        target: &str,
        signals: UnboundedSender<Signal>,
    ) -> Self {
        let (events, events_rx) = unbounded_channel();
        let session = ContinuousVoiceSession::new(matcher, VoiceConfig { restart_delay });
        let handle = session.start(
            LineRecognizer::new(events.clone()),
            events_rx,
            &[target.to_string()],
            SignalHandler { tx: signals },
        );
        Self { handle, events }
    }

    fn hear(&self, transcript: String) {
        let _ = self.events.send(RecognitionEvent::Result {
            transcript,
            confidence: 1.0,
            is_final: true,
        });
    }
}

/// Run one session to completion. Returns `None` if the learner quit.
pub async fn drill(
    config: &DrillConfig,
    settings: &EffectiveSettings,
    deck: &[Word],
    matcher: Arc<FuzzyMatcher>,
) -> Result<Option<SessionSummary>> {
    let mut scheduler = match config.seed {
        Some(seed) => SessionScheduler::seeded(seed),
        None => SessionScheduler::new(),
    }
    .with_shuffle(settings.shuffle);

    let mut step = scheduler
        .initialize(deck, settings.mode)
        .context("failed to start session")?;

    let mut commands = input::spawn_stdin_reader();
    let (signal_tx, mut signals) = unbounded_channel();
    let mut voice = None;
    let mut voice_wanted = config.voice;

    if config.voice {
        println!("Voice mode: type what you read aloud, 'pass' to skip, 'quit' to stop.");
    } else {
        println!("Type what you read, 'pass' to skip, 'quit' to stop.");
    }

    loop {
        let word = match &step {
            Step::Complete(summary) => return Ok(Some(summary.clone())),
            Step::Present { word, mastered } => {
                if let Some(mastered) = mastered {
                    println!("  mastered: {mastered}");
                }
                word.clone()
            }
        };
        let text = word_text(&scheduler, &word);
        println!("read: {text}");

        if voice_wanted && voice.is_none() {
            voice = Some(VoiceLink::start(
                Arc::clone(&matcher),
                Duration::from_millis(settings.restart_delay_ms),
                &text,
                signal_tx.clone(),
            ));
        } else if let Some(link) = &voice {
            link.handle.update_target_words(&[text.clone()]);
        }

        let Some(correct) =
            wait_for_verdict(&text, &matcher, &mut voice, &mut commands, &mut signals).await
        else {
            return Ok(None);
        };
        if voice.is_none() {
            voice_wanted = false;
        }
        println!("  {}", if correct { "yes!" } else { "not yet" });
        step = scheduler.submit_answer(correct)?;
    }
}

/// Wait until the current word is read, passed, or the learner quits.
async fn wait_for_verdict(
    text: &str,
    matcher: &FuzzyMatcher,
    voice: &mut Option<VoiceLink>,
    commands: &mut UnboundedReceiver<Command>,
    signals: &mut UnboundedReceiver<Signal>,
) -> Option<bool> {
    loop {
        tokio::select! {
            Some(signal) = signals.recv() => match signal {
                Signal::Matched(word) if word == text => return Some(true),
                Signal::Matched(_) => {}
                Signal::Missed(transcript) => {
                    tracing::debug!(transcript = %transcript, "no target heard");
                    return Some(false);
                }
                Signal::Ended => {
                    println!("Voice input stopped, checking typed answers directly.");
                    *voice = None;
                }
            },
            command = commands.recv() => match command {
                None | Some(Command::Quit) => return None,
                Some(Command::Pass) => return Some(false),
                Some(Command::Heard(transcript)) => match voice {
                    Some(link) => link.hear(transcript),
                    None => return Some(matcher.is_match(&transcript, text)),
                },
            },
        }
    }
}

fn word_text(scheduler: &SessionScheduler, word: &WordId) -> String {
    scheduler
        .progress(word)
        .map(|p| p.text.clone())
        .unwrap_or_else(|| word.to_string())
}
