//! Continuous speech recognition against a set of live target words.
//!
//! Used by the falling-word games: several words are on screen at once and
//! each one can be read aloud independently. The session keeps the
//! recognizer running across silence timeouts, restarts it after every
//! match so stale partial transcripts cannot fire again, and lets the caller
//! swap the target set while listening.

use crate::matching::{normalize, FuzzyMatcher, MatchKind};
use crate::types::MatchVerdict;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Default pause before relistening after the stream ends.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(250);

/// Error codes reported by a recognition stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl RecognitionErrorKind {
    /// Silence timeouts and our own aborts are expected; the stream is
    /// simply restarted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoSpeech | Self::Aborted)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for RecognitionErrorKind {
    fn from(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered by a recognition stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Result {
        transcript: String,
        confidence: f64,
        is_final: bool,
    },
    Error(RecognitionErrorKind),
    End,
}

/// Problems reported to a [`VoiceHandler`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VoiceError {
    #[error("speech recognition is unavailable")]
    Unavailable,

    #[error("speech recognition error: {0}")]
    Recognition(RecognitionErrorKind),

    #[error("failed to start speech recognition: {0}")]
    Start(String),
}

/// Control side of a recognition transport. Results arrive separately as
/// [`RecognitionEvent`]s; an `End` event is expected after `abort`.
pub trait SpeechRecognizer: Send {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<(), String>;

    fn abort(&mut self);
}

/// A target word recognized in an utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMatch {
    /// Position in the current target list.
    pub index: usize,
    pub word: String,
    pub kind: MatchKind,
    pub verdict: MatchVerdict,
}

/// Session callbacks.
///
/// Callbacks run on the session task with no session lock held, so they may
/// call back into the [`VoiceHandle`], e.g. to swap the targets or stop. Once
/// [`VoiceHandle::stop`] has returned no new callback starts.
pub trait VoiceHandler: Send {
    fn on_match(&mut self, found: &TargetMatch);

    fn on_interim(&mut self, _transcript: &str) {}

    /// A final result that matched none of the live targets.
    fn on_no_match(&mut self, _transcript: &str) {}

    fn on_error(&mut self, _error: &VoiceError) {}

    fn on_end(&mut self) {}

    /// Decide which of several simultaneous matches to consume.
    ///
    /// Returning `None` lets the first match in target order win and be
    /// reported through [`on_match`](Self::on_match). Returning indices
    /// marks exactly those targets as matched this round.
    fn on_all_matches(&mut self, _matches: &[TargetMatch]) -> Option<Vec<usize>> {
        None
    }
}

#[derive(Debug, Clone)]
struct Target {
    word: String,
    normalized: String,
    matched: bool,
}

impl Target {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            normalized: normalize(word),
            matched: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Continue,
    Restart,
    Finish,
}

/// Handler work collected under the lock and delivered after it is released.
#[derive(Debug)]
enum Notice {
    Interim(String),
    NoMatch(String),
    Matches {
        matches: Vec<TargetMatch>,
        generation: u64,
    },
    Failed(VoiceError),
}

struct State {
    stopped: bool,
    // Only set by `VoiceHandle::stop`; a fatal error still gets reported.
    cancelled: bool,
    listening: bool,
    targets: Vec<Target>,
    // Bumped on every target replacement so late match marks are discarded.
    generation: u64,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl State {
    fn handle(
        &mut self,
        event: RecognitionEvent,
        matcher: &FuzzyMatcher,
        notices: &mut Vec<Notice>,
    ) -> Next {
        if self.stopped {
            return Next::Finish;
        }
        match event {
            RecognitionEvent::Result {
                transcript,
                confidence,
                is_final,
            } => self.handle_result(&transcript, confidence, is_final, matcher, notices),
            RecognitionEvent::Error(kind) => self.handle_error(kind, notices),
            RecognitionEvent::End => self.handle_end(),
        }
    }

    fn handle_result(
        &mut self,
        transcript: &str,
        confidence: f64,
        is_final: bool,
        matcher: &FuzzyMatcher,
        notices: &mut Vec<Notice>,
    ) -> Next {
        if !self.listening {
            tracing::debug!(transcript, "dropping result from aborted stream");
            return Next::Continue;
        }
        if !is_final {
            notices.push(Notice::Interim(transcript.to_string()));
        }

        let normalized = normalize(transcript);
        let matches: Vec<TargetMatch> = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, target)| !target.matched)
            .filter_map(|(index, target)| {
                matcher
                    .check_normalized(&normalized, &target.normalized)
                    .map(|kind| TargetMatch {
                        index,
                        word: target.word.clone(),
                        kind,
                        verdict: MatchVerdict {
                            transcript: transcript.to_string(),
                            confidence,
                            is_match: true,
                        },
                    })
            })
            .collect();

        if matches.is_empty() {
            if is_final {
                notices.push(Notice::NoMatch(transcript.to_string()));
            }
            return Next::Continue;
        }

        // Flush the recognizer buffer so this utterance cannot match again.
        // Relistening waits for the end event of the aborted stream.
        self.recognizer.abort();
        self.listening = false;
        notices.push(Notice::Matches {
            matches,
            generation: self.generation,
        });
        Next::Continue
    }

    fn handle_error(&mut self, kind: RecognitionErrorKind, notices: &mut Vec<Notice>) -> Next {
        if kind.is_recoverable() {
            tracing::debug!(error = %kind, "recoverable recognition error");
            return Next::Continue;
        }
        tracing::warn!(error = %kind, "speech recognition failed");
        self.fail(VoiceError::Recognition(kind), notices)
    }

    fn handle_end(&mut self) -> Next {
        self.listening = false;
        Next::Restart
    }

    fn restart(&mut self, notices: &mut Vec<Notice>) -> Next {
        if self.stopped {
            return Next::Finish;
        }
        if self.listening {
            return Next::Continue;
        }
        match self.recognizer.start() {
            Ok(()) => {
                self.listening = true;
                Next::Continue
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to restart speech recognition");
                self.fail(VoiceError::Start(e), notices)
            }
        }
    }

    fn fail(&mut self, error: VoiceError, notices: &mut Vec<Notice>) -> Next {
        notices.push(Notice::Failed(error));
        self.stopped = true;
        self.listening = false;
        self.recognizer.abort();
        Next::Finish
    }

    fn mark_matched(&mut self, generation: u64, indices: &[usize]) {
        if generation != self.generation {
            return;
        }
        for &index in indices {
            if let Some(target) = self.targets.get_mut(index) {
                target.matched = true;
            }
        }
    }

    fn replace_targets(&mut self, words: &[String]) {
        self.targets = words.iter().map(|w| Target::new(w)).collect();
        self.generation += 1;
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settings for a voice session.
#[derive(Debug, Clone, Copy)]
pub struct VoiceConfig {
    pub restart_delay: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }
}

/// Starts continuous listening sessions.
#[derive(Debug, Clone)]
pub struct ContinuousVoiceSession {
    matcher: Arc<FuzzyMatcher>,
    config: VoiceConfig,
}

impl ContinuousVoiceSession {
    pub fn new(matcher: Arc<FuzzyMatcher>, config: VoiceConfig) -> Self {
        Self { matcher, config }
    }

    /// Begin listening for `targets`.
    ///
    /// If the recognizer is unavailable or refuses to start, the handler
    /// gets `on_error` followed by `on_end` and the returned handle is
    /// inert; callers fall back to manual input.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn start<S, H>(
        &self,
        mut recognizer: S,
        events: UnboundedReceiver<RecognitionEvent>,
        targets: &[String],
        mut handler: H,
    ) -> VoiceHandle
    where
        S: SpeechRecognizer + 'static,
        H: VoiceHandler + 'static,
    {
        if !recognizer.is_available() {
            tracing::info!("speech recognition unavailable, voice mode disabled");
            handler.on_error(&VoiceError::Unavailable);
            handler.on_end();
            return VoiceHandle::inert();
        }
        if let Err(e) = recognizer.start() {
            tracing::warn!(error = %e, "failed to start speech recognition");
            handler.on_error(&VoiceError::Start(e));
            handler.on_end();
            return VoiceHandle::inert();
        }

        let state = Arc::new(Mutex::new(State {
            stopped: false,
            cancelled: false,
            listening: true,
            targets: targets.iter().map(|w| Target::new(w)).collect(),
            generation: 0,
            recognizer: Box::new(recognizer),
        }));
        let wake = Arc::new(Notify::new());

        tracing::debug!(targets = targets.len(), "voice session started");
        tokio::spawn(run(
            Arc::clone(&state),
            events,
            Arc::clone(&wake),
            Box::new(handler),
            Arc::clone(&self.matcher),
            self.config.restart_delay,
        ));

        VoiceHandle {
            inner: Some(HandleInner { state, wake }),
        }
    }
}

async fn run(
    state: Arc<Mutex<State>>,
    mut events: UnboundedReceiver<RecognitionEvent>,
    wake: Arc<Notify>,
    mut handler: Box<dyn VoiceHandler>,
    matcher: Arc<FuzzyMatcher>,
    restart_delay: Duration,
) {
    let mut restart_at: Option<Instant> = None;
    let mut notices = Vec::new();

    loop {
        let next = tokio::select! {
            _ = wake.notified() => {
                if lock(&state).stopped { Next::Finish } else { Next::Continue }
            }
            event = events.recv() => match event {
                Some(event) => {
                    let mut guard = lock(&state);
                    guard.handle(event, &matcher, &mut notices)
                }
                None => Next::Finish,
            },
            _ = sleep_until(restart_at) => {
                restart_at = None;
                let mut guard = lock(&state);
                guard.restart(&mut notices)
            }
        };

        for notice in notices.drain(..) {
            deliver(&state, handler.as_mut(), notice);
        }

        match next {
            Next::Continue => {}
            Next::Restart => {
                if restart_at.is_none() {
                    restart_at = Some(Instant::now() + restart_delay);
                }
            }
            Next::Finish => break,
        }
    }

    tracing::debug!("voice session finished");
}

/// Run one handler callback. The lock is only taken between callbacks.
fn deliver(state: &Mutex<State>, handler: &mut dyn VoiceHandler, notice: Notice) {
    let cancelled = || lock(state).cancelled;
    if cancelled() {
        return;
    }
    match notice {
        Notice::Interim(transcript) => handler.on_interim(&transcript),
        Notice::NoMatch(transcript) => handler.on_no_match(&transcript),
        Notice::Failed(error) => {
            handler.on_error(&error);
            handler.on_end();
        }
        Notice::Matches {
            matches,
            generation,
        } => match handler.on_all_matches(&matches) {
            Some(consumed) => lock(state).mark_matched(generation, &consumed),
            None => {
                let Some(first) = matches.first() else {
                    return;
                };
                lock(state).mark_matched(generation, &[first.index]);
                if !cancelled() {
                    tracing::debug!(word = %first.word, kind = ?first.kind, "target matched");
                    handler.on_match(first);
                }
            }
        },
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

struct HandleInner {
    state: Arc<Mutex<State>>,
    wake: Arc<Notify>,
}

/// Control handle for a running voice session. Dropping it stops the session.
pub struct VoiceHandle {
    inner: Option<HandleInner>,
}

impl VoiceHandle {
    fn inert() -> Self {
        Self { inner: None }
    }

    /// Stop listening. No handler callback starts after this returns.
    pub fn stop(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        {
            let mut state = lock(&inner.state);
            state.cancelled = true;
            if !state.stopped {
                state.stopped = true;
                state.listening = false;
                state.recognizer.abort();
                tracing::debug!("voice session stopped");
            }
        }
        inner.wake.notify_one();
    }

    /// Replace the target set and forget which targets already matched.
    pub fn update_target_words(&self, words: &[String]) {
        if let Some(inner) = &self.inner {
            lock(&inner.state).replace_targets(words);
        }
    }

    /// Whether the session is still listening (or about to relisten).
    pub fn is_active(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| !lock(&inner.state).stopped)
    }
}

impl Drop for VoiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
