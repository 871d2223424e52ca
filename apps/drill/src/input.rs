//! Terminal input: stdin lines stand in for speech recognition results.

use mastery_core::{RecognitionErrorKind, RecognitionEvent, SpeechRecognizer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// A line typed by the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// What the learner read aloud.
    Heard(String),
    /// Give up on the current word (counts as a miss).
    Pass,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "pass" | "skip" => Self::Pass,
            "quit" | "exit" | ":q" => Self::Quit,
            _ => Self::Heard(line.trim().to_string()),
        }
    }
}

/// Read stdin on a background task until EOF.
pub fn spawn_stdin_reader() -> UnboundedReceiver<Command> {
    let (tx, rx) = unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(Command::parse(&line)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Recognizer backed by typed lines. Aborting emits the same
/// `aborted` + `end` pair a browser recognizer does.
pub struct LineRecognizer {
    events: UnboundedSender<RecognitionEvent>,
}

impl LineRecognizer {
    pub fn new(events: UnboundedSender<RecognitionEvent>) -> Self {
        Self { events }
    }
}

impl SpeechRecognizer for LineRecognizer {
    fn is_available(&self) -> bool {
        !self.events.is_closed()
    }

    fn start(&mut self) -> Result<(), String> {
        if self.events.is_closed() {
            return Err("input stream closed".to_string());
        }
        Ok(())
    }

    fn abort(&mut self) {
        let _ = self
            .events
            .send(RecognitionEvent::Error(RecognitionErrorKind::Aborted));
        let _ = self.events.send(RecognitionEvent::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(" PASS "), Command::Pass);
        assert_eq!(Command::parse("skip"), Command::Pass);
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(Command::parse(" the Cat "), Command::Heard("the Cat".to_string()));
        assert_eq!(Command::parse(""), Command::Heard(String::new()));
    }

    #[test]
    fn test_abort_emits_aborted_then_end() {
        let (tx, mut rx) = unbounded_channel();
        let mut recognizer = LineRecognizer::new(tx);
        assert!(recognizer.is_available());
        recognizer.start().unwrap();
        recognizer.abort();

        assert_eq!(
            rx.try_recv().unwrap(),
            RecognitionEvent::Error(RecognitionErrorKind::Aborted)
        );
        assert_eq!(rx.try_recv().unwrap(), RecognitionEvent::End);
    }

    #[test]
    fn test_closed_channel_is_unavailable() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        let mut recognizer = LineRecognizer::new(tx);
        assert!(!recognizer.is_available());
        assert!(recognizer.start().is_err());
    }
}
