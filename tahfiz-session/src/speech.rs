//! Speech recognition collaborators
//!
//! The engine treats recognition as an opaque collaborator: `start` opens
//! an attempt, `stop` abandons it, and the result arrives later as an
//! `EngineCommand::RecognitionEnded` on the engine's command channel. The
//! engine never blocks on a result.
//!
//! Two implementations:
//! - `KeyboardRecognition`: typed transliteration in the terminal stands in
//!   for browser speech recognition. Characters accumulate in a dictation
//!   buffer, Enter submits, Esc cancels.
//! - `ScriptedRecognition`: replays a scripted sequence of outcomes, used
//!   by the integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{EngineCommand, RecognitionOutcome};

/// An active recognition attempt, delivering its result as an engine command
pub trait SpeechRecognition: Send {
    /// Open a recognition attempt for the expected text
    ///
    /// Errors when the backend is unavailable; the engine surfaces that as
    /// a blocking message and stays in its pre-attempt state.
    fn start(&mut self, attempt: Uuid, expected_text: &str) -> Result<()>;

    /// Abandon the in-flight attempt, if any; no result will be delivered
    fn stop(&mut self);
}

/// State of an in-progress typed dictation
#[derive(Debug)]
struct Dictation {
    attempt: Uuid,
    buffer: String,
}

/// Typed-recitation recognizer
///
/// Shares its dictation state with a `TypingHandle` held by the keyboard
/// input loop, which feeds characters in and submits or cancels.
pub struct KeyboardRecognition {
    active: Arc<Mutex<Option<Dictation>>>,
}

impl KeyboardRecognition {
    /// Build the recognizer and the typing handle for the input loop
    pub fn new(commands: UnboundedSender<EngineCommand>) -> (Self, TypingHandle) {
        let active = Arc::new(Mutex::new(None));
        let handle = TypingHandle {
            active: Arc::clone(&active),
            commands,
        };
        (Self { active }, handle)
    }
}

impl SpeechRecognition for KeyboardRecognition {
    fn start(&mut self, attempt: Uuid, _expected_text: &str) -> Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::Recognition("dictation state poisoned".to_string()))?;
        *active = Some(Dictation {
            attempt,
            buffer: String::new(),
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }
    }
}

/// Input-loop side of `KeyboardRecognition`
///
/// The single keyboard dispatcher consults `is_active` to decide whether a
/// key belongs to the dictation or to session control.
#[derive(Clone)]
pub struct TypingHandle {
    active: Arc<Mutex<Option<Dictation>>>,
    commands: UnboundedSender<EngineCommand>,
}

impl TypingHandle {
    /// Whether a dictation is currently accepting characters
    pub fn is_active(&self) -> bool {
        self.active.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    /// Append a typed character to the dictation buffer
    pub fn push_char(&self, c: char) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(dictation) = active.as_mut() {
                dictation.buffer.push(c);
            }
        }
    }

    /// Remove the last typed character
    pub fn backspace(&self) {
        if let Ok(mut active) = self.active.lock() {
            if let Some(dictation) = active.as_mut() {
                dictation.buffer.pop();
            }
        }
    }

    /// Current dictation buffer contents, for the typing echo
    pub fn buffer(&self) -> String {
        self.active
            .lock()
            .ok()
            .and_then(|a| a.as_ref().map(|d| d.buffer.clone()))
            .unwrap_or_default()
    }

    /// Submit the dictation as the attempt's transcript (Enter)
    pub fn submit(&self) {
        let taken = self.active.lock().ok().and_then(|mut a| a.take());
        if let Some(dictation) = taken {
            let _ = self.commands.send(EngineCommand::RecognitionEnded {
                attempt: dictation.attempt,
                outcome: RecognitionOutcome::Transcript(dictation.buffer),
            });
        }
    }

    /// Cancel the dictation without a transcript (Esc)
    pub fn cancel(&self) {
        let taken = self.active.lock().ok().and_then(|mut a| a.take());
        if let Some(dictation) = taken {
            let _ = self.commands.send(EngineCommand::RecognitionEnded {
                attempt: dictation.attempt,
                outcome: RecognitionOutcome::Cancelled,
            });
        }
    }
}

/// Replays a scripted sequence of recognition outcomes
///
/// Each `start` call consumes the next scripted outcome and delivers it
/// immediately as an engine command. Used by the integration tests in place
/// of typed input.
pub struct ScriptedRecognition {
    script: VecDeque<RecognitionOutcome>,
    commands: UnboundedSender<EngineCommand>,
    /// Expected texts passed to `start`, for assertions
    started_with: Arc<Mutex<Vec<String>>>,
    /// When false, `start` fails as an unavailable backend would
    available: bool,
}

impl ScriptedRecognition {
    pub fn new(
        commands: UnboundedSender<EngineCommand>,
        script: Vec<RecognitionOutcome>,
    ) -> (Self, Arc<Mutex<Vec<String>>>) {
        let started_with = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                script: script.into(),
                commands,
                started_with: Arc::clone(&started_with),
                available: true,
            },
            started_with,
        )
    }

    /// Make every subsequent `start` fail, simulating a missing backend
    pub fn set_unavailable(&mut self) {
        self.available = false;
    }
}

impl SpeechRecognition for ScriptedRecognition {
    fn start(&mut self, attempt: Uuid, expected_text: &str) -> Result<()> {
        if !self.available {
            return Err(Error::Recognition(
                "speech recognition is not available".to_string(),
            ));
        }
        if let Ok(mut started) = self.started_with.lock() {
            started.push(expected_text.to_string());
        }
        let outcome = self.script.pop_front().unwrap_or(RecognitionOutcome::Cancelled);
        let _ = self
            .commands
            .send(EngineCommand::RecognitionEnded { attempt, outcome });
        Ok(())
    }

    fn stop(&mut self) {}
}
