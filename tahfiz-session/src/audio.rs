//! Reference audio collaborators
//!
//! The engine treats reference playback the way it treats recognition: an
//! opaque collaborator that is told to play and reports completion as an
//! `EngineCommand::PlaybackFinished` on the command channel. The real
//! decode/output pipeline is out of scope; `PacedAudio` simulates playback
//! by pacing on word count so the session flows at recitation speed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::Result;
use crate::events::{EngineCommand, PlaybackCue};
use tahfiz_common::types::VerseRef;

/// What the engine asks the audio collaborator to play
#[derive(Debug, Clone, PartialEq)]
pub struct AudioRequest {
    /// Verse the recording belongs to
    pub verse: VerseRef,
    /// Which part of the verse is wanted
    pub cue: PlaybackCue,
    /// Words in the cue; drives simulated pacing
    pub word_count: usize,
    /// Recording hint from the verse pack, when present
    pub audio_hint: Option<String>,
}

/// Plays reference audio and reports completion as an engine command
pub trait ReferenceAudio: Send {
    /// Start playing; completion arrives later carrying `token`
    fn play(&mut self, token: Uuid, request: &AudioRequest) -> Result<()>;

    /// Stop the in-flight playback, if any; no completion will be delivered
    fn stop(&mut self);
}

/// Simulated playback paced by word count
///
/// Sleeps `word_count x ms_per_word` on a spawned task, then delivers the
/// completion. `stop` aborts the task so a cancelled playback never
/// completes.
pub struct PacedAudio {
    commands: UnboundedSender<EngineCommand>,
    ms_per_word: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl PacedAudio {
    pub fn new(commands: UnboundedSender<EngineCommand>, ms_per_word: u64) -> Self {
        Self {
            commands,
            ms_per_word,
            in_flight: None,
        }
    }
}

impl ReferenceAudio for PacedAudio {
    fn play(&mut self, token: Uuid, request: &AudioRequest) -> Result<()> {
        self.stop();
        let commands = self.commands.clone();
        let duration = Duration::from_millis(self.ms_per_word * request.word_count.max(1) as u64);
        self.in_flight = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = commands.send(EngineCommand::PlaybackFinished { token });
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

/// Completes every playback immediately; used by the integration tests
pub struct InstantAudio {
    commands: UnboundedSender<EngineCommand>,
    played: Arc<Mutex<Vec<AudioRequest>>>,
}

impl InstantAudio {
    pub fn new(commands: UnboundedSender<EngineCommand>) -> (Self, Arc<Mutex<Vec<AudioRequest>>>) {
        let played = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                commands,
                played: Arc::clone(&played),
            },
            played,
        )
    }
}

impl ReferenceAudio for InstantAudio {
    fn play(&mut self, token: Uuid, request: &AudioRequest) -> Result<()> {
        if let Ok(mut played) = self.played.lock() {
            played.push(request.clone());
        }
        let _ = self.commands.send(EngineCommand::PlaybackFinished { token });
        Ok(())
    }

    fn stop(&mut self) {}
}
