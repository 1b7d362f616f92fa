//! Engine command types and re-exported shared events
//!
//! Session-visible events live in `tahfiz_common::events`; this module adds
//! the engine's internal command enum. Commands are the only way state
//! reaches the engine: key presses, recognition results, and playback
//! completions all arrive on the same mpsc channel and are processed one at
//! a time. Commands are never serialized.

use uuid::Uuid;

pub use tahfiz_common::events::{
    DetailedFeedback, DiscardReason, EventBus, LinkProgressInfo, PlaybackCue, QualityTier,
    StageProgressInfo, TahfizEvent,
};

/// How a recognition attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    /// Recognizer produced a transcript to score
    Transcript(String),
    /// Learner cancelled mid-attempt; nothing is recorded
    Cancelled,
    /// Recognizer failed mid-attempt; the attempt is discarded, not failed
    Failed(String),
}

/// Commands processed by the session engine's event loop
///
/// Producers: the keyboard input loop, the recognition collaborator, and
/// the audio collaborator. The engine is the sole consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// The advance key (space) was pressed while no dictation was active
    AdvanceKey,

    /// A recognition attempt ended
    ///
    /// `attempt` must match the engine's in-flight attempt token; results
    /// carrying a stale token are discarded without recording.
    RecognitionEnded {
        attempt: Uuid,
        outcome: RecognitionOutcome,
    },

    /// Reference audio finished playing
    ///
    /// `token` must match the engine's in-flight playback token; stale
    /// completions are ignored.
    PlaybackFinished { token: Uuid },

    /// End the session (quit key or termination signal)
    Quit,
}
