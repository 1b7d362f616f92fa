//! Event types for the tahfiz event system
//!
//! Provides shared event definitions and the EventBus used by the session
//! engine, the terminal renderer, and the report writer.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::{LearnStage, VerseRef};

/// Quality classification for a scored attempt
///
/// Boundaries are inclusive at the upper tier: a similarity of exactly
/// 0.95 classifies as `Perfect`, exactly 0.80 as `Great`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityTier {
    /// similarity >= 0.95
    Perfect,
    /// similarity >= 0.80
    Great,
    /// similarity >= 0.60
    Good,
    /// similarity >= 0.30
    KeepTrying,
    /// everything below
    TryAgain,
}

impl QualityTier {
    /// Classify a similarity score into its tier
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= 0.95 {
            QualityTier::Perfect
        } else if similarity >= 0.80 {
            QualityTier::Great
        } else if similarity >= 0.60 {
            QualityTier::Good
        } else if similarity >= 0.30 {
            QualityTier::KeepTrying
        } else {
            QualityTier::TryAgain
        }
    }

    /// Feedback line shown to the learner for this tier
    pub fn message(&self) -> &'static str {
        match self {
            QualityTier::Perfect => "Perfect recitation! Excellent work.",
            QualityTier::Great => "Great recitation, very close to the reference.",
            QualityTier::Good => "Good effort, a few words need attention.",
            QualityTier::KeepTrying => "Keep trying, listen to the reference once more.",
            QualityTier::TryAgain => "Try again, take it slowly word by word.",
        }
    }
}

/// Structured feedback for one recitation attempt
///
/// Built fresh per attempt by the scorer and carried on `AttemptScored`
/// events; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedFeedback {
    /// Tier-level feedback line
    pub feedback: String,
    /// Expected words the transcript missed or mangled
    pub mistakes: Vec<String>,
    /// Hints derived from the mistakes
    pub suggestions: Vec<String>,
    /// Expected words the transcript matched
    pub correct_words: Vec<String>,
    /// Fraction of expected words matched, in [0, 1]
    pub word_accuracy: f64,
}

/// Snapshot of stage counters carried on attempt and stage events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageProgressInfo {
    pub stage_attempts: u32,
    pub stage_successes: u32,
    pub perfect_attempts: u32,
    pub consecutive_perfect: u32,
    /// Percentage toward stage completion, clamped to [0, 100]
    pub progress: f64,
}

/// Snapshot of link drill progress carried on link events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkProgressInfo {
    pub completed_pairs: usize,
    pub total_pairs: usize,
    /// Percentage of pairs completed, in [0, 100]
    pub progress: f64,
}

/// Why a recognition result was not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscardReason {
    /// Result arrived after its attempt was cancelled or superseded
    Stale,
    /// Learner cancelled while reciting
    Cancelled,
    /// Recognizer reported an error mid-attempt
    RecognitionError,
}

/// What the reference audio is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackCue {
    /// Whole verse, introduction listen
    FullVerse,
    /// Whole verse, learner recites along
    Shadow,
    /// Ending words of the leading verse in a link pair
    PairEnding,
}

/// Tahfiz event types
///
/// Events are broadcast via EventBus. All session-visible state changes use
/// this central enum for type safety and exhaustive matching; the engine is
/// the only emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TahfizEvent {
    /// Practice session started
    ///
    /// Triggers:
    /// - Renderer: Show session header
    /// - Report: Record session start time
    SessionStarted {
        /// Surah number being practiced
        surah: u16,
        /// Surah name from the verse pack
        surah_name: String,
        /// First ayah in the practice range (inclusive)
        start_ayah: u16,
        /// Last ayah in the practice range (inclusive)
        end_ayah: u16,
        /// Number of verses in the plan
        verse_count: usize,
        /// When the session started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verse entered a new practice stage
    ///
    /// Triggers:
    /// - Renderer: Show stage prompt and verse text (hidden for recall)
    /// - Report: Record stage entry
    StageEntered {
        /// Verse being practiced
        verse: VerseRef,
        /// Stage just entered
        stage: LearnStage,
        /// When the stage was entered
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Reference audio started
    ///
    /// Triggers:
    /// - Renderer: Show playing indicator
    PlaybackStarted {
        /// Verse the recording belongs to
        verse: VerseRef,
        /// What part of the verse is playing
        cue: PlaybackCue,
        /// Token identifying this playback; completions carry it back
        token: Uuid,
        /// When playback started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Reference audio finished
    ///
    /// Triggers:
    /// - Renderer: Clear playing indicator, show next prompt
    PlaybackFinished {
        /// Verse the recording belonged to
        verse: VerseRef,
        /// Token from the matching PlaybackStarted
        token: Uuid,
        /// When playback finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A recitation attempt started (recognition active)
    ///
    /// Triggers:
    /// - Renderer: Show reciting indicator and typing echo
    AttemptStarted {
        /// Verse being recited
        verse: VerseRef,
        /// Stage the attempt belongs to
        stage: LearnStage,
        /// Identifier carried through to the scored result
        attempt_id: Uuid,
        /// When the attempt started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A recitation attempt was scored and recorded
    ///
    /// Triggers:
    /// - Renderer: Show feedback, mistakes, and progress
    /// - Report: Record attempt aggregate
    AttemptScored {
        /// Verse that was recited
        verse: VerseRef,
        /// Stage the attempt belonged to
        stage: LearnStage,
        /// Identifier from the matching AttemptStarted
        attempt_id: Uuid,
        /// Normalized closeness of transcript to expected text, in [0, 1]
        similarity: f64,
        /// Whether the attempt counted as successful
        successful: bool,
        /// Quality tier for the similarity
        tier: QualityTier,
        /// Structured feedback for display
        feedback: DetailedFeedback,
        /// Stage counters after recording this attempt
        progress: StageProgressInfo,
        /// When the attempt was scored
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A recognition result was discarded without recording
    ///
    /// Triggers:
    /// - Renderer: Return to the waiting prompt
    AttemptDiscarded {
        /// Identifier of the discarded attempt
        attempt_id: Uuid,
        /// Why the result was discarded
        reason: DiscardReason,
        /// When the result was discarded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A stage reached its completion requirement
    ///
    /// Triggers:
    /// - Renderer: Show stage completion banner
    /// - Report: Record stage outcome
    StageCompleted {
        /// Verse whose stage completed
        verse: VerseRef,
        /// Stage that completed
        stage: LearnStage,
        /// Final stage counters
        progress: StageProgressInfo,
        /// When the stage completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verse passed recall and was recorded as mastered
    ///
    /// Triggers:
    /// - Renderer: Show mastery banner
    /// - Report: Record mastered verse
    VerseMastered {
        /// Verse recorded as mastered
        verse: VerseRef,
        /// When mastery was recorded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Learner is struggling on a stage
    ///
    /// Fired when a stage accumulates attempts with no success. Display
    /// only; the state machine does not change course.
    ///
    /// Triggers:
    /// - Renderer: Show encouragement hint
    StruggleDetected {
        /// Verse being struggled with
        verse: VerseRef,
        /// Stage being struggled with
        stage: LearnStage,
        /// Attempts made in the stage so far
        stage_attempts: u32,
        /// When the struggle was flagged
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Link drill over mastered verse pairs started
    ///
    /// Triggers:
    /// - Renderer: Show link drill header
    LinkDrillStarted {
        /// Number of practicable pairs in the drill
        total_pairs: usize,
        /// When the drill started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The drill moved to a verse pair
    ///
    /// Triggers:
    /// - Renderer: Show the pair's ending and hidden beginning
    LinkPairEntered {
        /// Verse whose ending is played
        leading: VerseRef,
        /// Verse whose beginning is recited
        following: VerseRef,
        /// 0-based index of the pair in the drill
        pair_index: usize,
        /// When the pair was entered
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A link attempt was scored
    ///
    /// Triggers:
    /// - Renderer: Show link feedback and pair progress
    /// - Report: Record link attempt aggregate
    LinkAttemptScored {
        /// Verse whose ending was played
        leading: VerseRef,
        /// Verse whose beginning was recited
        following: VerseRef,
        /// Identifier from the matching AttemptStarted
        attempt_id: Uuid,
        /// Normalized closeness to the expected beginning, in [0, 1]
        similarity: f64,
        /// Fraction of expected words matched, in [0, 1]
        word_accuracy: f64,
        /// Whether the attempt qualified as perfect
        perfect: bool,
        /// Qualifying attempts recorded for this pair so far
        perfect_attempts: u32,
        /// Drill progress after this attempt
        progress: LinkProgressInfo,
        /// When the attempt was scored
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verse pair reached its perfect-attempt requirement
    ///
    /// Triggers:
    /// - Renderer: Show pair completion banner
    /// - Report: Record pair outcome
    LinkPairCompleted {
        /// Verse whose ending was played
        leading: VerseRef,
        /// Verse whose beginning was recited
        following: VerseRef,
        /// Drill progress after completing this pair
        progress: LinkProgressInfo,
        /// When the pair completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verse pair was dropped from the drill
    ///
    /// Pairs with malformed or missing text are skipped rather than
    /// aborting the drill.
    ///
    /// Triggers:
    /// - Renderer: Note the skipped pair
    LinkPairSkipped {
        /// Verse whose ending would have been played
        leading: VerseRef,
        /// Verse whose beginning would have been recited
        following: VerseRef,
        /// Why the pair was skipped
        reason: String,
        /// When the pair was skipped
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The whole practice session finished
    ///
    /// Triggers:
    /// - Renderer: Show session summary
    /// - Report: Write the session report
    SessionCompleted {
        /// Verses recorded as mastered
        verses_mastered: usize,
        /// Link pairs completed
        pairs_completed: usize,
        /// When the session completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition is unavailable (unsupported or permission denied)
    ///
    /// The session stays in its pre-attempt state; the learner may retry.
    ///
    /// Triggers:
    /// - Renderer: Show blocking message
    RecognitionUnavailable {
        /// Human-readable reason
        message: String,
        /// When the failure surfaced
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Event bus for broadcasting tahfiz events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the engine)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use tahfiz_common::events::{EventBus, TahfizEvent};
/// use tahfiz_common::types::{LearnStage, VerseRef};
///
/// let event_bus = EventBus::new(1000);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(TahfizEvent::StageEntered {
///     verse: VerseRef::new(1, 1),
///     stage: LearnStage::AyahIntro,
///     timestamp: chrono::Utc::now(),
/// }).ok();
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TahfizEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Events beyond capacity overwrite the oldest unread ones; slow
    /// subscribers observe a lag error rather than blocking the engine.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TahfizEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscriber is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: TahfizEvent,
    ) -> Result<usize, broadcast::error::SendError<TahfizEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// For non-critical events where a missing subscriber is acceptable.
    pub fn emit_lossy(&self, event: TahfizEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> TahfizEvent {
        TahfizEvent::StageEntered {
            verse: VerseRef::new(1, 2),
            stage: LearnStage::ReadRecite,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn quality_tier_upper_bounds_are_inclusive() {
        assert_eq!(QualityTier::from_similarity(0.95), QualityTier::Perfect);
        assert_eq!(QualityTier::from_similarity(0.94999), QualityTier::Great);
        assert_eq!(QualityTier::from_similarity(0.80), QualityTier::Great);
        assert_eq!(QualityTier::from_similarity(0.60), QualityTier::Good);
        assert_eq!(QualityTier::from_similarity(0.30), QualityTier::KeepTrying);
        assert_eq!(QualityTier::from_similarity(0.29), QualityTier::TryAgain);
        assert_eq!(QualityTier::from_similarity(0.0), QualityTier::TryAgain);
        assert_eq!(QualityTier::from_similarity(1.0), QualityTier::Perfect);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(value["type"], "StageEntered");
        assert_eq!(value["stage"], "read-recite");
        assert_eq!(value["verse"]["surah"], 1);
        assert_eq!(value["verse"]["ayah"], 2);
    }

    #[test]
    fn emit_without_subscribers_errors() {
        let bus = EventBus::new(16);
        assert!(bus.emit(sample_event()).is_err());
    }

    #[test]
    fn emit_lossy_without_subscribers_is_silent() {
        let bus = EventBus::new(16);
        bus.emit_lossy(sample_event());
    }

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(sample_event()).unwrap();

        match rx.recv().await.unwrap() {
            TahfizEvent::StageEntered { verse, stage, .. } => {
                assert_eq!(verse, VerseRef::new(1, 2));
                assert_eq!(stage, LearnStage::ReadRecite);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn subscriber_count_tracks_subscriptions() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(rx1);
        drop(rx2);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 16);
    }
}
