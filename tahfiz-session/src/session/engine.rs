//! Session engine
//!
//! Owns all mutable session state and runs the single event loop every
//! state change goes through. Key presses, recognition results, and
//! playback completions arrive as `EngineCommand`s on one mpsc channel and
//! are processed strictly in arrival order; session-visible changes go out
//! as `TahfizEvent`s on the shared bus.
//!
//! Control phases enforce one-thing-at-a-time: while audio plays or an
//! attempt is reciting, the advance key is ignored. Attempts and playbacks
//! carry UUID tokens; a result whose token does not match the in-flight one
//! is stale and is discarded without touching any counter.

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tahfiz_common::events::{EventBus, PlaybackCue, StageProgressInfo, TahfizEvent};
use tahfiz_common::params::PARAMS;
use tahfiz_common::types::{LearnStage, SurahText, VerseRef, VerseText};

use crate::audio::{AudioRequest, ReferenceAudio};
use crate::error::Result;
use crate::events::{DiscardReason, EngineCommand, RecognitionOutcome};
use crate::report::{ReportBuilder, SessionReport};
use crate::scoring::RecitationScorer;
use crate::session::drill::LinkDrill;
use crate::session::machine::{Advance, GateInputs, StageMachine, TrackerReset};
use crate::session::plan::SessionPlan;
use crate::session::tracker::StageProgressTracker;
use crate::speech::SpeechRecognition;

/// Tunables the engine reads once at construction
///
/// Snapshotted from the global parameters by `from_params`; tests construct
/// it directly so they never touch the singleton.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub required_repetitions: u32,
    pub perfect_word_accuracy: f64,
    pub success_similarity: f64,
    pub link_similarity: f64,
    pub link_word_accuracy: f64,
    pub link_required_perfect: u32,
    pub link_word_count: usize,
    pub struggle_attempt_threshold: u32,
    pub word_match_threshold: f64,
}

impl EngineConfig {
    /// Snapshot the current global parameters
    pub fn from_params() -> Self {
        Self {
            required_repetitions: *PARAMS.required_repetitions.read().unwrap(),
            perfect_word_accuracy: *PARAMS.perfect_word_accuracy.read().unwrap(),
            success_similarity: *PARAMS.success_similarity.read().unwrap(),
            link_similarity: *PARAMS.link_similarity.read().unwrap(),
            link_word_accuracy: *PARAMS.link_word_accuracy.read().unwrap(),
            link_required_perfect: *PARAMS.link_required_perfect.read().unwrap(),
            link_word_count: *PARAMS.link_word_count.read().unwrap(),
            struggle_attempt_threshold: *PARAMS.struggle_attempt_threshold.read().unwrap(),
            word_match_threshold: *PARAMS.word_match_threshold.read().unwrap(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            required_repetitions: 3,
            perfect_word_accuracy: 0.95,
            success_similarity: 0.6,
            link_similarity: 0.9,
            link_word_accuracy: 0.9,
            link_required_perfect: 2,
            link_word_count: 3,
            struggle_attempt_threshold: 5,
            word_match_threshold: 0.8,
        }
    }
}

/// What the engine is currently waiting on
///
/// The phases are mutually exclusive; a new attempt cannot start while a
/// previous one's result is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlPhase {
    /// Waiting for the advance key
    AwaitingKey,
    /// Reference audio is playing
    PlayingAudio { token: Uuid },
    /// A recognition attempt is in flight
    Reciting { attempt: Uuid },
}

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Completed,
    Quit,
}

/// The practice session event loop
pub struct SessionEngine {
    plan: SessionPlan,
    machine: StageMachine,
    tracker: StageProgressTracker,
    drill: Option<LinkDrill>,
    scorer: RecitationScorer,
    config: EngineConfig,
    speech: Box<dyn SpeechRecognition>,
    audio: Box<dyn ReferenceAudio>,
    bus: EventBus,
    commands: UnboundedReceiver<EngineCommand>,
    phase: ControlPhase,
    report: ReportBuilder,
    surah: u16,
    surah_name: String,
    /// Struggle is reported once per stage, not on every attempt past the
    /// threshold
    struggle_flagged: bool,
    ending: Option<Ending>,
}

impl SessionEngine {
    /// Build an engine over the verses of one practice range
    pub fn new(
        surah: &SurahText,
        verses: Vec<VerseText>,
        config: EngineConfig,
        bus: EventBus,
        speech: Box<dyn SpeechRecognition>,
        audio: Box<dyn ReferenceAudio>,
        commands: UnboundedReceiver<EngineCommand>,
    ) -> Result<Self> {
        let plan = SessionPlan::new(verses)?;
        let tracker = StageProgressTracker::new(
            config.required_repetitions,
            config.perfect_word_accuracy,
            config.struggle_attempt_threshold,
        );
        let scorer = RecitationScorer::new(config.word_match_threshold);
        let report = ReportBuilder::new(surah.number, &surah.name);

        Ok(Self {
            plan,
            machine: StageMachine::new(),
            tracker,
            drill: None,
            scorer,
            config,
            speech,
            audio,
            bus,
            commands,
            phase: ControlPhase::AwaitingKey,
            report,
            surah: surah.number,
            surah_name: surah.name.clone(),
            struggle_flagged: false,
            ending: None,
        })
    }

    /// Run the session to completion (or quit) and return the report
    pub async fn run(mut self) -> SessionReport {
        let start_ayah = self.plan.current_verse().reference.ayah;
        let end_ayah = start_ayah + self.plan.verse_count() as u16 - 1;
        info!(
            surah = self.surah,
            start_ayah, end_ayah, "practice session starting"
        );

        self.emit(TahfizEvent::SessionStarted {
            surah: self.surah,
            surah_name: self.surah_name.clone(),
            start_ayah,
            end_ayah,
            verse_count: self.plan.verse_count(),
            timestamp: Utc::now(),
        });
        self.emit_stage_entered();

        while self.ending.is_none() {
            match self.commands.recv().await {
                Some(command) => self.handle_command(command),
                None => {
                    // All producers dropped; nothing more can happen
                    warn!("command channel closed, ending session");
                    self.ending = Some(Ending::Quit);
                }
            }
        }

        self.speech.stop();
        self.audio.stop();

        if let Some(drill) = &self.drill {
            self.report.record_link_summary(
                drill.total_pairs(),
                drill.completed_pairs(),
                drill.skipped().len(),
            );
        }
        let completed = self.ending == Some(Ending::Completed);
        info!(completed, "practice session ended");
        self.report.finish(completed)
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::AdvanceKey => self.handle_advance_key(),
            EngineCommand::RecognitionEnded { attempt, outcome } => {
                self.handle_recognition_ended(attempt, outcome)
            }
            EngineCommand::PlaybackFinished { token } => self.handle_playback_finished(token),
            EngineCommand::Quit => {
                info!("quit requested");
                self.ending = Some(Ending::Quit);
            }
        }
    }

    // ---- key handling ----------------------------------------------------

    fn handle_advance_key(&mut self) {
        if self.phase != ControlPhase::AwaitingKey {
            debug!(phase = ?self.phase, "advance key ignored, engine is busy");
            return;
        }

        match self.machine.stage() {
            LearnStage::AyahIntro => {
                let verse = self.plan.current_verse().clone();
                self.play_cue(&verse, PlaybackCue::FullVerse, verse.word_count());
            }
            LearnStage::ListenShadow => {
                // The key after shadow playback is the ready confirmation
                let outcome = self.machine.advance(GateInputs {
                    ready: true,
                    stage_complete: self.tracker.is_stage_complete(),
                    more_verses: self.plan.has_next(),
                });
                self.apply_advance(outcome);
            }
            LearnStage::ReadRecite | LearnStage::RecallMemory => {
                let expected = self.plan.current_verse().transliteration_line();
                let verse = self.plan.current_verse().reference;
                self.start_attempt(verse, expected);
            }
            LearnStage::ConnectAyahs => self.play_link_prompt(),
        }
    }

    // ---- playback --------------------------------------------------------

    fn play_cue(&mut self, verse: &VerseText, cue: PlaybackCue, word_count: usize) {
        let token = Uuid::new_v4();
        let request = AudioRequest {
            verse: verse.reference,
            cue,
            word_count,
            audio_hint: verse.audio.clone(),
        };
        match self.audio.play(token, &request) {
            Ok(()) => {
                self.phase = ControlPhase::PlayingAudio { token };
                self.emit(TahfizEvent::PlaybackStarted {
                    verse: verse.reference,
                    cue,
                    token,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(error = %e, "reference audio failed to start");
            }
        }
    }

    fn play_link_prompt(&mut self) {
        let Some(pair) = self.drill.as_ref().and_then(|d| d.current_pair()) else {
            debug!("advance key in link drill with no current pair");
            return;
        };
        let leading = pair.leading;
        let word_count = pair.prompt_tail.len();
        // The prompt is the tail of the leading verse
        let verse = self
            .plan
            .mastered_texts()
            .into_iter()
            .find(|v| v.reference == leading);
        if let Some(verse) = verse {
            self.play_cue(&verse, PlaybackCue::PairEnding, word_count);
        }
    }

    fn handle_playback_finished(&mut self, token: Uuid) {
        let ControlPhase::PlayingAudio { token: current } = self.phase else {
            debug!(%token, "stale playback completion ignored");
            return;
        };
        if current != token {
            debug!(%token, "playback completion for a superseded token ignored");
            return;
        }

        self.phase = ControlPhase::AwaitingKey;
        // In the link drill the recording belongs to the leading verse of
        // the current pair, not the plan's cursor
        let verse = match self.machine.stage() {
            LearnStage::ConnectAyahs => self
                .drill
                .as_ref()
                .and_then(|d| d.current_pair())
                .map(|p| p.leading)
                .unwrap_or(self.plan.current_verse().reference),
            _ => self.plan.current_verse().reference,
        };
        self.emit(TahfizEvent::PlaybackFinished {
            verse,
            token,
            timestamp: Utc::now(),
        });

        match self.machine.stage() {
            LearnStage::AyahIntro => {
                // Intro heard; move into listen-shadow and play along
                let outcome = self.machine.advance(GateInputs {
                    ready: false,
                    stage_complete: false,
                    more_verses: self.plan.has_next(),
                });
                self.apply_advance(outcome);
                let verse = self.plan.current_verse().clone();
                self.play_cue(&verse, PlaybackCue::Shadow, verse.word_count());
            }
            LearnStage::ListenShadow => {
                // Await the ready confirmation
            }
            LearnStage::ConnectAyahs => {
                // Prompt heard; recognition opens for the next verse's head
                let Some(pair) = self.drill.as_ref().and_then(|d| d.current_pair()) else {
                    return;
                };
                let following = pair.following;
                let expected = pair
                    .expected_head
                    .iter()
                    .map(|w| w.transliteration.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.start_attempt(following, expected);
            }
            LearnStage::ReadRecite | LearnStage::RecallMemory => {
                debug!("unexpected playback completion in a scored stage");
            }
        }
    }

    // ---- attempts --------------------------------------------------------

    fn start_attempt(&mut self, verse: VerseRef, expected_text: String) {
        let attempt = Uuid::new_v4();
        match self.speech.start(attempt, &expected_text) {
            Ok(()) => {
                self.phase = ControlPhase::Reciting { attempt };
                self.emit(TahfizEvent::AttemptStarted {
                    verse,
                    stage: self.machine.stage(),
                    attempt_id: attempt,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(error = %e, "recognition unavailable");
                self.emit(TahfizEvent::RecognitionUnavailable {
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn handle_recognition_ended(&mut self, attempt: Uuid, outcome: RecognitionOutcome) {
        let ControlPhase::Reciting { attempt: current } = self.phase else {
            self.discard(attempt, DiscardReason::Stale);
            return;
        };
        if current != attempt {
            self.discard(attempt, DiscardReason::Stale);
            return;
        }

        self.phase = ControlPhase::AwaitingKey;
        match outcome {
            RecognitionOutcome::Cancelled => self.discard(attempt, DiscardReason::Cancelled),
            RecognitionOutcome::Failed(message) => {
                warn!(%message, "recognition failed mid-attempt");
                self.discard(attempt, DiscardReason::RecognitionError);
            }
            RecognitionOutcome::Transcript(transcript) => {
                if self.machine.stage() == LearnStage::ConnectAyahs {
                    self.score_link_attempt(attempt, &transcript);
                } else {
                    self.score_stage_attempt(attempt, &transcript);
                }
            }
        }
    }

    fn discard(&mut self, attempt: Uuid, reason: DiscardReason) {
        debug!(%attempt, ?reason, "attempt discarded");
        self.emit(TahfizEvent::AttemptDiscarded {
            attempt_id: attempt,
            reason,
            timestamp: Utc::now(),
        });
    }

    // ---- stage scoring ---------------------------------------------------

    fn score_stage_attempt(&mut self, attempt: Uuid, transcript: &str) {
        let verse = self.plan.current_verse().clone();
        let expected: Vec<&str> = verse
            .words
            .iter()
            .map(|w| w.transliteration.as_str())
            .collect();

        let score = self.scorer.score(transcript, &expected);
        let successful = score.similarity >= self.config.success_similarity;
        let perfect = successful && score.word_accuracy >= self.config.perfect_word_accuracy;
        let tier = self.scorer.classify(score.similarity);
        let feedback = self.scorer.detailed_feedback(transcript, &expected);

        self.tracker.record_attempt(successful, score.word_accuracy);
        self.report
            .record_attempt(verse.reference, successful, perfect);

        debug!(
            verse = %verse.reference,
            stage = %self.machine.stage(),
            similarity = score.similarity,
            word_accuracy = score.word_accuracy,
            successful,
            "attempt scored"
        );

        self.emit(TahfizEvent::AttemptScored {
            verse: verse.reference,
            stage: self.machine.stage(),
            attempt_id: attempt,
            similarity: score.similarity,
            successful,
            tier,
            feedback,
            progress: self.progress_info(),
            timestamp: Utc::now(),
        });

        if self.tracker.is_struggling() && !self.struggle_flagged {
            self.struggle_flagged = true;
            self.emit(TahfizEvent::StruggleDetected {
                verse: verse.reference,
                stage: self.machine.stage(),
                stage_attempts: self.tracker.stage_attempt_count(),
                timestamp: Utc::now(),
            });
        }

        if self.tracker.is_stage_complete() {
            self.emit(TahfizEvent::StageCompleted {
                verse: verse.reference,
                stage: self.machine.stage(),
                progress: self.progress_info(),
                timestamp: Utc::now(),
            });
            let outcome = self.machine.advance(GateInputs {
                ready: false,
                stage_complete: true,
                more_verses: self.plan.has_next(),
            });
            self.apply_advance(outcome);
        }
    }

    // ---- link scoring ----------------------------------------------------

    fn score_link_attempt(&mut self, attempt: Uuid, transcript: &str) {
        let Some((leading, following, perfect_before, expected_words)) =
            self.drill.as_ref().and_then(|d| d.current_pair()).map(|p| {
                let expected: Vec<String> = p
                    .expected_head
                    .iter()
                    .map(|w| w.transliteration.clone())
                    .collect();
                (p.leading, p.following, p.perfect_attempts, expected)
            })
        else {
            return;
        };
        let expected: Vec<&str> = expected_words.iter().map(|w| w.as_str()).collect();

        let score = self.scorer.score(transcript, &expected);
        let Some(drill) = self.drill.as_mut() else {
            return;
        };
        let outcome = drill.record_attempt(score.similarity, score.word_accuracy);
        let progress = drill.progress();
        let perfect_attempts = if outcome.perfect {
            perfect_before + 1
        } else {
            perfect_before
        };

        self.report.record_link_attempt();

        debug!(
            %leading,
            %following,
            similarity = score.similarity,
            word_accuracy = score.word_accuracy,
            perfect = outcome.perfect,
            "link attempt scored"
        );

        self.emit(TahfizEvent::LinkAttemptScored {
            leading,
            following,
            attempt_id: attempt,
            similarity: score.similarity,
            word_accuracy: score.word_accuracy,
            perfect: outcome.perfect,
            perfect_attempts,
            progress,
            timestamp: Utc::now(),
        });

        if outcome.pair_completed {
            self.emit(TahfizEvent::LinkPairCompleted {
                leading,
                following,
                progress,
                timestamp: Utc::now(),
            });
        }

        if outcome.drill_completed {
            self.complete_session();
        } else if outcome.pair_completed {
            self.emit_link_pair_entered();
        }
    }

    // ---- transitions -----------------------------------------------------

    fn apply_advance(&mut self, outcome: Advance) {
        match outcome {
            Advance::Held => {}
            Advance::Entered { reset, .. } => {
                match reset {
                    TrackerReset::None => {}
                    TrackerReset::Stage => self.tracker.reset_stage(),
                    TrackerReset::All => self.tracker.reset_all(),
                }
                self.struggle_flagged = false;
                self.emit_stage_entered();
            }
            Advance::NextVerse => {
                let mastered = self.plan.master_and_advance();
                self.report.record_mastered(mastered);
                self.emit(TahfizEvent::VerseMastered {
                    verse: mastered,
                    timestamp: Utc::now(),
                });
                self.tracker.reset_all();
                self.struggle_flagged = false;
                self.emit_stage_entered();
            }
            Advance::LinkDrill => {
                let mastered = self.plan.master_current();
                self.report.record_mastered(mastered);
                self.emit(TahfizEvent::VerseMastered {
                    verse: mastered,
                    timestamp: Utc::now(),
                });
                self.emit_stage_entered();
                self.enter_link_drill();
            }
        }
    }

    fn enter_link_drill(&mut self) {
        let drill = LinkDrill::new(
            &self.plan.mastered_texts(),
            self.config.link_word_count,
            self.config.link_similarity,
            self.config.link_word_accuracy,
            self.config.link_required_perfect,
        );

        self.emit(TahfizEvent::LinkDrillStarted {
            total_pairs: drill.total_pairs(),
            timestamp: Utc::now(),
        });
        for skipped in drill.skipped() {
            warn!(
                leading = %skipped.leading,
                following = %skipped.following,
                reason = %skipped.reason,
                "link pair skipped"
            );
            self.emit(TahfizEvent::LinkPairSkipped {
                leading: skipped.leading,
                following: skipped.following,
                reason: skipped.reason.clone(),
                timestamp: Utc::now(),
            });
        }

        let empty = drill.is_complete();
        self.drill = Some(drill);
        if empty {
            self.complete_session();
        } else {
            self.emit_link_pair_entered();
        }
    }

    fn complete_session(&mut self) {
        let pairs_completed = self
            .drill
            .as_ref()
            .map(|d| d.completed_pairs())
            .unwrap_or(0);
        self.emit(TahfizEvent::SessionCompleted {
            verses_mastered: self.plan.mastered_count(),
            pairs_completed,
            timestamp: Utc::now(),
        });
        self.ending = Some(Ending::Completed);
    }

    // ---- event helpers ---------------------------------------------------

    fn emit(&self, event: TahfizEvent) {
        // Nothing the engine emits is load-bearing for its own progress;
        // a missing subscriber must not stall the session
        self.bus.emit_lossy(event);
    }

    fn emit_stage_entered(&self) {
        self.emit(TahfizEvent::StageEntered {
            verse: self.plan.current_verse().reference,
            stage: self.machine.stage(),
            timestamp: Utc::now(),
        });
    }

    fn emit_link_pair_entered(&self) {
        if let Some(drill) = &self.drill {
            if let Some(pair) = drill.current_pair() {
                self.emit(TahfizEvent::LinkPairEntered {
                    leading: pair.leading,
                    following: pair.following,
                    pair_index: drill.current_index(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn progress_info(&self) -> StageProgressInfo {
        StageProgressInfo {
            stage_attempts: self.tracker.stage_attempt_count(),
            stage_successes: self.tracker.stage_successful_attempts(),
            perfect_attempts: self.tracker.perfect_attempts(),
            consecutive_perfect: self.tracker.consecutive_perfect_attempts(),
            progress: self.tracker.stage_progress(),
        }
    }
}
