//! Terminal renderer
//!
//! A plain event subscriber: it receives `TahfizEvent`s from the bus and
//! writes learner-facing text to stdout. It holds no session state beyond
//! the verse pack it looks verse text up in, and it never feeds anything
//! back into the engine. Logging goes to stderr, so stdout stays clean for
//! the learner.
//!
//! The terminal is in raw mode while the session runs, so every line ends
//! with an explicit carriage return.

use std::io::Write;

use tokio::task::JoinHandle;
use tracing::debug;

use tahfiz_common::events::{EventBus, PlaybackCue, TahfizEvent};
use tahfiz_common::types::{LearnStage, SurahText, VerseRef};

/// Spawn the renderer; it runs until the bus closes
pub fn spawn_renderer(bus: &EventBus, surah: SurahText) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        let renderer = Renderer { surah };
        loop {
            match rx.recv().await {
                Ok(event) => renderer.render(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "renderer lagged behind the event bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

struct Renderer {
    surah: SurahText,
}

impl Renderer {
    fn render(&self, event: &TahfizEvent) {
        match event {
            TahfizEvent::SessionStarted {
                surah_name,
                start_ayah,
                end_ayah,
                verse_count,
                ..
            } => {
                self.line("");
                self.line(&format!(
                    "=== {} — ayahs {}-{} ({} verses) ===",
                    surah_name, start_ayah, end_ayah, verse_count
                ));
                self.line("Space advances. q quits. Type the transliteration when prompted.");
            }
            TahfizEvent::StageEntered { verse, stage, .. } => self.stage_entered(*verse, *stage),
            TahfizEvent::PlaybackStarted { cue, .. } => {
                let what = match cue {
                    PlaybackCue::FullVerse => "reference recitation",
                    PlaybackCue::Shadow => "reference recitation (recite along)",
                    PlaybackCue::PairEnding => "ending of the previous verse",
                };
                self.line(&format!("  [playing {}...]", what));
            }
            TahfizEvent::PlaybackFinished { .. } => {}
            TahfizEvent::AttemptStarted { .. } => {
                self.line("  Recite now — type the transliteration, Enter to submit, Esc to cancel:");
            }
            TahfizEvent::AttemptScored {
                feedback, progress, ..
            } => {
                self.line(&format!("  {}", feedback.feedback));
                if !feedback.mistakes.is_empty() {
                    self.line(&format!("  Missed: {}", feedback.mistakes.join(", ")));
                    for suggestion in &feedback.suggestions {
                        self.line(&format!("    hint: {}", suggestion));
                    }
                }
                self.line(&format!(
                    "  Word accuracy {:.0}% — stage progress {:.0}% ({}/{} this stage)",
                    feedback.word_accuracy * 100.0,
                    progress.progress,
                    progress.stage_successes,
                    progress.stage_attempts,
                ));
                self.line("  Press Space to recite again.");
            }
            TahfizEvent::AttemptDiscarded { reason, .. } => {
                self.line(&format!(
                    "  Attempt not counted ({:?}). Press Space when ready.",
                    reason
                ));
            }
            TahfizEvent::StageCompleted { stage, .. } => {
                self.line(&format!("  Stage {} complete!", stage));
            }
            TahfizEvent::VerseMastered { verse, .. } => {
                self.line(&format!("*** Ayah {} mastered ***", verse));
            }
            TahfizEvent::StruggleDetected { .. } => {
                self.line("  Take your time — listen to the reference once more before retrying.");
            }
            TahfizEvent::LinkDrillStarted { total_pairs, .. } => {
                self.line("");
                self.line(&format!(
                    "=== Connecting verses: {} transitions to master ===",
                    total_pairs
                ));
            }
            TahfizEvent::LinkPairEntered {
                leading, following, ..
            } => {
                self.line(&format!(
                    "Transition {} -> {}: press Space to hear the ending, then recite the beginning of {}.",
                    leading, following, following
                ));
            }
            TahfizEvent::LinkAttemptScored {
                perfect,
                perfect_attempts,
                progress,
                ..
            } => {
                if *perfect {
                    self.line(&format!(
                        "  Fluent! ({} qualifying attempts, drill {:.0}%)",
                        perfect_attempts, progress.progress
                    ));
                } else {
                    self.line("  Not quite fluent yet — press Space to try this transition again.");
                }
            }
            TahfizEvent::LinkPairCompleted {
                leading, following, ..
            } => {
                self.line(&format!("  Transition {} -> {} mastered.", leading, following));
            }
            TahfizEvent::LinkPairSkipped {
                leading,
                following,
                reason,
                ..
            } => {
                self.line(&format!(
                    "  (Skipping transition {} -> {}: {})",
                    leading, following, reason
                ));
            }
            TahfizEvent::SessionCompleted {
                verses_mastered,
                pairs_completed,
                ..
            } => {
                self.line("");
                self.line(&format!(
                    "=== Session complete: {} verses mastered, {} transitions connected ===",
                    verses_mastered, pairs_completed
                ));
            }
            TahfizEvent::RecognitionUnavailable { message, .. } => {
                self.line(&format!(
                    "  Recognition unavailable: {}. Press Space to retry.",
                    message
                ));
            }
        }
    }

    fn stage_entered(&self, verse: VerseRef, stage: LearnStage) {
        self.line("");
        match stage {
            LearnStage::AyahIntro => {
                self.line(&format!("--- Ayah {} ---", verse));
                self.show_verse(verse);
                self.line("Press Space to hear the reference recitation.");
            }
            LearnStage::ListenShadow => {
                self.line("Recite along with the recording. Press Space when you feel ready.");
            }
            LearnStage::ReadRecite => {
                self.show_verse(verse);
                self.line("Recite while reading. Press Space to start an attempt.");
            }
            LearnStage::RecallMemory => {
                // Text is hidden in recall; only the reference is shown
                self.line(&format!(
                    "Recite ayah {} from memory. Press Space to start an attempt.",
                    verse
                ));
            }
            LearnStage::ConnectAyahs => {}
        }
    }

    fn show_verse(&self, verse: VerseRef) {
        if let Some(text) = self.surah.verse(verse.ayah) {
            self.line(&format!("  {}", text.arabic_line()));
            self.line(&format!("  {}", text.transliteration_line()));
        }
    }

    fn line(&self, text: &str) {
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "{}\r\n", text);
        let _ = stdout.flush();
    }
}
