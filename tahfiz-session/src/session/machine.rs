//! Stage state machine
//!
//! One closed enum of stages, one `advance()` entry point, one explicit
//! transition table. The machine decides *where* the session goes and which
//! tracker reset applies; the engine executes the side effects (resets,
//! verse advancement, events). No transition is reversible.

use tahfiz_common::types::LearnStage;

/// Gate inputs consulted by the transition table
///
/// The engine computes these from its own state at the moment of the
/// advance request; the machine holds no counters of its own.
#[derive(Debug, Clone, Copy)]
pub struct GateInputs {
    /// Learner confirmed readiness (key press after the reference audio)
    pub ready: bool,
    /// The stage tracker reached its required successful attempts
    pub stage_complete: bool,
    /// Verses remain after the current one
    pub more_verses: bool,
}

/// Which tracker reset the engine must apply for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerReset {
    None,
    Stage,
    All,
}

/// Outcome of one advance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Gate not satisfied; the machine stays in place
    Held,
    /// Entered a new stage on the same verse
    Entered {
        stage: LearnStage,
        reset: TrackerReset,
    },
    /// Recall passed with verses remaining: verse mastered, next verse's
    /// intro entered, full tracker reset
    NextVerse,
    /// Recall passed on the last verse: verse mastered, link drill entered,
    /// no tracker reset (the drill owns its own counters)
    LinkDrill,
}

/// The per-verse stage sequence with its terminal fan-out
#[derive(Debug, Clone)]
pub struct StageMachine {
    stage: LearnStage,
}

impl StageMachine {
    pub fn new() -> Self {
        Self {
            stage: LearnStage::AyahIntro,
        }
    }

    pub fn stage(&self) -> LearnStage {
        self.stage
    }

    /// Apply the transition table for the current stage
    ///
    /// - AyahIntro -> ListenShadow: always allowed (user-initiated)
    /// - ListenShadow -> ReadRecite: requires ready confirmation; stage reset
    /// - ReadRecite -> RecallMemory: requires stage completion; stage reset
    /// - RecallMemory -> next verse's AyahIntro (full reset) when verses
    ///   remain, else ConnectAyahs (no reset)
    /// - ConnectAyahs: terminal; the link drill owns progression
    pub fn advance(&mut self, gates: GateInputs) -> Advance {
        let outcome = match self.stage {
            LearnStage::AyahIntro => Advance::Entered {
                stage: LearnStage::ListenShadow,
                reset: TrackerReset::None,
            },
            LearnStage::ListenShadow => {
                if gates.ready {
                    Advance::Entered {
                        stage: LearnStage::ReadRecite,
                        reset: TrackerReset::Stage,
                    }
                } else {
                    Advance::Held
                }
            }
            LearnStage::ReadRecite => {
                if gates.stage_complete {
                    Advance::Entered {
                        stage: LearnStage::RecallMemory,
                        reset: TrackerReset::Stage,
                    }
                } else {
                    Advance::Held
                }
            }
            LearnStage::RecallMemory => {
                if !gates.stage_complete {
                    Advance::Held
                } else if gates.more_verses {
                    Advance::NextVerse
                } else {
                    Advance::LinkDrill
                }
            }
            LearnStage::ConnectAyahs => Advance::Held,
        };

        match outcome {
            Advance::Entered { stage, .. } => self.stage = stage,
            Advance::NextVerse => self.stage = LearnStage::AyahIntro,
            Advance::LinkDrill => self.stage = LearnStage::ConnectAyahs,
            Advance::Held => {}
        }
        outcome
    }
}

impl Default for StageMachine {
    fn default() -> Self {
        Self::new()
    }
}
