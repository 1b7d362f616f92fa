//! Session orchestration: plan, stage machine, tracker, link drill, engine

pub mod drill;
pub mod engine;
pub mod machine;
pub mod plan;
pub mod tracker;

pub use drill::{LinkAttemptOutcome, LinkDrill, VersePair};
pub use engine::{EngineConfig, SessionEngine};
pub use machine::{Advance, GateInputs, StageMachine, TrackerReset};
pub use plan::SessionPlan;
pub use tracker::StageProgressTracker;
