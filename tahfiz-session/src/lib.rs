//! # Tahfiz Session Engine
//!
//! Guided verse-memorization practice: an event-driven session engine that
//! walks a learner through staged practice (listen, read-aloud, recall,
//! transition linking) for successive verses, scoring recitation attempts
//! against expected text and driving stage progression from those scores.
//!
//! The engine owns all session state and runs a single command loop;
//! recognition and reference audio are pluggable collaborators delivering
//! results onto the same channel. Session-visible changes are broadcast as
//! `TahfizEvent`s for the terminal renderer and the report writer.

pub mod audio;
pub mod error;
pub mod events;
pub mod input;
pub mod render;
pub mod report;
pub mod scoring;
pub mod session;
pub mod speech;

pub use error::{Error, Result};
pub use report::SessionReport;
pub use scoring::RecitationScorer;
pub use session::{EngineConfig, SessionEngine, StageProgressTracker};
