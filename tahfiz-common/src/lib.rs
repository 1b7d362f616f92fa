//! # Tahfiz Common Library
//!
//! Shared code for the tahfiz practice engine:
//! - Verse data model (SurahText, VerseText, WordToken)
//! - Event types (TahfizEvent enum) and EventBus
//! - Global tunable parameters
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod params;
pub mod types;

pub use error::{Error, Result};
pub use types::{LearnStage, SurahText, VerseRef, VerseText, WordToken};
