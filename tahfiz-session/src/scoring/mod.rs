//! Recitation scoring: normalization, word alignment, quality tiers

pub mod normalize;
pub mod scorer;

pub use scorer::{AttemptScore, RecitationScorer};
