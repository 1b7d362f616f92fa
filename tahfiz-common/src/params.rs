//! Global parameter management
//!
//! Centralized singleton for all practice tunables.
//! Read-frequently, write-rarely access pattern using RwLock.
//!
//! # Usage
//!
//! ```rust
//! use tahfiz_common::params::PARAMS;
//!
//! // Read (fast, uncontended)
//! let required = *PARAMS.required_repetitions.read().unwrap();
//!
//! // Write (rare, initialization only)
//! *PARAMS.required_repetitions.write().unwrap() = 5;
//! ```

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::config::PracticeSection;

/// Global parameters singleton
///
/// Initialized once from the config file, accessed everywhere.
/// Read-frequently (scoring hot path), write-rarely (startup only).
pub static PARAMS: Lazy<GlobalParams> = Lazy::new(GlobalParams::default);

/// Global parameter storage
///
/// All parameters stored with RwLock for thread-safe access.
/// Readers don't block each other (shared read lock).
pub struct GlobalParams {
    /// Successful attempts required to complete a scored stage
    ///
    /// Valid range: [1, 10]
    /// Default: 3
    /// Applies to read-recite and recall-memory
    pub required_repetitions: RwLock<u32>,

    /// Word accuracy at or above which a successful attempt counts as perfect
    ///
    /// Valid range: [0.5, 1.0]
    /// Default: 0.95
    /// Drives the perfect and consecutive-perfect counters
    pub perfect_word_accuracy: RwLock<f64>,

    /// Similarity at or above which an attempt counts as successful
    ///
    /// Valid range: [0.0, 1.0]
    /// Default: 0.6
    /// Floor of the "good" quality tier
    pub success_similarity: RwLock<f64>,

    /// Similarity a link attempt must reach to qualify as perfect
    ///
    /// Valid range: [0.5, 1.0]
    /// Default: 0.9
    /// Both this and link_word_accuracy must hold
    pub link_similarity: RwLock<f64>,

    /// Word accuracy a link attempt must reach to qualify as perfect
    ///
    /// Valid range: [0.5, 1.0]
    /// Default: 0.9
    /// Both this and link_similarity must hold
    pub link_word_accuracy: RwLock<f64>,

    /// Qualifying attempts required to complete a link pair
    ///
    /// Valid range: [1, 10]
    /// Default: 2
    /// Attempts need not be consecutive; misses carry no penalty
    pub link_required_perfect: RwLock<u32>,

    /// Words taken from verse endings and beginnings for the link drill
    ///
    /// Valid range: [1, 10]
    /// Default: 3
    /// Shorter verses contribute every word they have
    pub link_word_count: RwLock<usize>,

    /// Stage attempts with zero successes before the learner is flagged
    ///
    /// Valid range: [1, 100]
    /// Default: 5
    /// Display hint only; never alters stage progression
    pub struggle_attempt_threshold: RwLock<u32>,

    /// Per-word similarity at or above which an aligned word counts as matched
    ///
    /// Valid range: [0.5, 1.0]
    /// Default: 0.8
    /// Used by transcript alignment to tolerate transliteration variants
    pub word_match_threshold: RwLock<f64>,

    /// Simulated reference audio pacing
    ///
    /// Valid range: [50, 5000] ms per word
    /// Default: 600 ms
    /// Playback duration is word_count x this value
    pub playback_ms_per_word: RwLock<u64>,

    /// Event bus channel capacity
    ///
    /// Valid range: [8, 10000]
    /// Default: 1000
    /// Events beyond capacity overwrite the oldest unread ones
    pub event_bus_capacity: RwLock<usize>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            required_repetitions: RwLock::new(3),
            perfect_word_accuracy: RwLock::new(0.95),
            success_similarity: RwLock::new(0.6),
            link_similarity: RwLock::new(0.9),
            link_word_accuracy: RwLock::new(0.9),
            link_required_perfect: RwLock::new(2),
            link_word_count: RwLock::new(3),
            struggle_attempt_threshold: RwLock::new(5),
            word_match_threshold: RwLock::new(0.8),
            playback_ms_per_word: RwLock::new(600),
            event_bus_capacity: RwLock::new(1000),
        }
    }
}

/// Metadata for a single GlobalParams parameter
///
/// Encapsulates a parameter's validation logic so range checking lives in
/// one place, shared by the setters and by config application.
///
/// # Validator Closure Signature
///
/// All validators have signature `fn(&str) -> Result<(), String>` and
/// report errors as `"{param_name}: {specific_reason}"`.
pub struct ParamMetadata {
    pub key: &'static str,
    pub data_type: &'static str,
    pub default_value: &'static str,
    pub description: &'static str,
    pub validation_range: &'static str,
    pub validator: fn(&str) -> Result<(), String>,
}

impl GlobalParams {
    /// Get metadata for all config-backed parameters
    ///
    /// Single source of truth for parameter names, defaults, ranges, and
    /// validation logic.
    pub fn metadata() -> &'static [ParamMetadata] {
        &[
            ParamMetadata {
                key: "required_repetitions",
                data_type: "u32",
                default_value: "3",
                description: "Successful attempts required to complete a scored stage",
                validation_range: "1-10",
                validator: |s| {
                    let v: u32 = s
                        .parse()
                        .map_err(|_| "required_repetitions: invalid number format".to_string())?;
                    if !(1..=10).contains(&v) {
                        return Err(format!(
                            "required_repetitions: value {} out of range [1, 10]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "perfect_word_accuracy",
                data_type: "f64",
                default_value: "0.95",
                description: "Word accuracy for a successful attempt to count as perfect",
                validation_range: "0.5-1.0",
                validator: |s| {
                    let v: f64 = s
                        .parse()
                        .map_err(|_| "perfect_word_accuracy: invalid number format".to_string())?;
                    if !(0.5..=1.0).contains(&v) {
                        return Err(format!(
                            "perfect_word_accuracy: value {} out of range [0.5, 1.0]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "success_similarity",
                data_type: "f64",
                default_value: "0.6",
                description: "Similarity for an attempt to count as successful",
                validation_range: "0.0-1.0",
                validator: |s| {
                    let v: f64 = s
                        .parse()
                        .map_err(|_| "success_similarity: invalid number format".to_string())?;
                    if !(0.0..=1.0).contains(&v) {
                        return Err(format!(
                            "success_similarity: value {} out of range [0.0, 1.0]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "link_similarity",
                data_type: "f64",
                default_value: "0.9",
                description: "Similarity for a link attempt to qualify as perfect",
                validation_range: "0.5-1.0",
                validator: |s| {
                    let v: f64 = s
                        .parse()
                        .map_err(|_| "link_similarity: invalid number format".to_string())?;
                    if !(0.5..=1.0).contains(&v) {
                        return Err(format!(
                            "link_similarity: value {} out of range [0.5, 1.0]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "link_word_accuracy",
                data_type: "f64",
                default_value: "0.9",
                description: "Word accuracy for a link attempt to qualify as perfect",
                validation_range: "0.5-1.0",
                validator: |s| {
                    let v: f64 = s
                        .parse()
                        .map_err(|_| "link_word_accuracy: invalid number format".to_string())?;
                    if !(0.5..=1.0).contains(&v) {
                        return Err(format!(
                            "link_word_accuracy: value {} out of range [0.5, 1.0]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "link_required_perfect",
                data_type: "u32",
                default_value: "2",
                description: "Qualifying attempts required to complete a link pair",
                validation_range: "1-10",
                validator: |s| {
                    let v: u32 = s
                        .parse()
                        .map_err(|_| "link_required_perfect: invalid number format".to_string())?;
                    if !(1..=10).contains(&v) {
                        return Err(format!(
                            "link_required_perfect: value {} out of range [1, 10]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "link_word_count",
                data_type: "usize",
                default_value: "3",
                description: "Words taken from verse endings and beginnings for the link drill",
                validation_range: "1-10",
                validator: |s| {
                    let v: usize = s
                        .parse()
                        .map_err(|_| "link_word_count: invalid number format".to_string())?;
                    if !(1..=10).contains(&v) {
                        return Err(format!("link_word_count: value {} out of range [1, 10]", v));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "struggle_attempt_threshold",
                data_type: "u32",
                default_value: "5",
                description: "Stage attempts with zero successes before the learner is flagged",
                validation_range: "1-100",
                validator: |s| {
                    let v: u32 = s.parse().map_err(|_| {
                        "struggle_attempt_threshold: invalid number format".to_string()
                    })?;
                    if !(1..=100).contains(&v) {
                        return Err(format!(
                            "struggle_attempt_threshold: value {} out of range [1, 100]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "word_match_threshold",
                data_type: "f64",
                default_value: "0.8",
                description: "Per-word similarity for an aligned word to count as matched",
                validation_range: "0.5-1.0",
                validator: |s| {
                    let v: f64 = s
                        .parse()
                        .map_err(|_| "word_match_threshold: invalid number format".to_string())?;
                    if !(0.5..=1.0).contains(&v) {
                        return Err(format!(
                            "word_match_threshold: value {} out of range [0.5, 1.0]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "playback_ms_per_word",
                data_type: "u64",
                default_value: "600",
                description: "Simulated reference audio pacing (ms per word)",
                validation_range: "50-5000",
                validator: |s| {
                    let v: u64 = s
                        .parse()
                        .map_err(|_| "playback_ms_per_word: invalid number format".to_string())?;
                    if !(50..=5000).contains(&v) {
                        return Err(format!(
                            "playback_ms_per_word: value {} out of range [50, 5000]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "event_bus_capacity",
                data_type: "usize",
                default_value: "1000",
                description: "Event bus channel capacity",
                validation_range: "8-10000",
                validator: |s| {
                    let v: usize = s
                        .parse()
                        .map_err(|_| "event_bus_capacity: invalid number format".to_string())?;
                    if !(8..=10000).contains(&v) {
                        return Err(format!(
                            "event_bus_capacity: value {} out of range [8, 10000]",
                            v
                        ));
                    }
                    Ok(())
                },
            },
        ]
    }
}

impl GlobalParams {
    /// Apply the `[practice]` section of a loaded config file
    ///
    /// Error handling policy:
    /// 1. Field absent: keep built-in default, continue
    /// 2. Out of range: log WARN, keep built-in default, continue
    /// 3. Fields are applied independently (no fail-fast)
    pub fn apply_config(&self, practice: &PracticeSection) {
        use tracing::warn;

        if let Some(v) = practice.required_repetitions {
            if let Err(e) = self.set_required_repetitions(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.perfect_word_accuracy {
            if let Err(e) = self.set_perfect_word_accuracy(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.success_similarity {
            if let Err(e) = self.set_success_similarity(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.link_similarity {
            if let Err(e) = self.set_link_similarity(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.link_word_accuracy {
            if let Err(e) = self.set_link_word_accuracy(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.link_required_perfect {
            if let Err(e) = self.set_link_required_perfect(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.link_word_count {
            if let Err(e) = self.set_link_word_count(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.struggle_attempt_threshold {
            if let Err(e) = self.set_struggle_attempt_threshold(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.word_match_threshold {
            if let Err(e) = self.set_word_match_threshold(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.playback_ms_per_word {
            if let Err(e) = self.set_playback_ms_per_word(v) {
                warn!("{}, keeping default", e);
            }
        }
        if let Some(v) = practice.event_bus_capacity {
            if let Err(e) = self.set_event_bus_capacity(v) {
                warn!("{}, keeping default", e);
            }
        }
    }

    /// Validate and update required_repetitions
    pub fn set_required_repetitions(&self, value: u32) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "required_repetitions")
            .expect("required_repetitions metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.required_repetitions.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update perfect_word_accuracy
    pub fn set_perfect_word_accuracy(&self, value: f64) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "perfect_word_accuracy")
            .expect("perfect_word_accuracy metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.perfect_word_accuracy.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update success_similarity
    pub fn set_success_similarity(&self, value: f64) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "success_similarity")
            .expect("success_similarity metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.success_similarity.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update link_similarity
    pub fn set_link_similarity(&self, value: f64) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "link_similarity")
            .expect("link_similarity metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.link_similarity.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update link_word_accuracy
    pub fn set_link_word_accuracy(&self, value: f64) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "link_word_accuracy")
            .expect("link_word_accuracy metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.link_word_accuracy.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update link_required_perfect
    pub fn set_link_required_perfect(&self, value: u32) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "link_required_perfect")
            .expect("link_required_perfect metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.link_required_perfect.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update link_word_count
    pub fn set_link_word_count(&self, value: usize) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "link_word_count")
            .expect("link_word_count metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.link_word_count.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update struggle_attempt_threshold
    pub fn set_struggle_attempt_threshold(&self, value: u32) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "struggle_attempt_threshold")
            .expect("struggle_attempt_threshold metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.struggle_attempt_threshold.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update word_match_threshold
    pub fn set_word_match_threshold(&self, value: f64) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "word_match_threshold")
            .expect("word_match_threshold metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.word_match_threshold.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update playback_ms_per_word
    pub fn set_playback_ms_per_word(&self, value: u64) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "playback_ms_per_word")
            .expect("playback_ms_per_word metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.playback_ms_per_word.write().unwrap() = value;
        Ok(())
    }

    /// Validate and update event_bus_capacity
    pub fn set_event_bus_capacity(&self, value: usize) -> Result<(), String> {
        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == "event_bus_capacity")
            .expect("event_bus_capacity metadata must exist");

        (meta.validator)(&value.to_string())?;

        *self.event_bus_capacity.write().unwrap() = value;
        Ok(())
    }
}
