//! Attempt tracking within a learning stage
//!
//! `StageProgressTracker` is a pure counter struct: it knows nothing about
//! verses, stages, or recognition. The engine feeds it one outcome per
//! attempt and reads completion and progress back out. One tracker instance
//! serves one verse-learning session; stage transitions reset the
//! stage-scoped counters, verse changes reset everything.

/// Tracks repeated-attempt progress toward mastering one stage of one verse
#[derive(Debug, Clone)]
pub struct StageProgressTracker {
    /// Successful attempts required to complete a stage
    required_repetitions: u32,
    /// Word accuracy at or above which a successful attempt is perfect
    perfect_word_accuracy: f64,
    /// Stage attempts with zero successes before the learner is flagged
    struggle_attempt_threshold: u32,

    // Cross-stage totals, survive reset_stage
    attempt_count: u32,
    successful_attempts: u32,
    perfect_attempts: u32,

    // Stage-scoped counters, zeroed by reset_stage
    stage_attempt_count: u32,
    stage_successful_attempts: u32,
    consecutive_perfect_attempts: u32,
    stage_progress: f64,

    previous_word_accuracy: f64,
}

impl StageProgressTracker {
    pub fn new(
        required_repetitions: u32,
        perfect_word_accuracy: f64,
        struggle_attempt_threshold: u32,
    ) -> Self {
        Self {
            required_repetitions,
            perfect_word_accuracy,
            struggle_attempt_threshold,
            attempt_count: 0,
            successful_attempts: 0,
            perfect_attempts: 0,
            stage_attempt_count: 0,
            stage_successful_attempts: 0,
            consecutive_perfect_attempts: 0,
            stage_progress: 0.0,
            previous_word_accuracy: 0.0,
        }
    }

    /// Record one attempt outcome
    ///
    /// Counters are mutated first; `stage_progress` is recomputed from the
    /// post-increment success count. A failed attempt, or a success below
    /// the perfect threshold, breaks the consecutive-perfect streak.
    pub fn record_attempt(&mut self, successful: bool, word_accuracy: f64) {
        self.attempt_count += 1;
        self.stage_attempt_count += 1;

        if successful {
            self.successful_attempts += 1;
            self.stage_successful_attempts += 1;
            if word_accuracy >= self.perfect_word_accuracy {
                self.perfect_attempts += 1;
                self.consecutive_perfect_attempts += 1;
            } else {
                self.consecutive_perfect_attempts = 0;
            }
        } else {
            self.consecutive_perfect_attempts = 0;
        }

        self.previous_word_accuracy = word_accuracy;
        self.stage_progress = (self.stage_successful_attempts as f64
            / self.required_repetitions as f64
            * 100.0)
            .min(100.0);
    }

    /// Zero the stage-scoped counters; cross-stage totals are untouched
    pub fn reset_stage(&mut self) {
        self.stage_attempt_count = 0;
        self.stage_successful_attempts = 0;
        self.consecutive_perfect_attempts = 0;
        self.stage_progress = 0.0;
    }

    /// Zero every counter; used when moving to a new verse
    pub fn reset_all(&mut self) {
        self.attempt_count = 0;
        self.successful_attempts = 0;
        self.perfect_attempts = 0;
        self.previous_word_accuracy = 0.0;
        self.reset_stage();
    }

    /// Whether the stage has reached its required successful attempts
    ///
    /// Stays true until the next reset.
    pub fn is_stage_complete(&self) -> bool {
        self.stage_successful_attempts >= self.required_repetitions
    }

    /// Stage success percentage; zero attempts yield 0, never NaN
    pub fn success_rate(&self) -> f64 {
        if self.stage_attempt_count == 0 {
            0.0
        } else {
            self.stage_successful_attempts as f64 / self.stage_attempt_count as f64 * 100.0
        }
    }

    /// Whether the learner is struggling on this stage
    ///
    /// Display hint only; never alters stage progression.
    pub fn is_struggling(&self) -> bool {
        self.stage_attempt_count >= self.struggle_attempt_threshold
            && self.stage_successful_attempts == 0
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn successful_attempts(&self) -> u32 {
        self.successful_attempts
    }

    pub fn perfect_attempts(&self) -> u32 {
        self.perfect_attempts
    }

    pub fn consecutive_perfect_attempts(&self) -> u32 {
        self.consecutive_perfect_attempts
    }

    pub fn stage_attempt_count(&self) -> u32 {
        self.stage_attempt_count
    }

    pub fn stage_successful_attempts(&self) -> u32 {
        self.stage_successful_attempts
    }

    /// Percentage toward stage completion, clamped to [0, 100]
    pub fn stage_progress(&self) -> f64 {
        self.stage_progress
    }

    /// Word accuracy of the most recent attempt
    pub fn previous_word_accuracy(&self) -> f64 {
        self.previous_word_accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> StageProgressTracker {
        StageProgressTracker::new(3, 0.95, 5)
    }

    #[test]
    fn new_tracker_is_zeroed() {
        let t = tracker();
        assert_eq!(t.attempt_count(), 0);
        assert_eq!(t.successful_attempts(), 0);
        assert_eq!(t.stage_progress(), 0.0);
        assert!(!t.is_stage_complete());
    }

    #[test]
    fn successes_never_exceed_attempts() {
        let mut t = tracker();
        let outcomes = [
            (true, 0.96),
            (false, 0.2),
            (true, 0.5),
            (false, 0.0),
            (true, 0.99),
            (true, 1.0),
        ];
        for (successful, accuracy) in outcomes {
            t.record_attempt(successful, accuracy);
            assert!(t.successful_attempts() <= t.attempt_count());
            assert!(t.stage_successful_attempts() <= t.stage_attempt_count());
        }
    }

    #[test]
    fn spec_example_sequence() {
        let mut t = tracker();
        t.record_attempt(true, 0.96);
        t.record_attempt(false, 0.2);
        t.record_attempt(true, 0.97);
        t.record_attempt(true, 0.99);

        assert_eq!(t.stage_attempt_count(), 4);
        assert_eq!(t.stage_successful_attempts(), 3);
        assert_eq!(t.perfect_attempts(), 3);
        // Streak broken by the failure, rebuilt by the last two perfects
        assert_eq!(t.consecutive_perfect_attempts(), 2);
        assert!(t.is_stage_complete());
        assert_eq!(t.stage_progress(), 100.0);
    }

    #[test]
    fn success_below_perfect_threshold_breaks_streak() {
        let mut t = tracker();
        t.record_attempt(true, 0.99);
        t.record_attempt(true, 0.99);
        assert_eq!(t.consecutive_perfect_attempts(), 2);
        t.record_attempt(true, 0.80);
        assert_eq!(t.consecutive_perfect_attempts(), 0);
        assert_eq!(t.perfect_attempts(), 2);
        assert_eq!(t.successful_attempts(), 3);
    }

    #[test]
    fn perfect_threshold_is_inclusive() {
        let mut t = tracker();
        t.record_attempt(true, 0.95);
        assert_eq!(t.perfect_attempts(), 1);
        t.record_attempt(true, 0.9499);
        assert_eq!(t.perfect_attempts(), 1);
    }

    #[test]
    fn progress_uses_post_increment_count() {
        let mut t = tracker();
        t.record_attempt(true, 0.5);
        // 1 of 3 after this call, not 0 of 3
        assert!((t.stage_progress() - 100.0 / 3.0).abs() < 1e-9);
        t.record_attempt(true, 0.5);
        assert!((t.stage_progress() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn progress_clamps_at_100() {
        let mut t = tracker();
        for _ in 0..5 {
            t.record_attempt(true, 0.5);
        }
        assert_eq!(t.stage_progress(), 100.0);
    }

    #[test]
    fn completion_latches_until_reset() {
        let mut t = tracker();
        t.record_attempt(true, 0.5);
        t.record_attempt(true, 0.5);
        assert!(!t.is_stage_complete());
        t.record_attempt(true, 0.5);
        assert!(t.is_stage_complete());
        t.record_attempt(false, 0.0);
        assert!(t.is_stage_complete());
        t.reset_stage();
        assert!(!t.is_stage_complete());
    }

    #[test]
    fn reset_stage_preserves_totals() {
        let mut t = tracker();
        t.record_attempt(true, 0.99);
        t.record_attempt(false, 0.1);
        t.record_attempt(true, 0.97);
        t.reset_stage();

        assert_eq!(t.attempt_count(), 3);
        assert_eq!(t.successful_attempts(), 2);
        assert_eq!(t.perfect_attempts(), 2);
        assert_eq!(t.stage_attempt_count(), 0);
        assert_eq!(t.stage_successful_attempts(), 0);
        assert_eq!(t.consecutive_perfect_attempts(), 0);
        assert_eq!(t.stage_progress(), 0.0);
    }

    #[test]
    fn reset_all_zeroes_everything() {
        let mut t = tracker();
        t.record_attempt(true, 0.99);
        t.record_attempt(true, 0.99);
        t.reset_all();

        assert_eq!(t.attempt_count(), 0);
        assert_eq!(t.successful_attempts(), 0);
        assert_eq!(t.perfect_attempts(), 0);
        assert_eq!(t.stage_attempt_count(), 0);
        assert_eq!(t.previous_word_accuracy(), 0.0);
    }

    #[test]
    fn success_rate_zero_attempts_is_zero() {
        let t = tracker();
        assert_eq!(t.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_two_of_three() {
        let mut t = tracker();
        t.record_attempt(true, 0.5);
        t.record_attempt(true, 0.5);
        t.record_attempt(false, 0.0);
        assert!((t.success_rate() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn struggle_flags_at_threshold_with_no_success() {
        let mut t = tracker();
        for _ in 0..4 {
            t.record_attempt(false, 0.1);
            assert!(!t.is_struggling());
        }
        t.record_attempt(false, 0.1);
        assert!(t.is_struggling());
    }

    #[test]
    fn struggle_never_flags_after_a_success() {
        let mut t = tracker();
        t.record_attempt(true, 0.5);
        for _ in 0..10 {
            t.record_attempt(false, 0.1);
        }
        assert!(!t.is_struggling());
    }

    #[test]
    fn previous_word_accuracy_tracks_last_attempt() {
        let mut t = tracker();
        t.record_attempt(true, 0.87);
        assert_eq!(t.previous_word_accuracy(), 0.87);
        t.record_attempt(false, 0.12);
        assert_eq!(t.previous_word_accuracy(), 0.12);
    }
}
