//! Link drill over consecutive mastered verse pairs
//!
//! After every verse in the plan is mastered, the learner practices the
//! boundaries: the ending of each verse is played, and the beginning of the
//! next must be recited from memory. A pair completes after a configured
//! number of qualifying ("perfect") attempts; misses carry no penalty, they
//! only delay advancement. Qualifying attempts need not be consecutive.

use tahfiz_common::events::LinkProgressInfo;
use tahfiz_common::types::{VerseRef, VerseText, WordToken};

/// One boundary between two consecutively mastered verses
#[derive(Debug, Clone)]
pub struct VersePair {
    /// Verse whose ending is played as the prompt
    pub leading: VerseRef,
    /// Verse whose beginning the learner recites
    pub following: VerseRef,
    /// Tail words of the leading verse (the audio prompt)
    pub prompt_tail: Vec<WordToken>,
    /// Head words of the following verse (what is scored against)
    pub expected_head: Vec<WordToken>,
    /// Qualifying attempts recorded so far
    pub perfect_attempts: u32,
    /// Permanently true once `perfect_attempts` reaches the requirement
    pub completed: bool,
}

/// A pair dropped at construction instead of aborting the drill
#[derive(Debug, Clone)]
pub struct SkippedPair {
    pub leading: VerseRef,
    pub following: VerseRef,
    pub reason: String,
}

/// Outcome of recording one link attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkAttemptOutcome {
    /// Attempt met both the similarity and word-accuracy thresholds
    pub perfect: bool,
    /// This attempt completed the current pair
    pub pair_completed: bool,
    /// This attempt completed the last pair; the drill is done
    pub drill_completed: bool,
}

/// Iterates consecutive mastered-verse pairs until each is fluent
#[derive(Debug, Clone)]
pub struct LinkDrill {
    pairs: Vec<VersePair>,
    skipped: Vec<SkippedPair>,
    current: usize,
    similarity_threshold: f64,
    word_accuracy_threshold: f64,
    required_perfect: u32,
}

impl LinkDrill {
    /// Build the drill from mastered verses in mastery order
    ///
    /// Pairs whose prompt or expected text is missing are skipped rather
    /// than aborting the drill. Fewer than two verses yield an empty drill,
    /// which reports complete immediately.
    pub fn new(
        verses: &[VerseText],
        word_count: usize,
        similarity_threshold: f64,
        word_accuracy_threshold: f64,
        required_perfect: u32,
    ) -> Self {
        let mut pairs = Vec::new();
        let mut skipped = Vec::new();

        for window in verses.windows(2) {
            let (leading, following) = (&window[0], &window[1]);
            let prompt_tail: Vec<WordToken> = leading.tail_words(word_count).to_vec();
            let expected_head: Vec<WordToken> = following.head_words(word_count).to_vec();

            let prompt_empty = prompt_tail
                .iter()
                .all(|w| w.transliteration.trim().is_empty() && w.arabic.trim().is_empty());
            let expected_empty = expected_head
                .iter()
                .all(|w| w.transliteration.trim().is_empty() && w.arabic.trim().is_empty());

            if prompt_tail.is_empty() || prompt_empty {
                skipped.push(SkippedPair {
                    leading: leading.reference,
                    following: following.reference,
                    reason: "leading verse has no prompt text".to_string(),
                });
                continue;
            }
            if expected_head.is_empty() || expected_empty {
                skipped.push(SkippedPair {
                    leading: leading.reference,
                    following: following.reference,
                    reason: "following verse has no expected text".to_string(),
                });
                continue;
            }

            pairs.push(VersePair {
                leading: leading.reference,
                following: following.reference,
                prompt_tail,
                expected_head,
                perfect_attempts: 0,
                completed: false,
            });
        }

        Self {
            pairs,
            skipped,
            current: 0,
            similarity_threshold,
            word_accuracy_threshold,
            required_perfect,
        }
    }

    /// The pair currently being practiced, None when the drill is done
    pub fn current_pair(&self) -> Option<&VersePair> {
        self.pairs.get(self.current)
    }

    /// 0-based index of the current pair
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Record one scored attempt against the current pair
    ///
    /// An attempt qualifies iff similarity and word accuracy both meet
    /// their thresholds (inclusive). Qualifying attempts increment the
    /// pair's counter; at the requirement the pair completes permanently
    /// and the drill advances. Non-qualifying attempts change nothing.
    pub fn record_attempt(&mut self, similarity: f64, word_accuracy: f64) -> LinkAttemptOutcome {
        let required = self.required_perfect;
        let perfect = similarity >= self.similarity_threshold
            && word_accuracy >= self.word_accuracy_threshold;

        let Some(pair) = self.pairs.get_mut(self.current) else {
            return LinkAttemptOutcome {
                perfect,
                pair_completed: false,
                drill_completed: true,
            };
        };

        if !perfect {
            return LinkAttemptOutcome {
                perfect: false,
                pair_completed: false,
                drill_completed: false,
            };
        }

        pair.perfect_attempts += 1;
        if pair.perfect_attempts >= required {
            pair.completed = true;
            self.current += 1;
            LinkAttemptOutcome {
                perfect: true,
                pair_completed: true,
                drill_completed: self.current >= self.pairs.len(),
            }
        } else {
            LinkAttemptOutcome {
                perfect: true,
                pair_completed: false,
                drill_completed: false,
            }
        }
    }

    pub fn total_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn completed_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.completed).count()
    }

    /// Whether every practicable pair has completed
    pub fn is_complete(&self) -> bool {
        self.current >= self.pairs.len()
    }

    /// Drill progress; an empty drill reports 100%
    pub fn progress(&self) -> LinkProgressInfo {
        let total = self.pairs.len();
        let completed = self.completed_pairs();
        let progress = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        LinkProgressInfo {
            completed_pairs: completed,
            total_pairs: total,
            progress,
        }
    }

    /// Pairs dropped at construction
    pub fn skipped(&self) -> &[SkippedPair] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(ayah: u16, words: &[&str]) -> VerseText {
        VerseText {
            reference: VerseRef::new(1, ayah),
            words: words
                .iter()
                .map(|w| WordToken {
                    arabic: w.to_string(),
                    transliteration: w.to_string(),
                })
                .collect(),
            audio: None,
        }
    }

    fn drill(verses: &[VerseText]) -> LinkDrill {
        LinkDrill::new(verses, 3, 0.9, 0.9, 2)
    }

    fn three_verses() -> Vec<VerseText> {
        vec![
            verse(1, &["a", "b", "c", "d"]),
            verse(2, &["e", "f", "g"]),
            verse(3, &["h", "i"]),
        ]
    }

    #[test]
    fn builds_one_pair_per_boundary() {
        let d = drill(&three_verses());
        assert_eq!(d.total_pairs(), 2);
        let pair = d.current_pair().unwrap();
        assert_eq!(pair.leading, VerseRef::new(1, 1));
        assert_eq!(pair.following, VerseRef::new(1, 2));
        // Last 3 of [a b c d], first 3 of [e f g]
        assert_eq!(pair.prompt_tail.len(), 3);
        assert_eq!(pair.prompt_tail[0].transliteration, "b");
        assert_eq!(pair.expected_head.len(), 3);
        assert_eq!(pair.expected_head[0].transliteration, "e");
    }

    #[test]
    fn short_verses_contribute_every_word() {
        let d = drill(&three_verses());
        // Second pair: following verse has only two words
        let pair = &d.pairs[1];
        assert_eq!(pair.expected_head.len(), 2);
    }

    #[test]
    fn two_qualifying_attempts_complete_a_pair() {
        let mut d = drill(&three_verses());

        let outcome = d.record_attempt(0.92, 0.91);
        assert!(outcome.perfect);
        assert!(!outcome.pair_completed);
        assert_eq!(d.current_index(), 0);

        let outcome = d.record_attempt(0.93, 0.95);
        assert!(outcome.perfect);
        assert!(outcome.pair_completed);
        assert!(!outcome.drill_completed);
        assert_eq!(d.current_index(), 1);
        assert_eq!(d.completed_pairs(), 1);
        assert!(d.pairs[0].completed);
    }

    #[test]
    fn miss_after_a_perfect_keeps_the_counter() {
        let mut d = drill(&three_verses());

        assert!(d.record_attempt(0.91, 0.95).perfect);
        let outcome = d.record_attempt(0.5, 0.4);
        assert!(!outcome.perfect);
        assert!(!outcome.pair_completed);
        assert_eq!(d.current_index(), 0);
        assert_eq!(d.current_pair().unwrap().perfect_attempts, 1);
        assert!(!d.current_pair().unwrap().completed);
    }

    #[test]
    fn both_thresholds_must_hold() {
        let mut d = drill(&three_verses());
        assert!(!d.record_attempt(0.95, 0.89).perfect);
        assert!(!d.record_attempt(0.89, 0.95).perfect);
        // Thresholds are inclusive
        assert!(d.record_attempt(0.9, 0.9).perfect);
    }

    #[test]
    fn completing_the_last_pair_completes_the_drill() {
        let mut d = drill(&three_verses());
        d.record_attempt(1.0, 1.0);
        d.record_attempt(1.0, 1.0);
        d.record_attempt(1.0, 1.0);
        let outcome = d.record_attempt(1.0, 1.0);
        assert!(outcome.pair_completed);
        assert!(outcome.drill_completed);
        assert!(d.is_complete());
        assert!(d.current_pair().is_none());
        assert_eq!(d.progress().progress, 100.0);
    }

    #[test]
    fn progress_counts_completed_pairs() {
        let mut d = drill(&three_verses());
        assert_eq!(d.progress().progress, 0.0);
        d.record_attempt(1.0, 1.0);
        d.record_attempt(1.0, 1.0);
        let p = d.progress();
        assert_eq!(p.completed_pairs, 1);
        assert_eq!(p.total_pairs, 2);
        assert_eq!(p.progress, 50.0);
    }

    #[test]
    fn fewer_than_two_verses_complete_immediately() {
        let d = drill(&[verse(1, &["a"])]);
        assert_eq!(d.total_pairs(), 0);
        assert!(d.is_complete());
        assert_eq!(d.progress().progress, 100.0);
    }

    #[test]
    fn malformed_pair_is_skipped() {
        let verses = vec![
            verse(1, &["a", "b"]),
            VerseText {
                reference: VerseRef::new(1, 2),
                words: vec![WordToken {
                    arabic: "  ".to_string(),
                    transliteration: "".to_string(),
                }],
                audio: None,
            },
            verse(3, &["c", "d"]),
        ];
        let d = drill(&verses);
        // Pair 1-2 skipped (empty expected head), pair 2-3 skipped (empty
        // prompt); the drill survives with zero practicable pairs
        assert_eq!(d.total_pairs(), 0);
        assert_eq!(d.skipped().len(), 2);
        assert!(d.is_complete());
    }
}
