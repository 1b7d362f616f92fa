//! Recitation scoring
//!
//! Scores a recognition transcript against the expected verse words and
//! produces the structured feedback carried on `AttemptScored` events.
//!
//! Two metrics come out of every attempt:
//! - `similarity`: normalized Levenshtein distance over the normalized
//!   joined texts, in [0, 1]
//! - `word_accuracy`: fraction of expected words matched by the alignment,
//!   in [0, 1]
//!
//! Alignment is a longest-common-subsequence over normalized words, where
//! two words match if they are equal after normalization or within a
//! per-word fuzzy threshold. The fuzzy tolerance absorbs transliteration
//! variants ("rahman" vs "rahmaan") without letting unrelated words pair up.

use tahfiz_common::events::{DetailedFeedback, QualityTier};

use super::normalize::{normalize_line, normalize_word, normalize_words};

/// Metrics for one scored attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptScore {
    /// Normalized closeness of transcript to expected text, in [0, 1]
    pub similarity: f64,
    /// Fraction of expected words matched, in [0, 1]
    pub word_accuracy: f64,
}

/// Scores transcripts against expected verse words
#[derive(Debug, Clone)]
pub struct RecitationScorer {
    /// Per-word similarity at or above which aligned words count as matched
    word_match_threshold: f64,
}

impl RecitationScorer {
    pub fn new(word_match_threshold: f64) -> Self {
        Self {
            word_match_threshold,
        }
    }

    /// Score a transcript against the expected words
    ///
    /// An empty expected sequence yields zero accuracy rather than an
    /// error; verse pack validation prevents it upstream.
    pub fn score(&self, transcript: &str, expected_words: &[&str]) -> AttemptScore {
        let spoken = normalize_words(transcript);
        let expected: Vec<String> = expected_words.iter().map(|w| normalize_word(w)).collect();

        let matched = self
            .align(&spoken, &expected)
            .iter()
            .filter(|m| m.is_some())
            .count();
        let word_accuracy = if expected.is_empty() {
            0.0
        } else {
            matched as f64 / expected.len() as f64
        };

        let expected_line = expected.join(" ");
        let spoken_line = normalize_line(transcript);
        let similarity = strsim::normalized_levenshtein(&spoken_line, &expected_line);

        AttemptScore {
            similarity,
            word_accuracy,
        }
    }

    /// Classify a similarity score into its quality tier
    ///
    /// Tier boundaries are inclusive at the upper bound: exactly 0.95 is
    /// perfect, exactly 0.80 is great.
    pub fn classify(&self, similarity: f64) -> QualityTier {
        QualityTier::from_similarity(similarity)
    }

    /// Build structured feedback for one attempt
    ///
    /// `correct_words` and `mistakes` carry the expected words in their
    /// original (un-normalized) form so the renderer can show them as the
    /// learner knows them. Suggestions pair each mistake with the nearest
    /// unmatched transcript word when one is plausibly an attempt at it.
    pub fn detailed_feedback(&self, transcript: &str, expected_words: &[&str]) -> DetailedFeedback {
        let spoken = normalize_words(transcript);
        let expected: Vec<String> = expected_words.iter().map(|w| normalize_word(w)).collect();
        let alignment = self.align(&spoken, &expected);

        let mut correct_words = Vec::new();
        let mut mistakes = Vec::new();
        let mut suggestions = Vec::new();

        let mut spoken_used = vec![false; spoken.len()];
        for matched in alignment.iter().flatten() {
            spoken_used[*matched] = true;
        }

        for (i, matched) in alignment.iter().enumerate() {
            if matched.is_some() {
                correct_words.push(expected_words[i].to_string());
            } else {
                let expected_word = expected_words[i];
                mistakes.push(expected_word.to_string());
                suggestions.push(self.suggestion_for(expected_word, &expected[i], &spoken, &spoken_used));
            }
        }

        let matched = correct_words.len();
        let word_accuracy = if expected.is_empty() {
            0.0
        } else {
            matched as f64 / expected.len() as f64
        };

        let expected_line = expected.join(" ");
        let spoken_line = normalize_line(transcript);
        let similarity = strsim::normalized_levenshtein(&spoken_line, &expected_line);

        DetailedFeedback {
            feedback: QualityTier::from_similarity(similarity).message().to_string(),
            mistakes,
            suggestions,
            correct_words,
            word_accuracy,
        }
    }

    /// Whether two normalized words count as the same word
    fn words_match(&self, a: &str, b: &str) -> bool {
        a == b || strsim::normalized_levenshtein(a, b) >= self.word_match_threshold
    }

    /// Longest-common-subsequence alignment of spoken onto expected words
    ///
    /// Returns, for each expected index, the index of the spoken word
    /// matched to it (or None). Order is preserved: a spoken word can only
    /// match an expected word that follows its predecessor's match.
    fn align(&self, spoken: &[String], expected: &[String]) -> Vec<Option<usize>> {
        let n = spoken.len();
        let m = expected.len();

        // dp[i][j] = best match count aligning spoken[i..] with expected[j..]
        let mut dp = vec![vec![0u32; m + 1]; n + 1];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                dp[i][j] = if self.words_match(&spoken[i], &expected[j]) {
                    dp[i + 1][j + 1] + 1
                } else {
                    dp[i + 1][j].max(dp[i][j + 1])
                };
            }
        }

        let mut result = vec![None; m];
        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            if self.words_match(&spoken[i], &expected[j]) && dp[i][j] == dp[i + 1][j + 1] + 1 {
                result[j] = Some(i);
                i += 1;
                j += 1;
            } else if dp[i + 1][j] >= dp[i][j + 1] {
                i += 1;
            } else {
                j += 1;
            }
        }
        result
    }

    /// Hint text for one missed expected word
    fn suggestion_for(
        &self,
        expected_original: &str,
        expected_normalized: &str,
        spoken: &[String],
        spoken_used: &[bool],
    ) -> String {
        // Nearest unmatched spoken word, if it is plausibly an attempt at
        // this one (half the match threshold keeps unrelated words out)
        let near_miss = spoken
            .iter()
            .zip(spoken_used.iter())
            .filter(|(_, used)| !**used)
            .map(|(word, _)| {
                (
                    word,
                    strsim::normalized_levenshtein(word, expected_normalized),
                )
            })
            .filter(|(_, sim)| *sim >= self.word_match_threshold / 2.0)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        match near_miss {
            Some((word, _)) => format!(
                "'{}' sounded like '{}'; listen to the reference pronunciation again",
                expected_original, word
            ),
            None => format!(
                "'{}' was missed; listen for it in the reference recording",
                expected_original
            ),
        }
    }
}
