//! Session plan: the ordered verses of one practice run
//!
//! Tracks the current verse, which verses have been mastered, and hands the
//! mastered sequence to the link drill at the end. The plan never mutates
//! verse text; it only moves a cursor over it.

use tahfiz_common::types::{VerseRef, VerseText};

use crate::error::{Error, Result};

/// Ordered verses for one practice session
#[derive(Debug, Clone)]
pub struct SessionPlan {
    verses: Vec<VerseText>,
    current: usize,
    mastered: Vec<VerseRef>,
}

impl SessionPlan {
    /// Build a plan over the given verses, in order
    pub fn new(verses: Vec<VerseText>) -> Result<Self> {
        if verses.is_empty() {
            return Err(Error::Session(
                "practice plan needs at least one verse".to_string(),
            ));
        }
        Ok(Self {
            verses,
            current: 0,
            mastered: Vec::new(),
        })
    }

    /// The verse currently being practiced
    pub fn current_verse(&self) -> &VerseText {
        &self.verses[self.current]
    }

    /// Whether verses remain after the current one
    pub fn has_next(&self) -> bool {
        self.current + 1 < self.verses.len()
    }

    /// Record the current verse as mastered and move to the next one
    ///
    /// Caller must check `has_next` first; mastering the last verse uses
    /// `master_current` instead.
    pub fn master_and_advance(&mut self) -> VerseRef {
        let mastered = self.master_current();
        self.current += 1;
        mastered
    }

    /// Record the current verse as mastered without moving the cursor
    ///
    /// Used on the last verse, where the session continues into the link
    /// drill rather than another verse.
    pub fn master_current(&mut self) -> VerseRef {
        let reference = self.verses[self.current].reference;
        if !self.mastered.contains(&reference) {
            self.mastered.push(reference);
        }
        reference
    }

    /// Mastered verses in mastery order, as full texts
    pub fn mastered_texts(&self) -> Vec<VerseText> {
        self.mastered
            .iter()
            .filter_map(|r| self.verses.iter().find(|v| v.reference == *r))
            .cloned()
            .collect()
    }

    pub fn mastered_count(&self) -> usize {
        self.mastered.len()
    }

    pub fn verse_count(&self) -> usize {
        self.verses.len()
    }

    /// 0-based index of the current verse
    pub fn current_index(&self) -> usize {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tahfiz_common::types::WordToken;

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

    fn plan() -> SessionPlan {
        SessionPlan::new(vec![
            verse(1, &["a", "b"]),
            verse(2, &["c", "d"]),
            verse(3, &["e", "f"]),
        ])
        .unwrap()
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(SessionPlan::new(vec![]).is_err());
    }

    #[test]
    fn starts_at_first_verse() {
        let p = plan();
        assert_eq!(p.current_verse().reference, VerseRef::new(1, 1));
        assert!(p.has_next());
        assert_eq!(p.verse_count(), 3);
        assert_eq!(p.current_index(), 0);
    }

    #[test]
    fn master_and_advance_walks_the_plan() {
        let mut p = plan();
        assert_eq!(p.master_and_advance(), VerseRef::new(1, 1));
        assert_eq!(p.current_verse().reference, VerseRef::new(1, 2));
        assert!(p.has_next());
        assert_eq!(p.master_and_advance(), VerseRef::new(1, 2));
        assert!(!p.has_next());
    }

    #[test]
    fn master_current_keeps_cursor_on_last_verse() {
        let mut p = plan();
        p.master_and_advance();
        p.master_and_advance();
        assert_eq!(p.master_current(), VerseRef::new(1, 3));
        assert_eq!(p.current_verse().reference, VerseRef::new(1, 3));
        assert_eq!(p.mastered_count(), 3);
    }

    #[test]
    fn mastering_twice_records_once() {
        let mut p = plan();
        p.master_and_advance();
        p.master_and_advance();
        p.master_current();
        p.master_current();
        assert_eq!(p.mastered_count(), 3);
    }

    #[test]
    fn mastered_texts_preserve_order() {
        let mut p = plan();
        p.master_and_advance();
        p.master_and_advance();
        p.master_current();
        let texts = p.mastered_texts();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].reference, VerseRef::new(1, 1));
        assert_eq!(texts[2].reference, VerseRef::new(1, 3));
    }
}
