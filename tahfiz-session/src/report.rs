//! Session report
//!
//! Aggregate outcomes of one practice session, written as JSON when the
//! session ends (completed or quit). Only aggregates are kept; individual
//! attempts are never persisted.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tahfiz_common::types::VerseRef;

use crate::error::{Error, Result};

/// Aggregate counters for one verse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerseOutcome {
    pub verse: VerseRef,
    /// Attempts across all scored stages of this verse
    pub attempts: u32,
    pub successes: u32,
    pub perfect_attempts: u32,
    pub mastered: bool,
}

/// Aggregate counters for the link drill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSummary {
    pub total_pairs: usize,
    pub completed_pairs: usize,
    pub skipped_pairs: usize,
    pub attempts: u32,
}

/// Everything the session leaves behind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub surah: u16,
    pub surah_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub verses: Vec<VerseOutcome>,
    /// Absent when the session ended before the link drill
    pub link: Option<LinkSummary>,
    /// False when the learner quit before finishing
    pub completed: bool,
}

impl SessionReport {
    /// Write the report as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Report(format!("cannot serialize report: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn verses_mastered(&self) -> usize {
        self.verses.iter().filter(|v| v.mastered).count()
    }
}

/// Accumulates outcomes while the session runs
#[derive(Debug)]
pub struct ReportBuilder {
    session_id: Uuid,
    surah: u16,
    surah_name: String,
    started_at: DateTime<Utc>,
    verses: Vec<VerseOutcome>,
    link: Option<LinkSummary>,
}

impl ReportBuilder {
    pub fn new(surah: u16, surah_name: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            surah,
            surah_name: surah_name.to_string(),
            started_at: Utc::now(),
            verses: Vec::new(),
            link: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn verse_entry(&mut self, verse: VerseRef) -> &mut VerseOutcome {
        if let Some(i) = self.verses.iter().position(|v| v.verse == verse) {
            &mut self.verses[i]
        } else {
            self.verses.push(VerseOutcome {
                verse,
                attempts: 0,
                successes: 0,
                perfect_attempts: 0,
                mastered: false,
            });
            self.verses.last_mut().expect("just pushed")
        }
    }

    /// Record one scored attempt against a verse
    pub fn record_attempt(&mut self, verse: VerseRef, successful: bool, perfect: bool) {
        let entry = self.verse_entry(verse);
        entry.attempts += 1;
        if successful {
            entry.successes += 1;
        }
        if perfect {
            entry.perfect_attempts += 1;
        }
    }

    /// Record a verse as mastered
    pub fn record_mastered(&mut self, verse: VerseRef) {
        self.verse_entry(verse).mastered = true;
    }

    /// Record one link drill attempt
    pub fn record_link_attempt(&mut self) {
        let link = self.link.get_or_insert(LinkSummary {
            total_pairs: 0,
            completed_pairs: 0,
            skipped_pairs: 0,
            attempts: 0,
        });
        link.attempts += 1;
    }

    /// Record the link drill's pair totals
    pub fn record_link_summary(
        &mut self,
        total_pairs: usize,
        completed_pairs: usize,
        skipped_pairs: usize,
    ) {
        let attempts = self.link.as_ref().map(|l| l.attempts).unwrap_or(0);
        self.link = Some(LinkSummary {
            total_pairs,
            completed_pairs,
            skipped_pairs,
            attempts,
        });
    }

    /// Close the report
    pub fn finish(self, completed: bool) -> SessionReport {
        SessionReport {
            session_id: self.session_id,
            surah: self.surah,
            surah_name: self.surah_name,
            started_at: self.started_at,
            finished_at: Utc::now(),
            verses: self.verses,
            link: self.link,
            completed,
        }
    }
}
