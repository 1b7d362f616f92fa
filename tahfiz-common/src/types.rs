//! Verse data model shared across the tahfiz crates
//!
//! Verse packs are TOML files holding one surah's text as word tokens
//! (Arabic script plus Latin transliteration). Everything downstream
//! works on these tokens; the core never parses Arabic itself.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Position of a single verse: surah and ayah number, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseRef {
    pub surah: u16,
    pub ayah: u16,
}

impl VerseRef {
    pub fn new(surah: u16, ayah: u16) -> Self {
        Self { surah, ayah }
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

/// One word of a verse in both scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordToken {
    /// Arabic script form, may carry diacritics
    pub arabic: String,
    /// Latin transliteration, the form typed recitation is scored against
    pub transliteration: String,
}

/// A single verse with its word tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseText {
    pub reference: VerseRef,
    pub words: Vec<WordToken>,
    /// Optional reference recording hint (file name or URL)
    pub audio: Option<String>,
}

impl VerseText {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Arabic line, tokens joined with single spaces
    pub fn arabic_line(&self) -> String {
        self.words
            .iter()
            .map(|w| w.arabic.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Transliteration line, tokens joined with single spaces
    pub fn transliteration_line(&self) -> String {
        self.words
            .iter()
            .map(|w| w.transliteration.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Last `n` words of the verse (the whole verse when shorter)
    pub fn tail_words(&self, n: usize) -> &[WordToken] {
        let start = self.words.len().saturating_sub(n);
        &self.words[start..]
    }

    /// First `n` words of the verse (the whole verse when shorter)
    pub fn head_words(&self, n: usize) -> &[WordToken] {
        let end = n.min(self.words.len());
        &self.words[..end]
    }
}

/// TOML shape of a verse pack file
#[derive(Debug, Deserialize)]
struct PackFile {
    name: String,
    surah: u16,
    #[serde(default)]
    verses: Vec<PackVerse>,
}

#[derive(Debug, Deserialize)]
struct PackVerse {
    ayah: u16,
    #[serde(default)]
    audio: Option<String>,
    words: Vec<WordToken>,
}

/// A surah's verses as loaded from a verse pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurahText {
    pub name: String,
    pub number: u16,
    pub verses: Vec<VerseText>,
}

impl SurahText {
    /// Parse a TOML verse pack
    ///
    /// Verses must be listed in strictly ascending ayah order and every
    /// verse must carry at least one word token with some text in it.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let pack: PackFile = toml::from_str(input)
            .map_err(|e| Error::VersePack(format!("invalid verse pack: {}", e)))?;

        if pack.surah == 0 {
            return Err(Error::VersePack("surah number must be 1 or greater".to_string()));
        }

        let mut verses = Vec::with_capacity(pack.verses.len());
        let mut last_ayah = 0u16;
        for verse in pack.verses {
            if verse.ayah <= last_ayah {
                return Err(Error::VersePack(format!(
                    "ayah numbers must be strictly ascending (saw {} after {})",
                    verse.ayah, last_ayah
                )));
            }
            if verse.words.is_empty() {
                return Err(Error::VersePack(format!("ayah {} has no words", verse.ayah)));
            }
            if verse
                .words
                .iter()
                .any(|w| w.arabic.trim().is_empty() && w.transliteration.trim().is_empty())
            {
                return Err(Error::VersePack(format!("ayah {} has an empty word token", verse.ayah)));
            }
            last_ayah = verse.ayah;
            verses.push(VerseText {
                reference: VerseRef::new(pack.surah, verse.ayah),
                words: verse.words,
                audio: verse.audio,
            });
        }

        Ok(Self {
            name: pack.name,
            number: pack.surah,
            verses,
        })
    }

    /// Load a verse pack from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::VersePack(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Verses within the inclusive ayah range, in pack order
    pub fn range(&self, start_ayah: u16, end_ayah: u16) -> Vec<VerseText> {
        self.verses
            .iter()
            .filter(|v| v.reference.ayah >= start_ayah && v.reference.ayah <= end_ayah)
            .cloned()
            .collect()
    }

    /// Look up a single verse by ayah number
    pub fn verse(&self, ayah: u16) -> Option<&VerseText> {
        self.verses.iter().find(|v| v.reference.ayah == ayah)
    }
}

/// The five practice stages a learner moves through
///
/// Stages are sequential with no branching except the terminal fan-out:
/// after the last verse's recall, the session moves to `ConnectAyahs`
/// instead of the next verse's intro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearnStage {
    /// Verse is shown and the reference recording introduces it
    AyahIntro,
    /// Learner recites along with the reference recording
    ListenShadow,
    /// Learner recites while reading the text; attempts are scored
    ReadRecite,
    /// Learner recites from memory with the text hidden; attempts are scored
    RecallMemory,
    /// Link drill over consecutive mastered verse pairs
    ConnectAyahs,
}

impl LearnStage {
    /// Stages whose attempts are scored against expected text
    pub fn is_scored(&self) -> bool {
        matches!(
            self,
            LearnStage::ReadRecite | LearnStage::RecallMemory | LearnStage::ConnectAyahs
        )
    }

    /// Stages that play the reference recording before input is accepted
    pub fn plays_audio(&self) -> bool {
        matches!(self, LearnStage::AyahIntro | LearnStage::ListenShadow)
    }
}

impl std::fmt::Display for LearnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LearnStage::AyahIntro => "ayah-intro",
            LearnStage::ListenShadow => "listen-shadow",
            LearnStage::ReadRecite => "read-recite",
            LearnStage::RecallMemory => "recall-memory",
            LearnStage::ConnectAyahs => "connect-ayahs",
        };
        write!(f, "{}", name)
    }
}
