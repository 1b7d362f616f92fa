//! Shared test infrastructure for the session integration suites
//!
//! Builds engines over scripted collaborators: `ScriptedRecognition`
//! replays canned outcomes in place of typed input and `InstantAudio`
//! completes every playback immediately, so the suites drive a whole
//! session without timers or a terminal.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use tahfiz_common::events::{EventBus, TahfizEvent};
use tahfiz_common::types::{SurahText, VerseRef, VerseText, WordToken};
use tahfiz_session::audio::InstantAudio;
use tahfiz_session::events::{EngineCommand, RecognitionOutcome};
use tahfiz_session::report::SessionReport;
use tahfiz_session::session::{EngineConfig, SessionEngine};
use tahfiz_session::speech::ScriptedRecognition;

/// A running engine with its command channel and event subscription
pub struct TestSession {
    pub commands: UnboundedSender<EngineCommand>,
    pub events: broadcast::Receiver<TahfizEvent>,
    pub report: JoinHandle<SessionReport>,
}

impl TestSession {
    pub fn press_space(&self) {
        self.commands.send(EngineCommand::AdvanceKey).unwrap();
    }

    pub fn quit(&self) {
        self.commands.send(EngineCommand::Quit).unwrap();
    }

    pub async fn finish(self) -> SessionReport {
        tokio::time::timeout(Duration::from_secs(2), self.report)
            .await
            .expect("engine did not finish in time")
            .expect("engine task panicked")
    }
}

/// Build a surah where each entry is one verse's word list (ayahs 1..=n)
pub fn surah(verses: &[&[&str]]) -> SurahText {
    SurahText {
        name: "Test Surah".to_string(),
        number: 1,
        verses: verses
            .iter()
            .enumerate()
            .map(|(i, words)| VerseText {
                reference: VerseRef::new(1, (i + 1) as u16),
                words: words
                    .iter()
                    .map(|w| WordToken {
                        arabic: w.to_string(),
                        transliteration: w.to_string(),
                    })
                    .collect(),
                audio: None,
            })
            .collect(),
    }
}

pub fn transcript(text: &str) -> RecognitionOutcome {
    RecognitionOutcome::Transcript(text.to_string())
}

/// Spawn an engine over scripted outcomes; `recognition_available` false
/// simulates a missing speech backend
pub fn start_session_with(
    verses: &[&[&str]],
    script: Vec<RecognitionOutcome>,
    recognition_available: bool,
) -> TestSession {
    let surah = surah(verses);
    let bus = EventBus::new(256);
    let events = bus.subscribe();

    let (commands_tx, commands_rx) = tokio::sync::mpsc::unbounded_channel();
    let (mut recognition, _started_with) = ScriptedRecognition::new(commands_tx.clone(), script);
    if !recognition_available {
        recognition.set_unavailable();
    }
    let (audio, _played) = InstantAudio::new(commands_tx.clone());

    let engine = SessionEngine::new(
        &surah,
        surah.verses.clone(),
        EngineConfig::default(),
        bus,
        Box::new(recognition),
        Box::new(audio),
        commands_rx,
    )
    .expect("engine construction");

    TestSession {
        commands: commands_tx,
        events,
        report: tokio::spawn(engine.run()),
    }
}

pub fn start_session(verses: &[&[&str]], script: Vec<RecognitionOutcome>) -> TestSession {
    start_session_with(verses, script, true)
}

/// Consume events until one matches; panics after two seconds
pub async fn wait_until<F>(rx: &mut broadcast::Receiver<TahfizEvent>, mut pred: F) -> TahfizEvent
where
    F: FnMut(&TahfizEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if pred(&event) {
                        return event;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("event bus closed while waiting for event")
                }
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Drive one verse from intro through mastered recall
///
/// Assumes the script holds enough successful transcripts for the scored
/// stages (required repetitions each for read-recite and recall).
pub async fn master_verse(session: &mut TestSession, required_repetitions: u32) {
    // Intro: space plays the reference, then listen-shadow plays along
    session.press_space();
    wait_until(&mut session.events, |e| {
        matches!(e, TahfizEvent::StageEntered { stage, .. }
            if *stage == tahfiz_common::types::LearnStage::ListenShadow)
    })
    .await;
    wait_until(&mut session.events, |e| {
        matches!(e, TahfizEvent::PlaybackFinished { .. })
    })
    .await;

    // Ready confirmation into read-recite
    session.press_space();
    wait_until(&mut session.events, |e| {
        matches!(e, TahfizEvent::StageEntered { stage, .. }
            if *stage == tahfiz_common::types::LearnStage::ReadRecite)
    })
    .await;

    // Scored stages: read-recite then recall
    for _ in 0..required_repetitions * 2 {
        session.press_space();
        wait_until(&mut session.events, |e| {
            matches!(e, TahfizEvent::AttemptScored { .. })
        })
        .await;
    }
    wait_until(&mut session.events, |e| {
        matches!(e, TahfizEvent::VerseMastered { .. })
    })
    .await;
}
