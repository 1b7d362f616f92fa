//! Link drill integration tests
//!
//! The drill over mastered verse pairs: prompt playback, recitation of the
//! following verse's beginning, and per-pair perfect-attempt accounting.

mod helpers;

use helpers::{start_session, transcript, wait_until};
use tahfiz_common::events::TahfizEvent;
use tahfiz_common::types::VerseRef;

#[tokio::test]
async fn imperfect_link_attempt_keeps_earlier_progress() {
    let mut script = Vec::new();
    script.extend((0..6).map(|_| transcript("a b c")));
    script.extend((0..6).map(|_| transcript("d e f")));
    // Perfect, miss, perfect; the miss holds the pair but costs nothing
    script.push(transcript("d e f"));
    script.push(transcript("x y z"));
    script.push(transcript("d e f"));
    let mut s = start_session(&[&["a", "b", "c"], &["d", "e", "f"]], script);

    helpers::master_verse(&mut s, 3).await;
    helpers::master_verse(&mut s, 3).await;
    wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkPairEntered { .. })
    })
    .await;

    s.press_space();
    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkAttemptScored { .. })
    })
    .await
    {
        TahfizEvent::LinkAttemptScored {
            perfect,
            perfect_attempts,
            ..
        } => {
            assert!(perfect);
            assert_eq!(perfect_attempts, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    s.press_space();
    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkAttemptScored { .. })
    })
    .await
    {
        TahfizEvent::LinkAttemptScored {
            perfect,
            perfect_attempts,
            ..
        } => {
            assert!(!perfect);
            assert_eq!(perfect_attempts, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    s.press_space();
    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkAttemptScored { .. })
    })
    .await
    {
        TahfizEvent::LinkAttemptScored {
            perfect,
            perfect_attempts,
            ..
        } => {
            assert!(perfect);
            assert_eq!(perfect_attempts, 2);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkPairCompleted { .. })
    })
    .await;
    wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::SessionCompleted { .. })
    })
    .await;

    let report = s.finish().await;
    assert!(report.completed);
    let link = report.link.expect("link drill ran");
    assert_eq!(link.attempts, 3);
    assert_eq!(link.completed_pairs, 1);
}

#[tokio::test]
async fn drill_walks_pairs_in_verse_order() {
    let mut script = Vec::new();
    script.extend((0..6).map(|_| transcript("a b c")));
    script.extend((0..6).map(|_| transcript("d e f")));
    script.extend((0..6).map(|_| transcript("g h i")));
    script.extend((0..2).map(|_| transcript("d e f")));
    script.extend((0..2).map(|_| transcript("g h i")));
    let mut s = start_session(
        &[&["a", "b", "c"], &["d", "e", "f"], &["g", "h", "i"]],
        script,
    );

    for _ in 0..3 {
        helpers::master_verse(&mut s, 3).await;
    }

    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkDrillStarted { .. })
    })
    .await
    {
        TahfizEvent::LinkDrillStarted { total_pairs, .. } => assert_eq!(total_pairs, 2),
        other => panic!("unexpected event: {:?}", other),
    }

    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkPairEntered { .. })
    })
    .await
    {
        TahfizEvent::LinkPairEntered {
            leading,
            following,
            pair_index,
            ..
        } => {
            assert_eq!(leading, VerseRef::new(1, 1));
            assert_eq!(following, VerseRef::new(1, 2));
            assert_eq!(pair_index, 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    for _ in 0..2 {
        s.press_space();
        wait_until(&mut s.events, |e| {
            matches!(e, TahfizEvent::LinkAttemptScored { .. })
        })
        .await;
    }
    wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkPairCompleted { .. })
    })
    .await;

    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::LinkPairEntered { .. })
    })
    .await
    {
        TahfizEvent::LinkPairEntered {
            leading,
            following,
            pair_index,
            ..
        } => {
            assert_eq!(leading, VerseRef::new(1, 2));
            assert_eq!(following, VerseRef::new(1, 3));
            assert_eq!(pair_index, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    for _ in 0..2 {
        s.press_space();
        wait_until(&mut s.events, |e| {
            matches!(e, TahfizEvent::LinkAttemptScored { .. })
        })
        .await;
    }

    match wait_until(&mut s.events, |e| {
        matches!(e, TahfizEvent::SessionCompleted { .. })
    })
    .await
    {
        TahfizEvent::SessionCompleted {
            verses_mastered,
            pairs_completed,
            ..
        } => {
            assert_eq!(verses_mastered, 3);
            assert_eq!(pairs_completed, 2);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let report = s.finish().await;
    assert!(report.completed);
    assert_eq!(report.verses_mastered(), 3);
    let link = report.link.expect("link drill ran");
    assert_eq!(link.total_pairs, 2);
    assert_eq!(link.completed_pairs, 2);
    assert_eq!(link.attempts, 4);
}
