//! Benchmarks for the recitation scoring hot path
//!
//! Scoring runs on every submitted attempt while the learner waits for
//! feedback, so similarity and word alignment need to stay well under
//! perceptible latency even for long verses.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tahfiz_session::RecitationScorer;

const EXPECTED: [&str; 10] = [
    "bismi", "llahi", "r-rahmani", "r-rahim", "alhamdu", "lillahi", "rabbi", "l-alamin", "maliki",
    "yawmi",
];

fn close_transcript() -> String {
    // A realistic near-miss: one dropped word, one misspelling
    "bismi llahi rahmani r-rahim alhamdu lilahi rabbi l-alamin maliki".to_string()
}

fn bench_score(c: &mut Criterion) {
    let scorer = RecitationScorer::new(0.8);
    let transcript = close_transcript();

    c.bench_function("score_ten_words", |b| {
        b.iter(|| scorer.score(black_box(&transcript), black_box(&EXPECTED)))
    });
}

fn bench_detailed_feedback(c: &mut Criterion) {
    let scorer = RecitationScorer::new(0.8);
    let transcript = close_transcript();

    c.bench_function("detailed_feedback_ten_words", |b| {
        b.iter(|| scorer.detailed_feedback(black_box(&transcript), black_box(&EXPECTED)))
    });
}

fn bench_long_verse(c: &mut Criterion) {
    let scorer = RecitationScorer::new(0.8);
    // Alignment is quadratic in word count; exercise a long verse
    let expected: Vec<&str> = EXPECTED.iter().cycle().take(50).copied().collect();
    let transcript = expected.join(" ");

    c.bench_function("score_fifty_words", |b| {
        b.iter(|| scorer.score(black_box(&transcript), black_box(&expected)))
    });
}

criterion_group!(
    benches,
    bench_score,
    bench_detailed_feedback,
    bench_long_verse
);
criterion_main!(benches);
