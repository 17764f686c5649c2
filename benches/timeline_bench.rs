use criterion::{black_box, criterion_group, criterion_main, Criterion};
use video_review::{Chapter, ExtractionPayload, Flashcard, ReviewSession, TimelineMarkerBinder};

fn sample_chapters(count: usize) -> Vec<Chapter> {
    (0..count)
        .map(|i| Chapter::new(i as f64 * 37.5, format!("Chapter {}", i + 1)))
        .collect()
}

fn bench_marker_render(c: &mut Criterion) {
    let binder = TimelineMarkerBinder::new(Some(3600.0));
    let small = sample_chapters(10);
    let large = sample_chapters(500);

    c.bench_function("marker_render_10", |b| {
        b.iter(|| black_box(binder.render(black_box(&small))))
    });

    c.bench_function("marker_render_500", |b| {
        b.iter(|| black_box(binder.render(black_box(&large))))
    });

    let view = binder.render(&large);
    c.bench_function("marker_panel_lines_500", |b| {
        b.iter(|| black_box(view.panel_lines()))
    });
}

fn bench_review_navigation(c: &mut Criterion) {
    let cards: Vec<Flashcard> = (0..200)
        .map(|i| Flashcard::new(format!("Question {}?", i), format!("Answer {}", i)))
        .collect();

    c.bench_function("review_cycle_200", |b| {
        b.iter(|| {
            let mut session = ReviewSession::new(cards.clone());
            session.open();
            for _ in 0..cards.len() {
                session.flip();
                session.next();
            }
            black_box(session.current_index())
        })
    });
}

fn bench_payload_parse(c: &mut Criterion) {
    let body = serde_json::json!({
        "chapters": sample_chapters(100),
        "flashcards": (0..50)
            .map(|i| Flashcard::new(format!("Q{}", i), format!("A{}", i)))
            .collect::<Vec<_>>(),
    })
    .to_string();

    c.bench_function("payload_parse_100_chapters", |b| {
        b.iter(|| black_box(ExtractionPayload::from_json(black_box(body.as_bytes()))))
    });
}

criterion_group!(benches, bench_marker_render, bench_review_navigation, bench_payload_parse);
criterion_main!(benches);
