//! Benchmarks for the per-tick scheduling cost.
//!
//! A tick runs on the host's frame loop, so it has to stay far below the
//! tick interval (33ms by default) even with a deep backlog of replies.
//! The worst case is a long queue waiting behind one outstanding synthesis
//! request: every tick rescans the whole queue and consumes nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use parley_core::config::SessionOptions;
use parley_services::{
    MockChatBackend, MockListeningService, MockSynthesisService, RecordedDialog, RecordedEntry,
    RecordingAnimationSink,
};
use parley_turn::{Collaborators, TurnCoordinator};

fn recorded_dialog(entries: usize) -> RecordedDialog {
    let mut dialog = RecordedDialog::new();
    for i in 0..entries {
        dialog.insert(RecordedEntry {
            text: format!("Recorded line {}", i),
            file: format!("line_{}.wav", i),
            duration_secs: 1.5,
        });
    }
    dialog
}

/// A running coordinator whose first queued reply is stuck in synthesis.
fn backlogged_coordinator(depth: usize) -> TurnCoordinator {
    let mut coordinator = TurnCoordinator::new(Collaborators {
        listening: Arc::new(MockListeningService::new()),
        synthesis: Arc::new(MockSynthesisService::new()),
        recorded: Arc::new(recorded_dialog(200)),
        backend: Arc::new(MockChatBackend::new()),
        animation: Some(Arc::new(RecordingAnimationSink::new())),
    });
    coordinator
        .start(&SessionOptions::default())
        .expect("fresh coordinator starts");
    for i in 0..depth {
        coordinator.enqueue_reply(&format!(
            "Reply {} from the assistant, long enough to look like a real sentence.",
            i
        ));
    }
    // Issues the single outstanding request; the mock never completes it.
    coordinator.tick();
    coordinator
}

fn bench_backlogged_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_backlog");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    for depth in [10usize, 100, 500] {
        let mut coordinator = backlogged_coordinator(depth);
        group.bench_function(format!("depth_{}", depth), |b| {
            b.iter(|| coordinator.tick());
        });
    }

    group.finish();
}

fn bench_emoji_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_drain");

    group.bench_function("emoji_100", |b| {
        b.iter_batched(
            || {
                let mut coordinator = backlogged_coordinator(0);
                for _ in 0..100 {
                    coordinator.enqueue_reply("👍");
                }
                coordinator
            },
            |mut coordinator| {
                while coordinator.queue_len() > 0 {
                    coordinator.tick();
                }
                coordinator
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// p95 of a single tick over a 500-message backlog must stay under 1ms.
fn bench_tick_latency_assertion(_c: &mut Criterion) {
    let mut coordinator = backlogged_coordinator(500);
    let target = Duration::from_micros(1000);

    let mut times = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let start = Instant::now();
        let _report = coordinator.tick();
        times.push(start.elapsed());
    }

    times.sort();
    let p95 = times[949];
    let median = times[499];

    eprintln!("\n=== Tick latency (500 queued replies) ===");
    eprintln!("Median:  {:?}", median);
    eprintln!("p95:     {:?} (target: {:?})", p95, target);

    assert!(
        p95 < target,
        "Tick p95 {:?} exceeds target {:?}",
        p95,
        target
    );
}

criterion_group!(
    benches,
    bench_backlogged_tick,
    bench_emoji_drain,
    bench_tick_latency_assertion
);
criterion_main!(benches);
