use criterion::{black_box, criterion_group, criterion_main, Criterion};
use bread_sync::models::{DocumentPath, Participant};
use bread_sync::services::participant_cache::{ParticipantCache, PARTICIPANT_CACHE_CAPACITY};

fn participants(count: usize) -> Vec<(DocumentPath, Participant)> {
    (0..count)
        .map(|n| {
            let username = format!("user{}", n);
            let participant = Participant::new(username.clone(), "", "first", "last");
            (DocumentPath::participant(&username), participant)
        })
        .collect()
}

fn benchmark_participant_cache(c: &mut Criterion) {
    let warm = participants(PARTICIPANT_CACHE_CAPACITY);
    let cache = ParticipantCache::default();
    for (path, participant) in &warm {
        cache.insert(path, participant.clone());
    }

    // A feed twice the cache size: every insert past the first pass evicts.
    let churn = participants(PARTICIPANT_CACHE_CAPACITY * 2);

    let mut group = c.benchmark_group("participant_cache");

    group.bench_function("hit", |b| {
        b.iter(|| cache.get(black_box(&warm[PARTICIPANT_CACHE_CAPACITY / 2].0)))
    });

    group.bench_function("insert_with_eviction", |b| {
        let cache = ParticipantCache::default();
        b.iter(|| {
            for (path, participant) in &churn {
                cache.insert(black_box(path), participant.clone());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_participant_cache);
criterion_main!(benches);
