//! Session Store Benchmarks
//!
//! Measures the hot paths of the binding store:
//! - first bind and refresh
//! - validated token reads (hit, cross-user miss, unknown session)
//! - reads against a store holding many sessions

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use sm_core::session::SessionStore;

/// Benchmark bind_and_store
fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_and_store");

    group.bench_function("first_bind", |b| {
        b.iter_with_setup(SessionStore::new, |store| {
            store
                .bind_and_store("U001", "xoxp-token", Some(black_box("session-1")))
                .unwrap();
            store
        })
    });

    group.bench_function("refresh", |b| {
        let store = SessionStore::new();
        store.bind_and_store("U001", "xoxp-token", Some("session-1")).unwrap();

        b.iter(|| {
            store
                .bind_and_store("U001", black_box("xoxp-new-token"), Some("session-1"))
                .unwrap()
        })
    });

    group.bench_function("conflict", |b| {
        let store = SessionStore::new();
        store.bind_and_store("U001", "xoxp-token", Some("session-1")).unwrap();

        b.iter(|| {
            store
                .bind_and_store("U002", "xoxp-other", Some(black_box("session-1")))
                .unwrap_err()
        })
    });

    group.finish();
}

/// Benchmark get_validated_token
fn bench_validated_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_validated_token");

    let store = SessionStore::new();
    store.bind_and_store("U001", "xoxp-a", Some("session-a")).unwrap();
    store.bind_and_store("U002", "xoxp-b", Some("session-b")).unwrap();

    group.bench_function("hit", |b| {
        b.iter(|| store.get_validated_token(black_box("U001"), Some("session-a")))
    });

    group.bench_function("cross_user", |b| {
        b.iter(|| store.get_validated_token(black_box("U002"), Some("session-a")))
    });

    group.bench_function("unknown_session", |b| {
        b.iter(|| store.get_validated_token(black_box("U001"), Some("session-missing")))
    });

    // Larger tables
    for sessions in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("hit_in", sessions), sessions, |b, &sessions| {
            let store = SessionStore::new();
            for i in 0..sessions {
                let user = format!("U{:05}", i % 500);
                store
                    .bind_and_store(&user, format!("xoxp-{}", i), Some(&format!("session-{}", i)))
                    .unwrap();
            }
            let user = format!("U{:05}", 42 % 500);

            b.iter(|| store.get_validated_token(black_box(&user), Some("session-42")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bind, bench_validated_read);

criterion_main!(benches);
