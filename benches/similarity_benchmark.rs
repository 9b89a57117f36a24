use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dcw_rust::models::Value;
use dcw_rust::services::dedup::{candidate_pairs, jaro_winkler, levenshtein, trigram_similarity};

fn bench_similarity_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity_metrics");

    let pairs = [
        ("john smith", "jon smith"),
        ("elizabeth harmon", "elisabeth harman"),
        ("acme corporation ltd", "acme corp limited"),
        ("short", "completely different"),
    ];

    group.bench_function("levenshtein", |b| {
        b.iter(|| {
            for (a, s) in &pairs {
                black_box(levenshtein(black_box(a), black_box(s)));
            }
        });
    });

    group.bench_function("jaro_winkler", |b| {
        b.iter(|| {
            for (a, s) in &pairs {
                black_box(jaro_winkler(black_box(a), black_box(s)));
            }
        });
    });

    group.bench_function("trigram", |b| {
        b.iter(|| {
            for (a, s) in &pairs {
                black_box(trigram_similarity(black_box(a), black_box(s)));
            }
        });
    });

    group.finish();
}

fn bench_candidate_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_neighbourhood");

    for &size in &[100usize, 1_000, 10_000] {
        let keys: Vec<(i64, Value)> = (0..size)
            .map(|i| {
                // interleaved surnames so sorting actually reorders
                let name = format!("{}-{:06}", ["smith", "jones", "brown"][i % 3], i);
                (i as i64 + 1, Value::Text(name))
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("window_3", size), &keys, |b, keys| {
            b.iter(|| candidate_pairs(black_box(keys), 3));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_similarity_metrics, bench_candidate_generation);
criterion_main!(benches);
