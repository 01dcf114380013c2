use criterion::{black_box, criterion_group, criterion_main, Criterion};
use catalog_browser::data::Record;
use catalog_browser::search_filter::{FilterEngine, FilterMode, FilterOptions, MemoizedFilter};
use std::sync::Arc;

fn create_test_records(count: usize) -> Vec<Record> {
    let categories = [
        "beauty",
        "fragrances",
        "furniture",
        "groceries",
        "home-decoration",
        "kitchen-accessories",
        "laptops",
        "mens-shirts",
        "smartphones",
        "sunglasses",
    ];

    (0..count)
        .map(|i| {
            Record::new(
                i as u64 + 1,
                format!("Product {} Deluxe", i),
                categories[i % categories.len()],
                (i % 200) as f64 + 0.99,
                (i % 150) as u64,
            )
        })
        .collect()
}

fn benchmark_modes(c: &mut Criterion) {
    let records = create_test_records(10_000);
    let mut group = c.benchmark_group("filter_10k");

    for mode in [FilterMode::Literal, FilterMode::Regex, FilterMode::Fuzzy] {
        let options = FilterOptions {
            mode,
            include_numeric_fields: false,
        };
        group.bench_function(mode.as_str(), |b| {
            b.iter(|| FilterEngine::apply_with(&records, black_box("furn"), &options));
        });
    }

    group.bench_function("literal_with_numeric_fields", |b| {
        let options = FilterOptions {
            mode: FilterMode::Literal,
            include_numeric_fields: true,
        };
        b.iter(|| FilterEngine::apply_with(&records, black_box("199"), &options));
    });

    group.finish();
}

fn benchmark_memoized(c: &mut Criterion) {
    let records = Arc::new(create_test_records(100_000));
    let options = FilterOptions::default();
    let mut group = c.benchmark_group("memoized_100k");

    // Same version and term: served from the memo after the first call
    group.bench_function("repeat_term", |b| {
        let mut filter = MemoizedFilter::new();
        b.iter(|| {
            let result = filter.apply(1, || records.to_vec(), black_box("laptops"), &options);
            assert!(!result.is_empty());
        });
    });

    group.bench_function("uncached", |b| {
        b.iter(|| {
            let result = FilterEngine::apply(&records, black_box("laptops"));
            assert!(!result.is_empty());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_modes, benchmark_memoized);
criterion_main!(benches);
