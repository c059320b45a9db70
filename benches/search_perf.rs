use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use folio_palette::model::types::{Category, RawResults, ResultItem, SessionIdentity};
use folio_palette::search::categorize::categorize;
use folio_palette::storage::sqlite::{ImportBundle, ImportItem, SqliteSearchStore};
use std::hint::black_box;
use tempfile::TempDir;

fn raw_results(per_category: usize) -> RawResults {
    let mut raw = RawResults::default();
    for category in Category::PRIORITY {
        let bucket = raw.bucket_mut(category);
        for i in 0..per_category {
            bucket.push(ResultItem {
                id: format!("{category}-{i}"),
                title: format!("{} {i}", category.label()),
                subtitle: String::new(),
                href: format!("/{category}/{i}"),
                icon: None,
                category,
                external: false,
            });
        }
    }
    raw
}

/// Grouping cost for typical and oversized result sets.
fn bench_categorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("categorize");
    for per_category in [5usize, 50, 500] {
        let raw = raw_results(per_category);
        group.bench_with_input(
            BenchmarkId::from_parameter(per_category),
            &raw,
            |b, raw| b.iter(|| black_box(categorize(raw))),
        );
    }
    group.finish();
}

/// End-to-end store lookup over 10k entries.
fn bench_store_search(c: &mut Criterion) {
    let dir = TempDir::new().expect("tempdir");
    let mut store = SqliteSearchStore::open(&dir.path().join("bench.db"), 5).expect("open store");
    let items = |prefix: &str| -> Vec<ImportItem> {
        (0..2_500)
            .map(|i| ImportItem {
                id: format!("{prefix}{i}"),
                title: format!("{prefix} holding {i}"),
                subtitle: if i % 7 == 0 { "apple".into() } else { String::new() },
                href: format!("/{prefix}/{i}"),
                icon: None,
                external: false,
            })
            .collect()
    };
    store
        .import(&[ImportBundle {
            owner: "bench".into(),
            portfolios: items("portfolio"),
            assets: items("asset"),
            documents: items("document"),
            articles: items("article"),
        }])
        .expect("import");
    let me = SessionIdentity::new("bench").expect("identity");

    c.bench_function("store_search_10k", |b| {
        b.iter(|| black_box(store.search_entries("apple", &me).expect("search")))
    });
}

criterion_group!(benches, bench_categorize, bench_store_search);
criterion_main!(benches);
