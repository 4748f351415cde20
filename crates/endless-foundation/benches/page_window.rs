use criterion::{black_box, criterion_group, criterion_main, Criterion};
use endless_foundation::paging::{EvictionPolicy, Page, PageStore};

fn number_page(cursor: i64) -> Page<i64, i64> {
    let start = cursor * 50;
    Page::new((start..start + 50).collect(), Some(cursor + 1), Some(cursor - 1))
}

fn append_with_eviction(c: &mut Criterion) {
    c.bench_function("append_with_eviction", |b| {
        b.iter(|| {
            let mut store = PageStore::new(EvictionPolicy::capped(8));
            store.seed(number_page(0), Some(0));
            for cursor in 1..64 {
                let evicted = store.append_page(number_page(cursor)).expect("append");
                black_box(evicted);
            }
            black_box(store.item_count());
        });
    });
}

fn item_lookup(c: &mut Criterion) {
    let mut store = PageStore::new(EvictionPolicy::unbounded());
    store.seed(number_page(0), Some(0));
    for cursor in 1..200 {
        store.append_page(number_page(cursor)).expect("append");
    }

    c.bench_function("item_lookup_deep_window", |b| {
        b.iter(|| black_box(store.item(black_box(9_975))));
    });
}

criterion_group!(benches, append_with_eviction, item_lookup);
criterion_main!(benches);
