//! Microbenchmarks for the `store()` write path.
//!
//! Measures the cost of the locked slice write, both the steady-state
//! append and the in-place overwrite.
//!
//! Run with: `cargo bench -p grove -- store`

#![allow(missing_docs)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use grove::{Datapoint, MetaBag, MetaValue, Tree, TreeConfig};
use tempfile::tempdir;

/// Creates a tree with one 1s-resolution node ready for writes.
fn setup_tree() -> (Tree, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let tree = Tree::open_with_config(
        temp_dir.path(),
        TreeConfig {
            // Benchmark iterations are sequential; a generous ceiling
            // keeps every write in one slice.
            max_slice_gap: 1_000_000,
            default_time_step: 1,
        },
    )
    .unwrap();

    let mut properties = MetaBag::new();
    properties.insert("timeStep".to_string(), MetaValue::from(1i64));
    tree.create_node("bench.cpu", properties).unwrap();

    (tree, temp_dir)
}

fn bench_store_append(c: &mut Criterion) {
    let (tree, _dir) = setup_tree();

    let base_time = 1_700_000_000i64;
    let mut ts = base_time;

    c.bench_function("store/append", |b| {
        b.iter(|| {
            ts += 1;
            tree.store("bench.cpu", black_box(Datapoint::new(ts, 42.5)))
                .unwrap();
        });
    });
}

fn bench_store_overwrite(c: &mut Criterion) {
    let (tree, _dir) = setup_tree();

    let base_time = 1_700_000_000i64;
    tree.store("bench.cpu", Datapoint::new(base_time, 0.0))
        .unwrap();

    c.bench_function("store/overwrite", |b| {
        b.iter(|| {
            tree.store("bench.cpu", black_box(Datapoint::new(base_time, 42.5)))
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_store_append, bench_store_overwrite);
criterion_main!(benches);
