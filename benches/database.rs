//! # RowDB Operation Benchmarks
//!
//! Measures the three storage paths that dominate real workloads:
//!
//! - insert: appending rows through the full SQL pipeline
//! - scan: filtered SELECT over a seeded table
//! - delete: compacting delete that shifts survivors
//!
//! ## Running
//!
//! ```sh
//! cargo bench --bench database
//! cargo bench --bench database -- scan   # one group only
//! ```

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rowdb::Database;
use tempfile::TempDir;

const SEED_ROWS: usize = 1_000;

fn seeded_database() -> (TempDir, Database) {
    let dir = TempDir::new().expect("tempdir");
    let db = Database::builder()
        .path(dir.path().join("bench-db"))
        .open()
        .expect("open database");

    db.execute("CREATE TABLE items (id int, label string, score float)")
        .expect("create table");
    for i in 0..SEED_ROWS {
        db.execute(&format!(
            "INSERT INTO items VALUES ({}, \"item-{}\", {}.5)",
            i,
            i,
            i % 100
        ))
        .expect("seed insert");
    }

    (dir, db)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_row", |b| {
        let dir = TempDir::new().expect("tempdir");
        let db = Database::builder()
            .path(dir.path().join("bench-db"))
            .open()
            .expect("open database");
        db.execute("CREATE TABLE items (id int, label string, score float)")
            .expect("create table");

        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            db.execute(&format!("INSERT INTO items VALUES ({}, \"row\", 1.5)", i))
                .expect("insert");
        });
    });

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Elements(SEED_ROWS as u64));

    let (_dir, db) = seeded_database();

    group.bench_function("full_table", |b| {
        b.iter(|| black_box(db.execute("SELECT * FROM items").expect("select")));
    });

    group.bench_function("point_filter", |b| {
        b.iter(|| {
            black_box(
                db.execute("SELECT label FROM items WHERE id = 500")
                    .expect("select"),
            )
        });
    });

    group.bench_function("range_filter", |b| {
        b.iter(|| {
            black_box(
                db.execute("SELECT id FROM items WHERE score > 50.0")
                    .expect("select"),
            )
        });
    });

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    group.sample_size(20);

    group.bench_function("compacting_half", |b| {
        b.iter_batched(
            seeded_database,
            |(_dir, db)| {
                db.execute("DELETE FROM items WHERE score > 49.0")
                    .expect("delete");
            },
            BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_scan, bench_delete);
criterion_main!(benches);
