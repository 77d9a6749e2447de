//! Benchmarks for vaultkv store operations

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;
use vaultkv::protocol::{Command, Credentials, Status};
use vaultkv::{Config, Store};

fn store_benchmarks(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .quota_window(Duration::ZERO)
        .build();
    let store = Store::open(config).unwrap();

    let creds = Credentials::new("bench", "bench_password");
    let status = store
        .execute(&Command::Register {
            creds: creds.clone(),
        })
        .status;
    assert_eq!(status, Status::Ok);

    let mut next_key = 0u64;
    c.bench_function("kv_insert_1kb", |b| {
        b.iter(|| {
            next_key += 1;
            store.execute(&Command::KvInsert {
                creds: creds.clone(),
                key: format!("bench-{next_key}"),
                value: vec![0u8; 1024],
            })
        })
    });

    store.execute(&Command::KvUpsert {
        creds: creds.clone(),
        key: "hot".to_string(),
        value: vec![0u8; 1024],
    });

    c.bench_function("kv_get_1kb", |b| {
        b.iter(|| {
            store.execute(&Command::KvGet {
                creds: creds.clone(),
                key: "hot".to_string(),
            })
        })
    });

    c.bench_function("kv_upsert_existing_1kb", |b| {
        b.iter(|| {
            store.execute(&Command::KvUpsert {
                creds: creds.clone(),
                key: "hot".to_string(),
                value: vec![0u8; 1024],
            })
        })
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
