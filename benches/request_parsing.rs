//! Benchmarks for transform request parsing
//!
//! Parsing and cache key hashing run on every `?t=` read, hits included.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mama::mime::MimeCache;
use mama::transform::request::cache_key;
use mama::transform::{OperationKind, SourceFile, TransformOperation, TransformRequest};
use mama_common::naming;

const QUERIES: &[(&str, &str)] = &[
    ("single", "op=resize,w=320,h=240,fmt=jpeg,q=80"),
    (
        "chain",
        "op=snapshot,framenum=12,fmt=png|op=resize,w=640|op=thumbnail,w=128,h=128,fmt=jpeg",
    ),
    ("noise", "op=blur,radius=3|x=1,y=2|op=resize,w=abc,fmt=gif"),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse");
    // Every stage names a format, so the file is never opened.
    let source = SourceFile::new("/srv/files/photos/cat.png");
    let mime = MimeCache::new();

    for (name, query) in QUERIES {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, q| {
            b.iter(|| {
                TransformRequest::parse(
                    black_box("photos/cat.png"),
                    black_box(Some(*q)),
                    &source,
                    &mime,
                )
            })
        });
    }

    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let mut op = TransformOperation::new(OperationKind::Thumbnail);
    op.width = 128;
    op.height = 128;
    let ops = vec![op; 4];

    c.bench_function("cache_key_4_stages", |b| {
        b.iter(|| cache_key(black_box("photos/2024/summer/beach.jpg"), black_box(&ops)))
    });
}

fn bench_naming(c: &mut Criterion) {
    let hash = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
    let stored = naming::encode_with_index("holiday-photo.jpeg", hash, 3);

    c.bench_function("naming_encode", |b| {
        b.iter(|| naming::encode(black_box("holiday-photo.jpeg"), black_box(hash)))
    });
    c.bench_function("naming_decode", |b| {
        b.iter(|| naming::decode(black_box(&stored)))
    });
}

criterion_group!(benches, bench_parse, bench_cache_key, bench_naming);
criterion_main!(benches);
