//! Benchmarks pour le décodage et la coercition

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Génère une FeatureCollection synthétique de `count` écoles
fn synthetic_collection(count: usize) -> Vec<u8> {
    let features: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"type":"Feature","properties":{{"objectid":{i},"name":"School {i}","address":"{i} Main St","city":"Springfield","state":"IL","zip":"62701","enrollment":{enrollment},"ft_teacher":{teachers},"type":1,"status":1,"sourcedate":"2020-01-15T00:00:00Z","val_date":"2020-03-01T00:00:00Z","website":""}},"geometry":{{"type":"Point","coordinates":[{lon},{lat}]}}}}"#,
                enrollment = i % 900,
                teachers = i % 40,
                lon = -89.65 + (i as f64) * 1e-4,
                lat = 39.78 + (i as f64) * 1e-4,
            )
        })
        .collect();

    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
    .into_bytes()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in [1_000usize, 10_000] {
        let doc = synthetic_collection(count);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &doc, |b, doc| {
            b.iter(|| {
                let collection = schools_geojson::decoder::decode_slice(black_box(doc)).unwrap();
                black_box(collection)
            })
        });
    }

    group.finish();
}

fn bench_decode_and_coerce(c: &mut Criterion) {
    let doc = synthetic_collection(10_000);
    let mut group = c.benchmark_group("decode_and_coerce");
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("10000", |b| {
        b.iter(|| {
            let collection = schools_geojson::decoder::decode_slice(black_box(&doc)).unwrap();
            let records: Vec<_> = collection
                .features
                .iter()
                .filter_map(|f| schools_geojson::to_record(f).ok())
                .collect();
            black_box(records)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_decode_and_coerce);
criterion_main!(benches);
