// In arrow-bulkcopy/benches/projection_bench.rs

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use arrow_bulkcopy::config::BatchPolicy;
use arrow_bulkcopy::pipeline::{decode_stream, project};

/// Builds an IPC stream with one batch of `rows` rows over four common column types.
fn generate_stream(rows: usize) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("label", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
        Field::new(
            "seen_at",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ),
    ]));

    let ids: Int64Array = (0..rows as i64).collect();
    let labels: StringArray = (0..rows)
        .map(|i| (i % 7 != 0).then(|| format!("row-{i}")))
        .collect();
    let scores: Float64Array = (0..rows).map(|i| Some(i as f64 * 0.5)).collect();
    let seen: TimestampMicrosecondArray = (0..rows as i64)
        .map(|i| Some(1_700_000_000_000_000 + i * 1_000))
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(ids),
            Arc::new(labels),
            Arc::new(scores),
            Arc::new(seen),
        ],
    )
    .unwrap();

    let mut writer = StreamWriter::try_new(Vec::new(), &schema).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();
    writer.into_inner().unwrap()
}

const BENCH_ROWS: usize = 50_000;

fn bench_decode_and_project(c: &mut Criterion) {
    let stream = generate_stream(BENCH_ROWS);

    let mut group = c.benchmark_group("Decode + Project");
    group.throughput(Throughput::Elements(BENCH_ROWS as u64));

    group.bench_function("decode only", |b| {
        b.iter(|| black_box(decode_stream(black_box(&stream), BatchPolicy::FirstOnly).unwrap()))
    });

    group.bench_function("decode + project all rows", |b| {
        b.iter(|| {
            let decoded = decode_stream(black_box(&stream), BatchPolicy::FirstOnly).unwrap();
            let rows = project(decoded.schema, decoded.batches).unwrap();
            let mut count = 0usize;
            for row in rows {
                black_box(row.unwrap());
                count += 1;
            }
            count
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode_and_project);
criterion_main!(benches);
