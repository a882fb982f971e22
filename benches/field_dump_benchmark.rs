//! Benchmarks for field dump parsing
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdftk_forms::pdftk::parse_field_dump;

/// Build a dump of `count` fields, alternating text fields and checkboxes.
fn synthesize_dump(count: usize) -> String {
    let mut dump = String::new();
    for i in 0..count {
        dump.push_str("---\n");
        if i % 2 == 0 {
            dump.push_str("FieldType: Text\n");
            dump.push_str(&format!("FieldName: form1[0].page1[0].name{}\n", i));
            dump.push_str("FieldFlags: 0\n");
            dump.push_str(&format!("FieldValue: Value {}\n", i));
            dump.push_str("FieldJustification: Left\n");
        } else {
            dump.push_str("FieldType: Button\n");
            dump.push_str(&format!("FieldName: form1[0].page1[0].checkbox{}\n", i));
            dump.push_str("FieldFlags: 0\n");
            dump.push_str("FieldJustification: Left\n");
            dump.push_str("FieldStateOption: Off\n");
            dump.push_str("FieldStateOption: Yes\n");
        }
    }
    dump
}

fn bench_parse_field_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_field_dump");

    for count in [10, 100, 1000] {
        let dump = synthesize_dump(count);
        group.throughput(Throughput::Bytes(dump.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &dump, |b, dump| {
            b.iter(|| parse_field_dump(black_box(dump)));
        });
    }

    group.finish();
}

/// Dumps from XFA-heavy forms repeat names across pages
fn bench_repeated_names(c: &mut Criterion) {
    let block = "---\nFieldType: Text\nFieldName: shared\nFieldFlags: 0\nFieldValue: x\n";
    let dump = block.repeat(500);

    let mut group = c.benchmark_group("repeated_names");
    group.throughput(Throughput::Bytes(dump.len() as u64));
    group.bench_function("500_blocks_one_name", |b| {
        b.iter(|| {
            let fields = parse_field_dump(black_box(&dump));
            assert_eq!(fields.len(), 1);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_parse_field_dump, bench_repeated_names);
criterion_main!(benches);
