//! Benchmarks for record header and handshake parsing
//!
//! Header validation runs once per record on the receive path, so it must
//! stay negligible next to the payload read.
//!
//! Platform: Cross-platform, no host required

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use panelcast::protocol::{RecordHeader, Session, padding_len};
use panelcast::test_utils::sample_session;
use std::hint::black_box;

fn bench_header_parse(c: &mut Criterion) {
    let bytes = RecordHeader::new(3, 182_311).encode();
    let mut corrupt = bytes;
    corrupt[13] = b'#';

    let mut group = c.benchmark_group("record_header");
    group.bench_function("parse_valid", |b| {
        b.iter(|| RecordHeader::parse(black_box(&bytes)))
    });
    group.bench_function("parse_corrupt", |b| {
        b.iter(|| RecordHeader::parse(black_box(&corrupt)).is_err())
    });
    group.bench_function("encode", |b| {
        let header = RecordHeader::new(3, 182_311);
        b.iter(|| black_box(header).encode())
    });
    group.bench_function("padding_len", |b| b.iter(|| padding_len(black_box(182_311))));
    group.finish();
}

fn bench_handshake_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("handshake");

    for windows in [1usize, 8, 32] {
        let block = sample_session(windows).encode_block().expect("fixture fits");
        group.throughput(Throughput::Bytes(block.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", windows), &block, |b, block| {
            b.iter(|| Session::parse(black_box(block)).expect("fixture parses"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_header_parse, bench_handshake_parse);
criterion_main!(benches);
