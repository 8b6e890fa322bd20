//! Benchmarks for the frame demultiplexer
//!
//! Measures records per second through [`FrameDemuxer`] for the three
//! outcomes: delivered, skipped for another window, and dropped because the
//! consumer is still busy.
//!
//! Platform: Cross-platform, in-memory stream

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use panelcast::demux::FrameDemuxer;
use panelcast::mailbox::Mailbox;
use panelcast::selector::ActiveWindow;
use panelcast::test_utils::record_bytes;
use std::hint::black_box;
use std::io::Cursor;
use std::sync::Arc;

const RECORDS: usize = 64;
const PAYLOAD: usize = 150 * 1024;

fn wire(window_id: u8) -> Vec<u8> {
    let payload = vec![0x5A; PAYLOAD];
    let record = record_bytes(window_id, &payload);
    record.repeat(RECORDS)
}

fn bench_demux(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build runtime");

    let mut group = c.benchmark_group("demux");
    let active = wire(0);
    group.throughput(Throughput::Bytes(active.len() as u64));

    group.bench_function("skip_inactive", |b| {
        let inactive = wire(1);
        b.iter(|| {
            runtime.block_on(async {
                let selector = Arc::new(ActiveWindow::resolve(None, 2));
                let mailbox = Arc::new(Mailbox::new());
                let mut demux = FrameDemuxer::new(Cursor::new(&inactive[..]), selector, mailbox);
                for _ in 0..RECORDS {
                    black_box(demux.next_record().await.expect("record"));
                }
            })
        })
    });

    group.bench_function("deliver_then_drop_busy", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let selector = Arc::new(ActiveWindow::resolve(None, 1));
                let mailbox = Arc::new(Mailbox::new());
                let mut demux = FrameDemuxer::new(Cursor::new(&active[..]), selector, mailbox);
                // Nobody consumes: first record delivered, the rest dropped
                for _ in 0..RECORDS {
                    black_box(demux.next_record().await.expect("record"));
                }
            })
        })
    });

    group.bench_function("deliver_every_record", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let selector = Arc::new(ActiveWindow::resolve(None, 1));
                let mailbox = Arc::new(Mailbox::new());
                let mut demux =
                    FrameDemuxer::new(Cursor::new(&active[..]), selector, Arc::clone(&mailbox));
                for _ in 0..RECORDS {
                    black_box(demux.next_record().await.expect("record"));
                    let delivery = mailbox.recv().await.expect("delivered");
                    black_box(delivery.payload().len());
                }
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_demux);
criterion_main!(benches);
