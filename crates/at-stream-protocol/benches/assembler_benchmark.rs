//! Benchmarks for line assembly and full session polling.
//!
//! Run with: cargo bench -p at-stream-protocol

use at_stream_protocol::{AtSession, Feed, LineAssembler, MockTransport};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// A typical multi-line response: a scan listing followed by OK.
fn scan_response(lines: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..lines {
        data.extend_from_slice(format!("+CWLAP:(3,\"net-{}\",-{},\"aa:bb:cc\",6)\r\n", i, 40 + i).as_bytes());
    }
    data.extend_from_slice(b"OK\r\n");
    data
}

fn bench_assembler(c: &mut Criterion) {
    let response = scan_response(4);
    let mut group = c.benchmark_group("assembler");
    group.throughput(Throughput::Bytes(response.len() as u64));

    group.bench_function("feed_response", |b| {
        let mut assembler = LineAssembler::new(1024, 64);
        b.iter(|| {
            assembler.begin_response();
            let mut last = Feed::Pending;
            for &byte in &response {
                last = assembler.feed(black_box(byte));
            }
            black_box(last)
        })
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let response = scan_response(4);
    let mut group = c.benchmark_group("session");
    group.throughput(Throughput::Bytes(response.len() as u64));

    group.bench_function("execute_and_poll", |b| {
        let mut mock = MockTransport::new();
        let mut session = AtSession::new(&mut mock);
        b.iter(|| {
            session.execute("CWLAP", &[]).unwrap();
            session.transport_mut().push_inbound(&response);
            session.poll().unwrap();
            black_box(session.outcome())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_assembler, bench_session);
criterion_main!(benches);
