//! Benchmarks for serial line parsing and demultiplexing

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use head_orientation::{
    records::{EcgRecord, ImuRecord, RecordLog},
    serial::{parse_line, Demultiplexer},
    source::Command,
};
use rand::Rng;
use std::collections::VecDeque;

/// Interleaved stream, one IMU line per ten ECG lines, with the odd corrupted line
fn synthetic_stream(lines: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut stream = String::with_capacity(lines * 32);
    for i in 0..lines {
        if i % 97 == 0 {
            stream.push_str("ECG,12x\n");
        } else if i % 10 == 0 {
            let v: Vec<String> = (0..6).map(|_| format!("{:.4}", rng.gen_range(-2.0..2.0))).collect();
            stream.push_str(&format!("IMU,{}\n", v.join(",")));
        } else {
            stream.push_str(&format!("ECG,{}\n", rng.gen_range(0..1024)));
        }
    }
    stream
}

fn benchmark_parse_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");

    for (name, line) in [
        ("ecg", "ECG,512"),
        ("imu", "IMU,0.1,0.2,0.3,0.01,0.02,0.03"),
        ("malformed", "FOO,1,2"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(parse_line(black_box(line), String::new())));
        });
    }

    group.finish();
}

fn benchmark_demultiplex(c: &mut Criterion) {
    let mut group = c.benchmark_group("demultiplex");
    let stream = synthetic_stream(1000);
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("stream_1000_lines", |b| {
        b.iter(|| {
            let mut demux = Demultiplexer::new(
                stream.as_bytes(),
                RecordLog::<EcgRecord, Vec<u8>>::from_writer(Vec::new()).unwrap(),
                RecordLog::<ImuRecord, Vec<u8>>::from_writer(Vec::new()).unwrap(),
            );
            black_box(demux.run(&mut VecDeque::<Command>::new()).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse_line, benchmark_demultiplex);
criterion_main!(benches);
