use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use rift_core::buffer::Buffer;

fn buffer_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_insertion");

    group.bench_function("insert_char_end", |b| {
        b.iter_batched(
            Buffer::new,
            |mut buf| {
                for _ in 0..100 {
                    let at = buf.len();
                    buf.replace_bytes(at, 0, black_box(b"a")).unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });

    static TEXT: &[u8] = b"The quick brown fox jumps over the lazy dog. ";
    group.throughput(Throughput::Bytes(TEXT.len() as u64));
    group.bench_function("insert_str_small", |b| {
        b.iter_batched(
            Buffer::new,
            |mut buf| {
                buf.replace_bytes(0, 0, black_box(TEXT)).unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn buffer_deletion(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_deletion");

    let setup_buf = || {
        let mut buf = Buffer::new();
        for _ in 0..100 {
            let at = buf.len();
            buf.replace_bytes(at, 0, b"Some text to delete. ").unwrap();
        }
        buf
    };

    group.bench_function("delete_backward", |b| {
        b.iter_batched(
            setup_buf,
            |mut buf| {
                for _ in 0..50 {
                    let at = buf.len();
                    if at > 0 {
                        buf.replace_bytes(at - 1, 1, b"").unwrap();
                    }
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn buffer_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_access");

    let setup_large_buf = || {
        let mut buf = Buffer::new();
        let line = b"This is a line of text for testing buffer access speeds.\n";
        for _ in 0..10_000 {
            let at = buf.len();
            buf.replace_bytes(at, 0, line).unwrap();
        }
        buf
    };

    group.bench_function("iter_full", |b| {
        let buf = setup_large_buf();
        b.iter(|| {
            let mut cur = buf.iter_at(0);
            while let Some((c, next)) = cur.next_codepoint(buf.store()) {
                black_box(c);
                cur = next;
            }
        })
    });

    group.bench_function("bytes_in_random_line", |b| {
        let buf = setup_large_buf();
        let total_lines = buf.line_count();
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 13) % total_lines;
            let mut cur = buf.iter_at(0);
            for _ in 0..i {
                cur = cur.next_line(buf.store()).unwrap();
            }
            let start = cur.byte_offset(buf.store());
            let end = cur.eol(buf.store()).byte_offset(buf.store());
            black_box(buf.store().bytes_in(start..end));
        })
    });

    group.finish();
}

criterion_group!(benches, buffer_insertion, buffer_deletion, buffer_access);
criterion_main!(benches);
