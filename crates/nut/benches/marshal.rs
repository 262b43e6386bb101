//! Marshalling benchmarks
//!
//! Measures the host side of the boundary:
//! - Single typed push and read
//! - Tuple push and pop
//! - Script calls into a registered host function

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nut::{ScriptStatus, Session};

fn bench_single_round_trip(c: &mut Criterion) {
    let session = Session::new();
    let stack = session.stack();

    c.bench_function("push_read_float", |b| {
        b.iter(|| {
            stack.push(black_box(1998.1));
            let value: f64 = stack.read(-1);
            stack.pop(1);
            value
        })
    });

    c.bench_function("push_read_string", |b| {
        b.iter(|| {
            stack.push(black_box("blah"));
            let value: String = stack.read(-1);
            stack.pop(1);
            value
        })
    });
}

fn bench_tuple_round_trip(c: &mut Criterion) {
    let session = Session::new();
    let stack = session.stack();

    c.bench_function("push_pop_tuple_4", |b| {
        b.iter(|| {
            stack.push_values(black_box((1.0, "hello", 2.0, 3.0)));
            let values: (f64, String, f64, f64) = stack.pop_values();
            values
        })
    });

    c.bench_function("guarded_scratch_pushes", |b| {
        b.iter(|| {
            let _guard = stack.guard();
            for n in 0..16_i64 {
                stack.push(black_box(n));
            }
        })
    });
}

fn bench_native_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("native_dispatch");

    for calls in [1_usize, 100] {
        let mut session = Session::new();
        session.register_function("add", |a: i64, b: i64| a + b);
        let source = format!(
            "local i = 0; local sum = 0; while (i < {}) {{ sum = add(sum, i); i = i + 1; }}",
            calls
        );

        group.bench_with_input(BenchmarkId::from_parameter(calls), &source, |b, source| {
            b.iter(|| {
                let status = session.run_script(black_box(source));
                assert_eq!(status, ScriptStatus::Completed);
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_round_trip,
    bench_tuple_round_trip,
    bench_native_dispatch
);
criterion_main!(benches);
