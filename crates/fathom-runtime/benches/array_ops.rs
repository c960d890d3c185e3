use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fathom_runtime::Array;

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_push");
    for size in [16usize, 1_024, 65_536] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut array = Array::<f64>::new();
                for i in 0..size {
                    array.push(&[i as f64]).unwrap();
                }
                black_box(array.len())
            });
        });
    }
    group.finish();
}

fn bench_sparse_set(c: &mut Criterion) {
    c.bench_function("array_sparse_set", |b| {
        b.iter(|| {
            let mut array = Array::<i32>::new();
            for i in (0..4_096u32).step_by(64) {
                array.set(black_box(i), i as i32).unwrap();
            }
            black_box(array.capacity())
        });
    });
}

fn bench_shift(c: &mut Criterion) {
    c.bench_function("array_shift_drain", |b| {
        b.iter(|| {
            let mut array = Array::<i32>::with_len(1_024).unwrap();
            while array.shift().is_ok() {}
            black_box(array.len())
        });
    });
}

criterion_group!(benches, bench_push, bench_sparse_set, bench_shift);
criterion_main!(benches);
