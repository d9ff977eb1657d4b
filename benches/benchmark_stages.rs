use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use weir::{channel::drain, stage, CancellationToken, Pipeline, PipelineOptionsBuilder};

pub fn take_repeat_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("TakeRepeat");
    for power in 0..14 {
        let size = 1 << power;
        group.throughput(criterion::Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let token = CancellationToken::new();
                let got = drain(stage::take(&token, stage::repeat(&token, [1u64, 2, 3]), size));
                token.cancel();
                got
            });
        });
    }
    group.finish();
}

pub fn tee_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tee");
    for capacity in [0, 8, 64] {
        const SIZE: usize = 1 << 12;
        group.throughput(criterion::Throughput::Elements(SIZE as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                let pipeline = Pipeline::new(
                    PipelineOptionsBuilder::default()
                        .capacity(capacity)
                        .build()
                        .unwrap(),
                );
                b.iter(|| {
                    let token = CancellationToken::new();
                    let (left, right) = pipeline.tee(&token, weir::channel::from_values(0..SIZE));
                    let reader = std::thread::spawn(move || right.iter().count());
                    let total = left.iter().count() + reader.join().unwrap();
                    assert_eq!(total, 2 * SIZE);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, take_repeat_benchmark, tee_benchmark);
criterion_main!(benches);
