use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ralign::{
  Malloc,
  bench::{Custom, MATRIX, Reference, StdAlloc, Strategy},
};

fn bench_alloc_free(c: &mut Criterion) {
  let strategies: [&dyn Strategy; 3] = [&Reference, &Custom::<Malloc>::default(), &StdAlloc];

  for config in MATRIX {
    let mut group = c.benchmark_group(format!("alloc_free/{}B@{}", config.size, config.alignment));

    for strategy in strategies {
      group.bench_with_input(
        BenchmarkId::from_parameter(strategy.label()),
        &config,
        |b, config| {
          b.iter(|| unsafe {
            let ptr = black_box(strategy.allocate(config.size, config.alignment));
            assert!(!ptr.is_null());
            strategy.release(ptr, config.size, config.alignment);
          })
        },
      );
    }

    group.finish();
  }
}

criterion_group!(aligned_alloc, bench_alloc_free);
criterion_main!(aligned_alloc);
