//! Micro benchmarks for the limiter pool and the interceptor chain.
//! Pure CPU - no network, no IO.
//!
//! ```bash
//! cargo bench --bench bench_rate_limit
//! ```

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grpcx::chain::{unary_handler, UnaryChain};
use grpcx::interceptors::{IpFilter, Logging, RateLimit, Recovery};
use grpcx::logger::{Logger, SharedLogger};
use grpcx::security::RateLimiterPool;
use grpcx::CallContext;

// Keeps log formatting out of the measurements.
struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _args: std::fmt::Arguments<'_>) {}
    fn error(&self, _args: std::fmt::Arguments<'_>) {}
}

fn null_logger() -> SharedLogger {
    Arc::new(NullLogger)
}

fn bench_pool_allow(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_allow");
    group.throughput(Throughput::Elements(1));

    // Effectively unlimited so every call takes the same path.
    let pool = RateLimiterPool::new(1e12, u32::MAX).unwrap_or_default();
    group.bench_function("hot_key", |b| {
        b.iter(|| black_box(pool.allow(black_box("10.0.0.1"))))
    });

    for keys in [1_000usize, 100_000] {
        let names: Vec<String> = (0..keys)
            .map(|i| format!("10.{}.{}.{}", i >> 16, (i >> 8) & 0xff, i & 0xff))
            .collect();
        group.bench_with_input(BenchmarkId::new("cold_keys", keys), &names, |b, names| {
            b.iter_batched(
                || RateLimiterPool::new(1e12, u32::MAX).unwrap_or_default(),
                |pool| {
                    for name in names {
                        black_box(pool.allow(name));
                    }
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => panic!("failed to build tokio runtime: {e}"),
    };
    let handler =
        unary_handler(|_ctx: CallContext, req: u64| async move { Ok::<u64, grpcx::Status>(req) });
    let pool = Arc::new(RateLimiterPool::new(1e12, u32::MAX).unwrap_or_default());

    let empty: UnaryChain<u64, u64> = UnaryChain::default();
    let standard: UnaryChain<u64, u64> = UnaryChain::default()
        .with(Recovery::new("bench").with_logger(null_logger()))
        .with(Logging::new("bench").with_logger(null_logger()))
        .with(IpFilter::denylist(vec![]).with_logger(null_logger()))
        .with(RateLimit::per_peer(pool).with_logger(null_logger()));

    let ctx = CallContext::new("/bench.Svc/Call").with_peer(([10, 0, 0, 1], 5000).into());

    let mut group = c.benchmark_group("unary_chain");
    for (name, chain) in [("empty", empty), ("standard", standard)] {
        let composed = chain.compose(Arc::clone(&handler));
        let ctx = ctx.clone();
        group.bench_function(name, |b| {
            b.to_async(&rt).iter(|| {
                let composed = Arc::clone(&composed);
                let ctx = ctx.clone();
                async move { black_box(composed(ctx, 7).await) }
            })
        });
    }
    group.finish();
}

criterion_group!(rate_limit_benches, bench_pool_allow, bench_chain);
criterion_main!(rate_limit_benches);
