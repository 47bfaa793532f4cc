use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use semring::bench::run_benchmark;
use semring::config::BenchConfig;
use semring::{CountingSemaphore, NamedSemaphore, OsSemaphore, RingBuffer};

const ITEMS: usize = 10_000;
const CAPACITIES: [usize; 5] = [16, 64, 256, 1024, 4096];

// Uncontended push + pop on one thread: two semaphore round trips and two
// lock acquisitions per iteration.
fn bench_push_pop_pair<S: CountingSemaphore>(c: &mut Criterion, label: &str) {
   let rb = RingBuffer::<usize, S>::with_semaphore(64, false).expect("ring");
   c.bench_function(label, |b| {
      b.iter(|| {
         rb.push(black_box(1)).unwrap();
         black_box(rb.pop().unwrap());
      })
   });
}

fn bench_os_pair(c: &mut Criterion) {
   bench_push_pop_pair::<OsSemaphore>(c, "push+pop (os semaphore)");
}

fn bench_named_pair(c: &mut Criterion) {
   bench_push_pop_pair::<NamedSemaphore>(c, "push+pop (named semaphore)");
}

// Full producer/consumer runs, prime-testing workload included.
fn bench_capacity(c: &mut Criterion) {
   let mut group = c.benchmark_group("run by capacity (4p/4c)");
   group.throughput(Throughput::Elements(ITEMS as u64));

   for cap in CAPACITIES {
      group.bench_with_input(BenchmarkId::from_parameter(cap), &cap, |b, &cap| {
         let cfg = BenchConfig::new(cap, 4, 4, ITEMS);
         b.iter(|| run_benchmark(&cfg).unwrap().elapsed)
      });
   }
   group.finish();
}

fn bench_thread_mix(c: &mut Criterion) {
   let mut group = c.benchmark_group("run by thread mix (cap 256)");
   group.throughput(Throughput::Elements(ITEMS as u64));

   for (p, q) in [(1, 1), (1, 8), (8, 1), (4, 4), (8, 8)] {
      let id = format!("{}p/{}c", p, q);
      group.bench_function(BenchmarkId::from_parameter(id), |b| {
         let cfg = BenchConfig::new(256, p, q, ITEMS);
         b.iter(|| run_benchmark(&cfg).unwrap().elapsed)
      });
   }
   group.finish();
}

// Criterion setup
fn custom_criterion() -> Criterion {
   Criterion::default()
      .warm_up_time(Duration::from_secs(2))
      .measurement_time(Duration::from_secs(10))
      .sample_size(50)
}

criterion_group!{
   name = benches;
   config = custom_criterion();
   targets =
      bench_os_pair,
      bench_named_pair,
      bench_capacity,
      bench_thread_mix
}
criterion_main!(benches);
