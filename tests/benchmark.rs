// semring/tests/benchmark.rs

use semring::bench::{run_benchmark, run_sweep};
use semring::config::{BenchConfig, SweepConfig};
use semring::ring::{OP_POP, OP_PUSH};

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn within<T, F>(secs: u64, f: F) -> T
where
   T: Send + 'static,
   F: FnOnce() -> T + Send + 'static,
{
   let (tx, rx) = mpsc::channel();
   thread::spawn(move || {
      let _ = tx.send(f());
   });
   rx.recv_timeout(Duration::from_secs(secs))
      .expect("did not finish in time (deadlock?) or panicked")
}

fn scratch_dir(tag: &str) -> PathBuf {
   std::env::temp_dir().join(format!("semring_{}_{}", tag, std::process::id()))
}

#[test]
fn test_three_producers_four_consumers_capacity_eight() {
   let report = within(30, || run_benchmark(&BenchConfig::new(8, 3, 4, 300)).unwrap());

   assert_eq!(report.produced, 300);
   assert_eq!(report.per_consumer.len(), 4, "every consumer must finish");
   assert_eq!(report.consumer.consumed, 300);
   assert_eq!(
      report.per_consumer.iter().map(|r| r.consumed).sum::<usize>(),
      300
   );
   assert!(report.consumer.primes_found <= report.consumer.consumed);
   assert!(report.elapsed_ms() >= 0.0);
   assert_eq!(report.trace_file, None);
}

#[test]
fn test_item_count_not_divisible_by_producers() {
   // 100 / 3 = 33 each, the remainder is not produced
   let report = within(30, || run_benchmark(&BenchConfig::new(4, 3, 2, 100)).unwrap());
   assert_eq!(report.produced, 99);
   assert_eq!(report.consumer.consumed, 99);
}

#[test]
fn test_more_consumers_than_items() {
   let report = within(30, || run_benchmark(&BenchConfig::new(2, 1, 8, 3)).unwrap());
   assert_eq!(report.per_consumer.len(), 8);
   assert_eq!(report.consumer.consumed, 3);
}

#[test]
fn test_primes_are_counted() {
   // only 2, 3, 4, 5 can be drawn; 3 of 4 are prime
   let cfg = BenchConfig::new(16, 2, 2, 2_000).value_range(2..=5);
   let report = within(30, move || run_benchmark(&cfg).unwrap());
   let c = report.consumer;
   assert_eq!(c.consumed, 2_000);
   assert!(c.primes_found > c.consumed / 2, "{:?}", c);
   assert!(c.primes_found < c.consumed, "{:?}", c);
}

#[test]
fn test_operation_trace_is_written() {
   let dir = scratch_dir("trace");
   let cfg = BenchConfig::new(4, 2, 3, 50).trace_dir(Some(dir.clone()));
   let report = within(30, move || run_benchmark(&cfg).unwrap());

   let path = report.trace_file.expect("trace file path");
   assert!(path.starts_with(&dir));
   let name = path.file_name().unwrap().to_string_lossy().into_owned();
   assert!(name.starts_with("operations_4_") && name.ends_with(".txt"), "{}", name);

   let ops: Vec<i8> = fs::read_to_string(&path)
      .unwrap()
      .lines()
      .map(|l| l.parse().unwrap())
      .collect();
   let pushes = ops.iter().filter(|&&op| op == OP_PUSH).count();
   let pops = ops.iter().filter(|&&op| op == OP_POP).count();

   // 50 items + the driver's sentinel + one re-push per consumer
   assert_eq!(pushes, 50 + 1 + 3);
   // 50 items + one sentinel pop per consumer
   assert_eq!(pops, 50 + 3);

   // the ring never goes negative or above capacity along the trace
   let mut live: i64 = 0;
   for op in &ops {
      live += i64::from(*op);
      assert!((0..=4).contains(&live), "live={} in {:?}", live, ops);
   }
   assert_eq!(live, 1, "the final sentinel stays in the ring");

   let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_small_sweep_prints_every_combination() {
   let cfg = SweepConfig {
      items: 40,
      max_threads: 2,
      runs: 2,
      min_buffer: 16,
      max_buffer: 32,
   };
   let out = within(60, move || {
      let mut out = Vec::new();
      run_sweep(&cfg, &mut out).unwrap();
      String::from_utf8(out).unwrap()
   });

   let lines: Vec<&str> = out.lines().collect();
   assert!(lines[0].starts_with("buffer_size"));
   // 2 buffer sizes x 2 producer counts x 2 consumer counts
   assert_eq!(lines.len(), 1 + 8);

   let first: Vec<&str> = lines[1].split_whitespace().collect();
   assert_eq!(&first[..3], &["16", "1", "1"]);
   assert!(first[3].parse::<f64>().is_ok());

   let last: Vec<&str> = lines[8].split_whitespace().collect();
   assert_eq!(&last[..3], &["32", "2", "2"]);
}
