// Benchmark driver.
//
// One run: build a ring, start N producers and M consumers on it, join the
// producers, push one sentinel, join the consumers. The wall clock covers
// thread start-up through the last consumer exiting.

use crate::config::{BenchConfig, SweepConfig};
use crate::ring::RingBuffer;
use crate::sync::CountingSemaphore;
use crate::workload::{ConsumerReport, PrimeNumberConsumer, ProducerReport, RandomIntProducer, SENTINEL};
use crate::SyncError;
use std::{
   fmt, fs,
   io::{self, BufWriter, Write},
   path::{Path, PathBuf},
   time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

#[derive(Debug)]
pub enum BenchError {
   Sync(SyncError),
   Io(io::Error),
}

impl fmt::Display for BenchError {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         BenchError::Sync(e) => fmt::Display::fmt(e, f),
         BenchError::Io(e) => write!(f, "i/o error: {}", e),
      }
   }
}

impl std::error::Error for BenchError {
   fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
      match self {
         BenchError::Sync(e) => Some(e),
         BenchError::Io(e) => Some(e),
      }
   }
}

impl From<SyncError> for BenchError {
   fn from(e: SyncError) -> Self {
      BenchError::Sync(e)
   }
}

impl From<io::Error> for BenchError {
   fn from(e: io::Error) -> Self {
      BenchError::Io(e)
   }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
   pub elapsed : Duration,
   pub produced: usize,
   pub consumer: ConsumerReport,
   /// Per-consumer breakdown, in spawn order.
   pub per_consumer: Vec<ConsumerReport>,
   pub trace_file: Option<PathBuf>,
}

impl RunReport {
   /// Elapsed time in milliseconds at microsecond resolution.
   pub fn elapsed_ms(&self) -> f64 {
      self.elapsed.as_micros() as f64 / 1000.0
   }
}

/// Run one producer/consumer round as described by `cfg`.
///
/// # Panics
/// If `cfg` asks for zero producers, consumers or buffer slots.
pub fn run_benchmark(cfg: &BenchConfig) -> Result<RunReport, SyncError> {
   assert!(cfg.producers > 0, "need at least one producer");
   assert!(cfg.consumers > 0, "need at least one consumer");

   let ring = if cfg.trace_dir.is_some() {
      RingBuffer::with_trace(cfg.buffer_size)?
   } else {
      RingBuffer::new(cfg.buffer_size)?
   };
   let per_producer = cfg.items_per_producer();

   crate::rb_debug!(
      "run: buffer={} producers={} consumers={} items/producer={}",
      cfg.buffer_size, cfg.producers, cfg.consumers, per_producer
   );

   let start = Instant::now();
   let (produced, per_consumer) = drive(&ring, cfg.producers, cfg.consumers, |_, ring| {
      RandomIntProducer::with_range(ring, per_producer, cfg.value_range.clone()).run()
   })?;
   let elapsed = start.elapsed();

   let mut consumer = ConsumerReport::default();
   for r in &per_consumer {
      consumer += *r;
   }

   let trace_file = match (&cfg.trace_dir, ring.take_trace()) {
      (Some(dir), Some(ops)) => match dump_trace(dir, ring.capacity(), &ops) {
         Ok(path) => Some(path),
         Err(e) => {
            crate::rb_warn!("could not write operation trace to {}: {}", dir.display(), e);
            None
         }
      },
      _ => None,
   };

   Ok(RunReport { elapsed, produced, consumer, per_consumer, trace_file })
}

/// Run `producers` copies of `produce` and `consumers` prime-counting
/// consumers against `ring`, then shut the consumers down with one sentinel.
///
/// `produce` gets the producer's index. Producer failures and panics are
/// collected rather than returned early: the sentinel still goes in once
/// every producer has been joined, so consumers are never stranded. The
/// first failure seen is returned after all threads are joined.
pub fn drive<S, P>(
   ring: &RingBuffer<i32, S>,
   producers: usize,
   consumers: usize,
   produce: P,
) -> Result<(usize, Vec<ConsumerReport>), SyncError>
where
   S: CountingSemaphore,
   P: Fn(usize, &RingBuffer<i32, S>) -> Result<ProducerReport, SyncError> + Sync,
{
   let produce = &produce;

   let scoped = crossbeam::thread::scope(|s| -> Result<(usize, Vec<ConsumerReport>), SyncError> {
      let producer_handles: Vec<_> = (0..producers)
         .map(|id| s.spawn(move |_| produce(id, ring)))
         .collect();
      let consumer_handles: Vec<_> = (0..consumers)
         .map(|_| s.spawn(move |_| PrimeNumberConsumer::new(ring).run()))
         .collect();

      let mut produced = 0;
      let mut first_err = None;
      for handle in producer_handles {
         match handle.join() {
            Ok(Ok(report)) => produced += report.produced,
            Ok(Err(e)) => {
               first_err.get_or_insert(e);
            }
            Err(_) => {
               first_err.get_or_insert(SyncError::WorkerPanicked { role: "producer" });
            }
         }
      }

      if let Some(e) = &first_err {
         crate::rb_warn!("producer failed ({}), shutting consumers down", e);
      }
      ring.push(SENTINEL)?;

      let mut reports = Vec::with_capacity(consumer_handles.len());
      for handle in consumer_handles {
         match handle.join() {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
               first_err.get_or_insert(e);
            }
            Err(_) => {
               first_err.get_or_insert(SyncError::WorkerPanicked { role: "consumer" });
            }
         }
      }

      match first_err {
         Some(e) => Err(e),
         None => Ok((produced, reports)),
      }
   });

   match scoped {
      Ok(result) => result.map_err(|e| {
         crate::rb_error!("benchmark run aborted: {}", e);
         e
      }),
      Err(_) => Err(SyncError::WorkerPanicked { role: "worker" }),
   }
}

/// Average of `cfg.samples` runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
   pub runs_ms: Vec<f64>,
   pub avg_ms : f64,
}

pub fn run_samples(cfg: &BenchConfig) -> Result<SampleSummary, SyncError> {
   let mut runs_ms = Vec::with_capacity(cfg.samples);
   for _ in 0..cfg.samples {
      runs_ms.push(run_benchmark(cfg)?.elapsed_ms());
   }
   let avg_ms = if runs_ms.is_empty() {
      0.0
   } else {
      runs_ms.iter().sum::<f64>() / runs_ms.len() as f64
   };
   Ok(SampleSummary { runs_ms, avg_ms })
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  sweep                                                                   */
/*──────────────────────────────────────────────────────────────────────────*/

pub fn sweep_header() -> String {
   format!(
      "{:<15}{:<20}{:<20}{:<15}",
      "buffer_size", "producer_threads", "consumer_threads", "avg_time"
   )
}

pub fn sweep_row(buffer_size: usize, producers: usize, consumers: usize, avg_ms: f64) -> String {
   format!("{:<15}{:<20}{:<20}{:<15.6}", buffer_size, producers, consumers, avg_ms)
}

/// Every buffer size × producer count × consumer count in `cfg`, one row
/// each, written to `out` as it completes.
pub fn run_sweep<W: Write>(cfg: &SweepConfig, out: &mut W) -> Result<(), BenchError> {
   writeln!(out, "{}", sweep_header())?;

   for buffer_size in cfg.buffer_sizes() {
      for producers in 1..=cfg.max_threads {
         for consumers in 1..=cfg.max_threads {
            let run = BenchConfig::new(buffer_size, producers, consumers, cfg.items)
               .samples(cfg.runs);
            let summary = run_samples(&run)?;
            crate::rb_info!(
               "sweep buffer={} producers={} consumers={} avg={:.3}ms",
               buffer_size, producers, consumers, summary.avg_ms
            );
            writeln!(out, "{}", sweep_row(buffer_size, producers, consumers, summary.avg_ms))?;
            out.flush()?;
         }
      }
   }
   Ok(())
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  operation trace                                                         */
/*──────────────────────────────────────────────────────────────────────────*/

/// Write `ops` one per line to `<dir>/operations_<capacity>_<unix_millis>.txt`.
pub fn dump_trace(dir: &Path, capacity: usize, ops: &[i8]) -> io::Result<PathBuf> {
   let millis = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis())
      .unwrap_or(0);

   fs::create_dir_all(dir)?;
   let path = dir.join(format!("operations_{}_{}.txt", capacity, millis));

   let mut file = BufWriter::new(fs::File::create(&path)?);
   for op in ops {
      writeln!(file, "{}", op)?;
   }
   file.flush()?;

   crate::rb_debug!("wrote {} operations to {}", ops.len(), path.display());
   Ok(path)
}
