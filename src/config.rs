// Benchmark parameters and their command-line form.
//
//   ringbench <buffer_size> <num_producers> <num_consumers> <num_items> <samples>
//   ringbench sweep [num_items] [max_threads] [runs]
//
// RINGBENCH_TRACE_DIR, when set, turns on the operation trace for single runs
// and names the directory the trace files go to.

use crate::workload::DEFAULT_VALUE_RANGE;
use std::{fmt, ops::RangeInclusive, path::PathBuf};

pub const TRACE_DIR_ENV: &str = "RINGBENCH_TRACE_DIR";

pub const USAGE: &str = "usage: ringbench <buffer_size> <num_producers> <num_consumers> <num_items> <samples>\n       \
                         ringbench sweep [num_items] [max_threads] [runs]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
   /// Wrong number of arguments.
   Usage,
   NotANumber { name: &'static str, value: String },
   Zero { name: &'static str },
}

impl fmt::Display for ConfigError {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         ConfigError::Usage => f.write_str(USAGE),
         ConfigError::NotANumber { name, value } => {
            write!(f, "{} must be a positive integer, got {:?}", name, value)
         }
         ConfigError::Zero { name } => write!(f, "{} must be greater than zero", name),
      }
   }
}

impl std::error::Error for ConfigError {}

fn positive(name: &'static str, value: &str) -> Result<usize, ConfigError> {
   let n: usize = value.parse().map_err(|_| ConfigError::NotANumber {
      name,
      value: value.to_owned(),
   })?;
   if n == 0 {
      return Err(ConfigError::Zero { name });
   }
   Ok(n)
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  single configuration                                                    */
/*──────────────────────────────────────────────────────────────────────────*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
   pub buffer_size: usize,
   pub producers  : usize,
   pub consumers  : usize,
   /// Total across all producers; split evenly, remainder dropped.
   pub items      : usize,
   pub samples    : usize,
   pub value_range: RangeInclusive<i32>,
   /// Where to write the operation trace; `None` disables tracing.
   pub trace_dir  : Option<PathBuf>,
}

impl BenchConfig {
   pub fn new(buffer_size: usize, producers: usize, consumers: usize, items: usize) -> Self {
      Self {
         buffer_size,
         producers,
         consumers,
         items,
         samples: 1,
         value_range: DEFAULT_VALUE_RANGE,
         trace_dir: None,
      }
   }

   pub fn samples(mut self, samples: usize) -> Self {
      self.samples = samples;
      self
   }

   pub fn value_range(mut self, range: RangeInclusive<i32>) -> Self {
      self.value_range = range;
      self
   }

   pub fn trace_dir(mut self, dir: Option<PathBuf>) -> Self {
      self.trace_dir = dir;
      self
   }

   /// Zero when there are no producers.
   #[inline]
   pub fn items_per_producer(&self) -> usize {
      self.items.checked_div(self.producers).unwrap_or(0)
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  parameter sweep                                                         */
/*──────────────────────────────────────────────────────────────────────────*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
   pub items      : usize,
   /// Producers and consumers each range over `1..=max_threads`.
   pub max_threads: usize,
   pub runs       : usize,
   pub min_buffer : usize,
   pub max_buffer : usize,
}

impl Default for SweepConfig {
   fn default() -> Self {
      Self {
         items: 10_000,
         max_threads: 8,
         runs: 10,
         min_buffer: 16,
         max_buffer: 1 << 12,
      }
   }
}

impl SweepConfig {
   /// `min_buffer`, doubling, up to and including `max_buffer`.
   pub fn buffer_sizes(&self) -> impl Iterator<Item = usize> {
      let max = self.max_buffer;
      std::iter::successors(Some(self.min_buffer), |&n| n.checked_mul(2))
         .take_while(move |&n| n <= max)
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  argv                                                                    */
/*──────────────────────────────────────────────────────────────────────────*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
   Run(BenchConfig),
   Sweep(SweepConfig),
}

/// Parse arguments, program name already stripped.
pub fn parse_args<I>(args: I) -> Result<Command, ConfigError>
where
   I: IntoIterator<Item = String>,
{
   let args: Vec<String> = args.into_iter().collect();

   if args.first().map(String::as_str) == Some("sweep") {
      let rest = &args[1..];
      if rest.len() > 3 {
         return Err(ConfigError::Usage);
      }
      let mut cfg = SweepConfig::default();
      if let Some(v) = rest.first() {
         cfg.items = positive("num_items", v)?;
      }
      if let Some(v) = rest.get(1) {
         cfg.max_threads = positive("max_threads", v)?;
      }
      if let Some(v) = rest.get(2) {
         cfg.runs = positive("runs", v)?;
      }
      return Ok(Command::Sweep(cfg));
   }

   let [buffer_size, producers, consumers, items, samples] = args.as_slice() else {
      return Err(ConfigError::Usage);
   };

   let cfg = BenchConfig::new(
      positive("buffer_size", buffer_size)?,
      positive("num_producers", producers)?,
      positive("num_consumers", consumers)?,
      positive("num_items", items)?,
   )
   .samples(positive("samples", samples)?);

   Ok(Command::Run(cfg))
}

#[cfg(test)]
mod tests {
   use super::*;

   fn args(s: &str) -> Vec<String> {
      s.split_whitespace().map(String::from).collect()
   }

   #[test]
   fn parses_single_run() {
      let cmd = parse_args(args("64 2 3 1000 5")).unwrap();
      let Command::Run(cfg) = cmd else { panic!("expected a single run") };
      assert_eq!(cfg.buffer_size, 64);
      assert_eq!(cfg.producers, 2);
      assert_eq!(cfg.consumers, 3);
      assert_eq!(cfg.items, 1000);
      assert_eq!(cfg.samples, 5);
      assert_eq!(cfg.items_per_producer(), 500);
      assert_eq!(cfg.trace_dir, None);
   }

   #[test]
   fn rejects_bad_arguments() {
      assert_eq!(parse_args(args("64 2 3 1000")), Err(ConfigError::Usage));
      assert_eq!(parse_args(args("64 0 3 1000 5")), Err(ConfigError::Zero { name: "num_producers" }));
      assert!(matches!(
         parse_args(args("64 2 x 1000 5")),
         Err(ConfigError::NotANumber { name: "num_consumers", .. })
      ));
      assert!(matches!(
         parse_args(args("-4 2 3 1000 5")),
         Err(ConfigError::NotANumber { name: "buffer_size", .. })
      ));
   }

   #[test]
   fn sweep_defaults_and_overrides() {
      assert_eq!(parse_args(args("sweep")), Ok(Command::Sweep(SweepConfig::default())));

      let Ok(Command::Sweep(cfg)) = parse_args(args("sweep 500 2")) else { panic!("expected a sweep") };
      assert_eq!(cfg.items, 500);
      assert_eq!(cfg.max_threads, 2);
      assert_eq!(cfg.runs, 10);

      assert_eq!(parse_args(args("sweep 1 2 3 4")), Err(ConfigError::Usage));
   }

   #[test]
   fn sweep_buffer_sizes_double() {
      let sizes: Vec<_> = SweepConfig::default().buffer_sizes().collect();
      assert_eq!(sizes, vec![16, 32, 64, 128, 256, 512, 1024, 2048, 4096]);
   }

   #[test]
   fn items_split_drops_remainder() {
      assert_eq!(BenchConfig::new(8, 3, 1, 10).items_per_producer(), 3);
   }

   #[test]
   fn no_producers_means_no_items_each() {
      assert_eq!(BenchConfig::new(8, 0, 1, 10).items_per_producer(), 0);
   }
}
