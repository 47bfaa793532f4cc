// Command-line front end for the ring buffer benchmark.
//
// A single configuration prints the average run time in milliseconds and
// nothing else, so shell sweeps can capture it directly.

use semring::bench::{run_samples, run_sweep};
use semring::config::{parse_args, Command, TRACE_DIR_ENV};
use semring::rb_info;
use std::{env, io, path::PathBuf, process};

fn main() {
   let cmd = match parse_args(env::args().skip(1)) {
      Ok(cmd) => cmd,
      Err(e) => {
         eprintln!("error: {}", e);
         process::exit(1);
      }
   };

   let result = match cmd {
      Command::Run(cfg) => {
         let cfg = cfg.trace_dir(env::var_os(TRACE_DIR_ENV).map(PathBuf::from));
         rb_info!(
            "buffer={} producers={} consumers={} items={} samples={}",
            cfg.buffer_size, cfg.producers, cfg.consumers, cfg.items, cfg.samples
         );
         run_samples(&cfg)
            .map(|summary| println!("{}", summary.avg_ms))
            .map_err(|e| e.to_string())
      }
      Command::Sweep(cfg) => {
         let stdout = io::stdout();
         let mut out = stdout.lock();
         run_sweep(&cfg, &mut out).map_err(|e| e.to_string())
      }
   };

   if let Err(msg) = result {
      eprintln!("error: {}", msg);
      process::exit(1);
   }
}
