// =============================================================================
// LOGGING - COMPILE-TIME FILTERED
// =============================================================================
//
// Levels are selected with Cargo features, not at run time:
// - no_logs:   nothing is emitted
// - log_info:  ERROR, WARN, INFO (default)
// - log_trace: every level, including one line per semaphore create/destroy
//
// A disabled level expands to `if false { .. }`, so its arguments still
// type-check but no code survives optimisation.
//
// Everything goes to stderr. Stdout belongs to benchmark results.
//
// =============================================================================

use std::fmt;
use std::io::Write;

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";

#[doc(hidden)]
pub fn emit(prefix: &str, args: fmt::Arguments<'_>) {
   let stderr = std::io::stderr();
   let mut out = stderr.lock();
   // a closed stderr is not worth failing a benchmark over
   let _ = writeln!(out, "{}{}", prefix, args);
}

// -----------------------------------------------------------------------------
// ERROR / WARN - on unless no_logs
// -----------------------------------------------------------------------------

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! rb_error {
   ($($arg:tt)*) => {
      $crate::log::emit($crate::log::P_ERROR, format_args!($($arg)*))
   };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! rb_error {
   ($($arg:tt)*) => {
      if false { $crate::log::emit($crate::log::P_ERROR, format_args!($($arg)*)) }
   };
}

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! rb_warn {
   ($($arg:tt)*) => {
      $crate::log::emit($crate::log::P_WARN, format_args!($($arg)*))
   };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! rb_warn {
   ($($arg:tt)*) => {
      if false { $crate::log::emit($crate::log::P_WARN, format_args!($($arg)*)) }
   };
}

// -----------------------------------------------------------------------------
// INFO - log_info or log_trace
// -----------------------------------------------------------------------------

#[cfg(all(any(feature = "log_info", feature = "log_trace"), not(feature = "no_logs")))]
#[macro_export]
macro_rules! rb_info {
   ($($arg:tt)*) => {
      $crate::log::emit($crate::log::P_INFO, format_args!($($arg)*))
   };
}

#[cfg(not(all(any(feature = "log_info", feature = "log_trace"), not(feature = "no_logs"))))]
#[macro_export]
macro_rules! rb_info {
   ($($arg:tt)*) => {
      if false { $crate::log::emit($crate::log::P_INFO, format_args!($($arg)*)) }
   };
}

// -----------------------------------------------------------------------------
// DEBUG / TRACE - log_trace only
// -----------------------------------------------------------------------------

#[cfg(all(feature = "log_trace", not(feature = "no_logs")))]
#[macro_export]
macro_rules! rb_debug {
   ($($arg:tt)*) => {
      $crate::log::emit($crate::log::P_DEBUG, format_args!($($arg)*))
   };
}

#[cfg(not(all(feature = "log_trace", not(feature = "no_logs"))))]
#[macro_export]
macro_rules! rb_debug {
   ($($arg:tt)*) => {
      if false { $crate::log::emit($crate::log::P_DEBUG, format_args!($($arg)*)) }
   };
}

#[cfg(all(feature = "log_trace", not(feature = "no_logs")))]
#[macro_export]
macro_rules! rb_trace {
   ($($arg:tt)*) => {
      $crate::log::emit($crate::log::P_TRACE, format_args!($($arg)*))
   };
}

#[cfg(not(all(feature = "log_trace", not(feature = "no_logs"))))]
#[macro_export]
macro_rules! rb_trace {
   ($($arg:tt)*) => {
      if false { $crate::log::emit($crate::log::P_TRACE, format_args!($($arg)*)) }
   };
}
