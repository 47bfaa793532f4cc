// Error taxonomy for the semaphore-backed ring buffer and its driver.

use nix::errno::Errno;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
   /// A semaphore could not be created (`sem_init` / `sem_open`).
   Initialization { what: &'static str, errno: Errno },
   /// `sem_wait`, `sem_post` or `sem_getvalue` failed at the OS level.
   Operation { op: &'static str, errno: Errno },
   /// A producer or consumer thread unwound instead of returning.
   WorkerPanicked { role: &'static str },
}

impl SyncError {
   pub(crate) fn init(what: &'static str, errno: Errno) -> Self {
      SyncError::Initialization { what, errno }
   }

   pub(crate) fn op(op: &'static str, errno: Errno) -> Self {
      SyncError::Operation { op, errno }
   }

   /// The errno behind an OS failure, if any.
   pub fn errno(&self) -> Option<Errno> {
      match *self {
         SyncError::Initialization { errno, .. } | SyncError::Operation { errno, .. } => Some(errno),
         SyncError::WorkerPanicked { .. } => None,
      }
   }
}

impl fmt::Display for SyncError {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         SyncError::Initialization { what, errno } => {
            write!(f, "failed to initialize {}: {}", what, errno.desc())
         }
         SyncError::Operation { op, errno } => {
            write!(f, "semaphore {} failed: {}", op, errno.desc())
         }
         SyncError::WorkerPanicked { role } => write!(f, "{} thread panicked", role),
      }
   }
}

impl std::error::Error for SyncError {}
