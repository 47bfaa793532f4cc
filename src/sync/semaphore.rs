// Counting semaphores backed by POSIX `sem_t`.
//
// Two flavours share one capability trait:
// - `UnnamedSemaphore`: `sem_init` on a heap-pinned `sem_t` (Linux, BSDs)
// - `NamedSemaphore`:   `sem_open` with a process-unique name, for targets
//                       whose `sem_init` is a stub (Apple)
//
// `OsSemaphore` picks the right one at compile time.

use crate::error::SyncError;
use nix::errno::Errno;
use nix::unistd::getpid;
use std::{
   cell::UnsafeCell,
   ffi::CString,
   fmt,
   sync::atomic::{AtomicUsize, Ordering},
};

/// Blocking counting semaphore.
///
/// `acquire` blocks until the count is positive and then decrements it;
/// `release` increments it and wakes at most one blocked acquirer. Neither
/// is allowed to spin.
pub trait CountingSemaphore: Send + Sync + Sized {
   /// Create a semaphore holding `initial` permits.
   fn new(initial: usize) -> Result<Self, SyncError>;

   fn acquire(&self) -> Result<(), SyncError>;

   fn release(&self) -> Result<(), SyncError>;

   /// Snapshot of the current count. Only meaningful while no thread is
   /// racing on the semaphore.
   fn permits(&self) -> Result<usize, SyncError>;
}

#[cfg(not(target_vendor = "apple"))]
pub type OsSemaphore = UnnamedSemaphore;

#[cfg(target_vendor = "apple")]
pub type OsSemaphore = NamedSemaphore;

/*──────────────────────────────────────────────────────────────────────────*/
/*  raw sem_t calls shared by both flavours                                 */
/*──────────────────────────────────────────────────────────────────────────*/

fn initial_value(what: &'static str, initial: usize) -> Result<libc::c_uint, SyncError> {
   libc::c_uint::try_from(initial).map_err(|_| SyncError::init(what, Errno::EINVAL))
}

// A signal landing while we sleep in sem_wait is not a failure; go back to sleep.
fn sem_wait(sem: *mut libc::sem_t) -> Result<(), SyncError> {
   loop {
      match Errno::result(unsafe { libc::sem_wait(sem) }) {
         Ok(_) => return Ok(()),
         Err(Errno::EINTR) => continue,
         Err(errno) => return Err(SyncError::op("acquire", errno)),
      }
   }
}

fn sem_post(sem: *mut libc::sem_t) -> Result<(), SyncError> {
   Errno::result(unsafe { libc::sem_post(sem) })
      .map(drop)
      .map_err(|errno| SyncError::op("release", errno))
}

#[cfg(not(target_vendor = "apple"))]
fn sem_getvalue(sem: *mut libc::sem_t) -> Result<usize, SyncError> {
   let mut value: libc::c_int = 0;
   Errno::result(unsafe { libc::sem_getvalue(sem, &mut value) })
      .map_err(|errno| SyncError::op("getvalue", errno))?;
   // some systems report waiters as a negative count
   Ok(usize::try_from(value).unwrap_or(0))
}

#[cfg(target_vendor = "apple")]
fn sem_getvalue(_sem: *mut libc::sem_t) -> Result<usize, SyncError> {
   Err(SyncError::op("getvalue", Errno::ENOSYS))
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  unnamed                                                                 */
/*──────────────────────────────────────────────────────────────────────────*/

/// Process-private semaphore created with `sem_init`.
///
/// The `sem_t` lives in its own heap allocation because POSIX forbids moving
/// an initialised semaphore.
#[cfg(not(target_vendor = "apple"))]
pub struct UnnamedSemaphore {
   sem: Box<UnsafeCell<libc::sem_t>>,
}

#[cfg(not(target_vendor = "apple"))]
unsafe impl Send for UnnamedSemaphore {}
#[cfg(not(target_vendor = "apple"))]
unsafe impl Sync for UnnamedSemaphore {}

#[cfg(not(target_vendor = "apple"))]
impl CountingSemaphore for UnnamedSemaphore {
   fn new(initial: usize) -> Result<Self, SyncError> {
      let value = initial_value("unnamed semaphore", initial)?;
      let sem = Box::new(UnsafeCell::new(unsafe { std::mem::zeroed::<libc::sem_t>() }));

      Errno::result(unsafe { libc::sem_init(sem.get(), 0, value) })
         .map_err(|errno| SyncError::init("unnamed semaphore", errno))?;

      crate::rb_trace!("sem_init {:p} permits={}", sem.get(), initial);
      Ok(Self { sem })
   }

   #[inline]
   fn acquire(&self) -> Result<(), SyncError> {
      sem_wait(self.sem.get())
   }

   #[inline]
   fn release(&self) -> Result<(), SyncError> {
      sem_post(self.sem.get())
   }

   fn permits(&self) -> Result<usize, SyncError> {
      sem_getvalue(self.sem.get())
   }
}

#[cfg(not(target_vendor = "apple"))]
impl Drop for UnnamedSemaphore {
   fn drop(&mut self) {
      crate::rb_trace!("sem_destroy {:p}", self.sem.get());
      unsafe { libc::sem_destroy(self.sem.get()) };
   }
}

#[cfg(not(target_vendor = "apple"))]
impl fmt::Debug for UnnamedSemaphore {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("UnnamedSemaphore")
       .field("permits", &self.permits().ok())
       .finish()
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  named                                                                   */
/*──────────────────────────────────────────────────────────────────────────*/

static NEXT_NAME: AtomicUsize = AtomicUsize::new(0);

// Attempts before giving up on EEXIST.
const NAME_ATTEMPTS: usize = 8;

/// Semaphore created with `sem_open`.
///
/// The name is unlinked as soon as the semaphore is open, so it never
/// outlives this process even on abnormal exit.
pub struct NamedSemaphore {
   sem: *mut libc::sem_t,
   name: CString,
}

unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
   fn fresh_name() -> Result<CString, SyncError> {
      let seq = NEXT_NAME.fetch_add(1, Ordering::Relaxed);
      CString::new(format!("/sr_{}_{}", getpid(), seq))
         .map_err(|_| SyncError::init("named semaphore", Errno::EINVAL))
   }

   pub fn name(&self) -> &CString {
      &self.name
   }
}

impl CountingSemaphore for NamedSemaphore {
   fn new(initial: usize) -> Result<Self, SyncError> {
      let value = initial_value("named semaphore", initial)?;

      let mut attempts = 0;
      loop {
         let name = Self::fresh_name()?;
         let sem = unsafe {
            libc::sem_open(
               name.as_ptr(),
               libc::O_CREAT | libc::O_EXCL,
               0o644 as libc::c_uint,
               value,
            )
         };

         if sem != libc::SEM_FAILED {
            unsafe { libc::sem_unlink(name.as_ptr()) };
            crate::rb_trace!("sem_open {:?} permits={}", name, initial);
            return Ok(Self { sem, name });
         }

         let errno = Errno::last();
         attempts += 1;
         if errno != Errno::EEXIST || attempts == NAME_ATTEMPTS {
            return Err(SyncError::init("named semaphore", errno));
         }
      }
   }

   #[inline]
   fn acquire(&self) -> Result<(), SyncError> {
      sem_wait(self.sem)
   }

   #[inline]
   fn release(&self) -> Result<(), SyncError> {
      sem_post(self.sem)
   }

   fn permits(&self) -> Result<usize, SyncError> {
      sem_getvalue(self.sem)
   }
}

impl Drop for NamedSemaphore {
   fn drop(&mut self) {
      crate::rb_trace!("sem_close {:?}", self.name);
      unsafe { libc::sem_close(self.sem) };
   }
}

impl fmt::Debug for NamedSemaphore {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("NamedSemaphore")
       .field("name", &self.name)
       .finish()
   }
}
