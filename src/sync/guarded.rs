use parking_lot::Mutex;
use std::fmt;

/// Storage reachable only from inside a critical section.
///
/// There is no guard type to leak and no `get_mut`-style escape hatch: the
/// one way in is [`Guarded::acquire`], which runs a closure with the lock
/// held. The lock is released when the closure returns or unwinds, and
/// `parking_lot` does not poison, so a panicking closure leaves the storage
/// usable by the next caller.
pub struct Guarded<T> {
   value: Mutex<T>,
}

impl<T> Guarded<T> {
   pub fn new(value: T) -> Self {
      Self { value: Mutex::new(value) }
   }

   /// Run `f` with exclusive access to the storage.
   #[inline]
   pub fn acquire<R, F>(&self, f: F) -> R
   where
      F: FnOnce(&mut T) -> R,
   {
      let mut guard = self.value.lock();
      f(&mut *guard)
   }

   pub fn into_inner(self) -> T {
      self.value.into_inner()
   }
}

impl<T> fmt::Debug for Guarded<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Guarded")
       .field("locked", &self.value.is_locked())
       .finish()
   }
}
