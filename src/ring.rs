// Bounded multi-producer / multi-consumer ring buffer.
//
// Classic semaphore solution to the bounded-buffer problem:
//
//   push: free_slots.P  ─▶  [lock] write slot[head], head++ [unlock]  ─▶  items.V
//   pop:  items.P       ─▶  [lock] read  slot[tail], tail++ [unlock]  ─▶  free_slots.V
//
// The semaphores decide *how many* pushes/pops may proceed; the lock
// serialises the slot access and cursor update among those that did.

use crate::sync::{CountingSemaphore, Guarded, OsSemaphore};
use crate::{BoundedQueue, SyncError};
use std::fmt;

/// Trace entry recorded for a push.
pub const OP_PUSH: i8 = 1;
/// Trace entry recorded for a pop.
pub const OP_POP: i8 = -1;

/*──────────────────────────────────────────────────────────────────────────*/
/*  slot storage (only ever touched under the lock)                         */
/*──────────────────────────────────────────────────────────────────────────*/

struct Slots<T> {
   buf  : Box<[Option<T>]>,
   head : usize,            // next write
   tail : usize,            // next read
   len  : usize,            // live values
   trace: Option<Vec<i8>>,
}

impl<T> Slots<T> {
   fn with_capacity(cap: usize, trace: bool) -> Self {
      Self {
         buf  : (0..cap).map(|_| None).collect::<Vec<_>>().into_boxed_slice(),
         head : 0,
         tail : 0,
         len  : 0,
         trace: trace.then(Vec::new),
      }
   }

   #[inline]
   fn write(&mut self, value: T) {
      let prev = self.buf[self.head].replace(value);
      debug_assert!(prev.is_none(), "free_slots admitted a write into a live slot");
      self.head = (self.head + 1) % self.buf.len();
      self.len += 1;
      if let Some(ops) = self.trace.as_mut() {
         ops.push(OP_PUSH);
      }
   }

   #[inline]
   fn read(&mut self) -> T {
      let value = self.buf[self.tail]
         .take()
         .expect("items semaphore admitted a read from an empty slot");
      self.tail = (self.tail + 1) % self.buf.len();
      self.len -= 1;
      if let Some(ops) = self.trace.as_mut() {
         ops.push(OP_POP);
      }
      value
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  ring header                                                             */
/*──────────────────────────────────────────────────────────────────────────*/

/// Permit counts of a ring at one instant.
///
/// With no push or pop in flight, `items + free_slots == capacity` and
/// `stored == items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
   pub items     : usize,
   pub free_slots: usize,
   pub stored    : usize,
}

/// Fixed-capacity blocking queue guarded by two counting semaphores.
///
/// `push` blocks while the ring is full and `pop` blocks while it is empty.
/// Full and empty are never errors. Any number of threads may call either
/// operation concurrently; each value is handed to exactly one `pop`.
pub struct RingBuffer<T, S: CountingSemaphore = OsSemaphore> {
   storage   : Guarded<Slots<T>>,
   items     : S,   // starts at 0
   free_slots: S,   // starts at capacity
   capacity  : usize,
}

impl<T: Send> RingBuffer<T, OsSemaphore> {
   /// Build a ring of `capacity` slots on the platform semaphore.
   ///
   /// # Panics
   /// If `capacity` is zero.
   pub fn new(capacity: usize) -> Result<Self, SyncError> {
      Self::with_semaphore(capacity, false)
   }

   /// Like [`RingBuffer::new`], additionally recording every push and pop
   /// in order. See [`RingBuffer::take_trace`].
   pub fn with_trace(capacity: usize) -> Result<Self, SyncError> {
      Self::with_semaphore(capacity, true)
   }
}

impl<T: Send, S: CountingSemaphore> RingBuffer<T, S> {
   /// Build a ring on an explicit semaphore implementation.
   pub fn with_semaphore(capacity: usize, trace: bool) -> Result<Self, SyncError> {
      assert!(capacity > 0, "capacity must be non-zero");

      // semaphores first: they reject counts the OS cannot hold before any
      // slot is allocated
      let items = S::new(0)?;
      let free_slots = S::new(capacity)?;

      Ok(Self {
         storage: Guarded::new(Slots::with_capacity(capacity, trace)),
         items,
         free_slots,
         capacity,
      })
   }

   /// Store `value`, waiting for a free slot if the ring is full.
   pub fn push(&self, value: T) -> Result<(), SyncError> {
      self.free_slots.acquire()?;
      self.storage.acquire(|slots| slots.write(value));
      self.items.release()
   }

   /// Take the oldest value, waiting for one if the ring is empty.
   pub fn pop(&self) -> Result<T, SyncError> {
      self.items.acquire()?;
      let value = self.storage.acquire(|slots| slots.read());
      self.free_slots.release()?;
      Ok(value)
   }

   #[inline]
   pub fn capacity(&self) -> usize {
      self.capacity
   }

   pub fn occupancy(&self) -> Result<Occupancy, SyncError> {
      Ok(Occupancy {
         items     : self.items.permits()?,
         free_slots: self.free_slots.permits()?,
         stored    : self.storage.acquire(|slots| slots.len),
      })
   }

   /// Drain the operation log: [`OP_PUSH`] per push, [`OP_POP`] per pop, in
   /// lock order. `None` if the ring was built without tracing.
   pub fn take_trace(&self) -> Option<Vec<i8>> {
      self.storage.acquire(|slots| slots.trace.as_mut().map(std::mem::take))
   }
}

impl<T: Send, S: CountingSemaphore> BoundedQueue<T> for RingBuffer<T, S> {
   type Error = SyncError;

   #[inline]
   fn push(&self, item: T) -> Result<(), SyncError> {
      RingBuffer::push(self, item)
   }

   #[inline]
   fn pop(&self) -> Result<T, SyncError> {
      RingBuffer::pop(self)
   }

   fn capacity(&self) -> usize {
      self.capacity
   }
}

impl<T, S: CountingSemaphore> fmt::Debug for RingBuffer<T, S> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("RingBuffer")
       .field("capacity", &self.capacity)
       .field("items", &self.items.permits().ok())
       .field("free_slots", &self.free_slots.permits().ok())
       .finish()
   }
}
