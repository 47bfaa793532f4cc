pub mod log;

pub mod bench;
pub mod config;
pub mod error;
pub mod ring;
pub mod sync;
pub mod workload;

pub use error::SyncError;
pub use ring::{Occupancy, RingBuffer};
pub use sync::{CountingSemaphore, Guarded, NamedSemaphore, OsSemaphore};

/// Common interface for blocking bounded queues.
///
/// Unlike a try-queue, a full or empty queue is not an error here: `push`
/// and `pop` wait. `Err` means the queue itself broke.
pub trait BoundedQueue<T: Send>: Send + Sync {
    type Error;

    /// Store `item`, blocking while the queue is full.
    fn push(&self, item: T) -> Result<(), Self::Error>;
    /// Take an item, blocking while the queue is empty.
    fn pop(&self) -> Result<T, Self::Error>;

    fn capacity(&self) -> usize;
}
