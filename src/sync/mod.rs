mod guarded;
mod semaphore;

pub use guarded::Guarded;
pub use semaphore::{CountingSemaphore, NamedSemaphore, OsSemaphore};

#[cfg(not(target_vendor = "apple"))]
pub use semaphore::UnnamedSemaphore;
