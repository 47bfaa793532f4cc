// Producer and consumer roles run by the benchmark.
//
// Producers push a finite stream; consumers pop until they meet the
// sentinel. Shutdown is a one-shot broadcast: whoever pops the sentinel
// pushes it straight back before leaving, so exactly one copy is always
// waiting for the next consumer. The last copy stays in the ring and is
// dropped with it.

use crate::{BoundedQueue, SyncError};
use rand::distributions::{Distribution, Uniform};
use std::ops::RangeInclusive;

/// Shutdown marker for the integer workload. Never produced as data.
pub const SENTINEL: i32 = -1;

/// Values drawn by [`RandomIntProducer`] unless told otherwise.
pub const DEFAULT_VALUE_RANGE: RangeInclusive<i32> = 1..=10_000_000;

/// Push every value of `values`, in order. Returns how many were pushed.
pub fn produce<T, Q, I>(queue: &Q, values: I) -> Result<usize, SyncError>
where
   T: Send,
   Q: BoundedQueue<T, Error = SyncError> + ?Sized,
   I: IntoIterator<Item = T>,
{
   let mut pushed = 0;
   for v in values {
      queue.push(v)?;
      pushed += 1;
   }
   Ok(pushed)
}

/// Pop and hand values to `f` until `sentinel` shows up, then re-publish
/// the sentinel for the next consumer and return.
pub fn consume_until_sentinel<T, Q, F>(queue: &Q, sentinel: &T, mut f: F) -> Result<(), SyncError>
where
   T: PartialEq + Send,
   Q: BoundedQueue<T, Error = SyncError> + ?Sized,
   F: FnMut(T),
{
   loop {
      let item = queue.pop()?;
      if item == *sentinel {
         queue.push(item)?;
         crate::rb_trace!("consumer {:?} re-published sentinel", std::thread::current().id());
         return Ok(());
      }
      f(item);
   }
}

/// Trial division: 2, then odd divisors up to √n.
pub fn is_prime(n: i32) -> bool {
   if n < 2 {
      return false;
   }
   if n < 4 {
      return true;
   }
   if n % 2 == 0 {
      return false;
   }
   let n = i64::from(n);
   let mut d: i64 = 3;
   while d * d <= n {
      if n % d == 0 {
         return false;
      }
      d += 2;
   }
   true
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  producer                                                                */
/*──────────────────────────────────────────────────────────────────────────*/

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerReport {
   pub produced: usize,
}

/// Pushes `num_items` integers drawn uniformly from a range.
pub struct RandomIntProducer<'a, Q: ?Sized> {
   queue    : &'a Q,
   num_items: usize,
   dist     : Uniform<i32>,
}

impl<'a, Q> RandomIntProducer<'a, Q>
where
   Q: BoundedQueue<i32, Error = SyncError> + ?Sized,
{
   pub fn new(queue: &'a Q, num_items: usize) -> Self {
      Self::with_range(queue, num_items, DEFAULT_VALUE_RANGE)
   }

   /// # Panics
   /// If `range` is empty or contains [`SENTINEL`].
   pub fn with_range(queue: &'a Q, num_items: usize, range: RangeInclusive<i32>) -> Self {
      assert!(!range.is_empty(), "value range is empty");
      assert!(!range.contains(&SENTINEL), "value range overlaps the sentinel");
      Self {
         queue,
         num_items,
         dist: Uniform::new_inclusive(*range.start(), *range.end()),
      }
   }

   pub fn run(self) -> Result<ProducerReport, SyncError> {
      let mut rng = rand::thread_rng();
      let dist = self.dist;
      let values = (0..self.num_items).map(|_| dist.sample(&mut rng));
      let produced = produce(self.queue, values)?;
      Ok(ProducerReport { produced })
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  consumer                                                                */
/*──────────────────────────────────────────────────────────────────────────*/

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
   pub consumed    : usize,
   pub primes_found: usize,
}

impl std::ops::AddAssign for ConsumerReport {
   fn add_assign(&mut self, rhs: Self) {
      self.consumed += rhs.consumed;
      self.primes_found += rhs.primes_found;
   }
}

/// Pops integers until the sentinel, counting how many pass `classify`
/// (primality by default).
pub struct PrimeNumberConsumer<'a, Q: ?Sized> {
   queue   : &'a Q,
   classify: fn(i32) -> bool,
}

impl<'a, Q> PrimeNumberConsumer<'a, Q>
where
   Q: BoundedQueue<i32, Error = SyncError> + ?Sized,
{
   pub fn new(queue: &'a Q) -> Self {
      Self::with_classifier(queue, is_prime)
   }

   pub fn with_classifier(queue: &'a Q, classify: fn(i32) -> bool) -> Self {
      Self { queue, classify }
   }

   pub fn run(self) -> Result<ConsumerReport, SyncError> {
      let mut report = ConsumerReport::default();
      let classify = self.classify;
      consume_until_sentinel(self.queue, &SENTINEL, |item| {
         if classify(item) {
            report.primes_found += 1;
         }
         report.consumed += 1;
      })?;
      Ok(report)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::RingBuffer;

   #[test]
   fn classifies_small_numbers() {
      let primes: Vec<i32> = (-3..=30).filter(|&n| is_prime(n)).collect();
      assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
   }

   #[test]
   fn classifies_squares_of_primes_as_composite() {
      assert!(!is_prime(9));
      assert!(!is_prime(25));
      assert!(!is_prime(3_163 * 3_163)); // 3163 is prime
      assert!(is_prime(9_999_991)); // largest prime below 10^7
   }

   #[test]
   fn largest_i32_prime() {
      assert!(is_prime(i32::MAX)); // 2^31 - 1 is a Mersenne prime
      assert!(!is_prime(i32::MAX - 1));
   }

   #[test]
   fn producer_stays_inside_range() {
      let rb = RingBuffer::new(64).unwrap();
      let report = RandomIntProducer::with_range(&rb, 50, 10..=12).run().unwrap();
      assert_eq!(report.produced, 50);
      for _ in 0..50 {
         let v = rb.pop().unwrap();
         assert!((10..=12).contains(&v), "{} out of range", v);
      }
   }

   #[test]
   #[should_panic(expected = "overlaps the sentinel")]
   fn producer_rejects_sentinel_range() {
      let rb = RingBuffer::<i32>::new(1).unwrap();
      let _ = RandomIntProducer::with_range(&rb, 1, -5..=5);
   }

   #[test]
   fn consumer_counts_and_republishes_sentinel() {
      let rb = RingBuffer::new(8).unwrap();
      produce(&rb, [2, 4, 7, 9, 11, SENTINEL]).unwrap();

      let report = PrimeNumberConsumer::new(&rb).run().unwrap();
      assert_eq!(report, ConsumerReport { consumed: 5, primes_found: 3 });

      // the sentinel is back for whoever comes next
      assert_eq!(rb.pop().unwrap(), SENTINEL);
   }

   #[test]
   fn custom_classifier() {
      let rb = RingBuffer::new(8).unwrap();
      produce(&rb, [1, 2, 3, 4, SENTINEL]).unwrap();
      let report = PrimeNumberConsumer::with_classifier(&rb, |n| n % 2 == 0).run().unwrap();
      assert_eq!(report.primes_found, 2);
   }
}
