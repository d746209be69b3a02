//! Counter-based monotonic UUIDv7 generator

use rand::RngCore;
use tracing::debug;

use crate::{clock, Uuid};

/// Default amount of `unix_ts_ms` rollback (ten seconds) tolerated by the generator.
pub const DEFAULT_ROLLBACK_ALLOWANCE: u64 = 10_000;

const MAX_COUNTER: u64 = (1 << 42) - 1;

/// Represents a UUIDv7 generator that encapsulates a counter and guarantees the monotonic order of
/// UUIDs generated within the same millisecond.
///
/// The 42 bits following the timestamp hold a counter that is randomly initialized whenever the
/// timestamp changes and incremented by one for every UUID generated within the same
/// millisecond; the remaining 32 bits are random. When the counter overflows, the generator
/// moves on to the next millisecond, so the embedded timestamp may run slightly ahead of the
/// system clock.
///
/// Share one instance (for example behind a [`Mutex`](std::sync::Mutex)) among the callers that
/// need their UUIDs ordered with respect to each other.
///
/// | Flavor                     | Timestamp | On big clock rewind |
/// | -------------------------- | --------- | ------------------- |
/// | [`generate`]               | Now       | Resets generator    |
/// | [`generate_or_abort`]      | Now       | Returns `None`      |
/// | [`generate_or_reset_core`] | Argument  | Resets generator    |
/// | [`generate_or_abort_core`] | Argument  | Returns `None`      |
///
/// [`generate`]: V7Generator::generate
/// [`generate_or_abort`]: V7Generator::generate_or_abort
/// [`generate_or_reset_core`]: V7Generator::generate_or_reset_core
/// [`generate_or_abort_core`]: V7Generator::generate_or_abort_core
///
/// # Examples
///
/// ```rust
/// use cup_uid::V7Generator;
///
/// let mut g = V7Generator::new(rand::rngs::OsRng);
/// let a = g.generate();
/// let b = g.generate();
/// assert!(a < b);
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct V7Generator<R> {
    timestamp: u64,
    counter: u64,

    /// Random number generator used by the generator.
    rng: R,
}

impl<R: RngCore> V7Generator<R> {
    /// Creates a generator instance.
    pub const fn new(rng: R) -> Self {
        Self {
            timestamp: 0,
            counter: 0,
            rng,
        }
    }

    /// Generates a new UUIDv7 object from the current timestamp, or resets the generator upon
    /// significant timestamp rollback.
    pub fn generate(&mut self) -> Uuid {
        self.generate_or_reset_core(clock::unix_ts_ms(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new UUIDv7 object from the current timestamp, or returns `None` upon
    /// significant timestamp rollback.
    pub fn generate_or_abort(&mut self) -> Option<Uuid> {
        self.generate_or_abort_core(clock::unix_ts_ms(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new UUIDv7 object from the `unix_ts_ms` passed, or resets the generator upon
    /// significant timestamp rollback.
    ///
    /// # Panics
    ///
    /// Panics if `unix_ts_ms` is not a 48-bit positive integer, or if the counter overflows while
    /// the generator's timestamp is already `2^48 - 1`.
    pub fn generate_or_reset_core(&mut self, unix_ts_ms: u64, rollback_allowance: u64) -> Uuid {
        if let Some(value) = self.generate_or_abort_core(unix_ts_ms, rollback_allowance) {
            value
        } else {
            debug!(
                unix_ts_ms,
                last_unix_ts_ms = self.timestamp,
                "clock moved backwards; resetting UUIDv7 generator"
            );
            self.timestamp = 0;
            self.next_uuid(unix_ts_ms)
        }
    }

    /// Generates a new UUIDv7 object from the `unix_ts_ms` passed, or returns `None` upon
    /// significant timestamp rollback.
    ///
    /// The `rollback_allowance` parameter specifies the amount of `unix_ts_ms` rollback that is
    /// considered significant. A suggested value is `10_000` (milliseconds).
    ///
    /// # Panics
    ///
    /// Panics if `unix_ts_ms` is not a 48-bit positive integer, or if the counter overflows while
    /// the generator's timestamp is already `2^48 - 1`.
    pub fn generate_or_abort_core(
        &mut self,
        unix_ts_ms: u64,
        rollback_allowance: u64,
    ) -> Option<Uuid> {
        assert!(
            0 < unix_ts_ms && unix_ts_ms < 1 << 48,
            "`unix_ts_ms` must be a 48-bit positive integer"
        );
        assert!(
            rollback_allowance < 1 << 48,
            "`rollback_allowance` out of reasonable range"
        );

        if unix_ts_ms + rollback_allowance >= self.timestamp {
            Some(self.next_uuid(unix_ts_ms))
        } else {
            None
        }
    }

    fn next_uuid(&mut self, unix_ts_ms: u64) -> Uuid {
        if unix_ts_ms > self.timestamp {
            self.timestamp = unix_ts_ms;
            self.counter = self.rng.next_u64() & MAX_COUNTER;
        } else {
            self.counter += 1;
            if self.counter > MAX_COUNTER {
                // increment timestamp at counter overflow
                assert!(
                    self.timestamp < (1 << 48) - 1,
                    "counter overflow at the maximum `unix_ts_ms`"
                );
                self.timestamp += 1;
                self.counter = self.rng.next_u64() & MAX_COUNTER;
            }
        }

        Uuid::from_fields_v7(
            self.timestamp,
            (self.counter >> 30) as u16,
            ((self.counter & 0x3fff_ffff) << 32) | self.rng.next_u32() as u64,
        )
    }
}

/// Supports operations as an infinite iterator that produces a new UUIDv7 object for each call of
/// `next()`.
///
/// # Examples
///
/// ```rust
/// use cup_uid::V7Generator;
///
/// V7Generator::new(rand::thread_rng())
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{i}] {e}"));
/// ```
impl<R: RngCore> Iterator for V7Generator<R> {
    type Item = Uuid;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: RngCore> std::iter::FusedIterator for V7Generator<R> {}

#[cfg(test)]
mod tests {
    use super::{V7Generator, DEFAULT_ROLLBACK_ALLOWANCE};
    use rand::rngs::{mock::StepRng, ThreadRng};

    type ThreadGen = V7Generator<ThreadRng>;

    /// Generates increasing UUIDs even with decreasing or constant timestamp
    #[test]
    fn generates_increasing_uuids_even_with_decreasing_or_constant_timestamp() {
        let ts = 0x0123_4567_89abu64;
        let mut g: ThreadGen = Default::default();
        let mut prev = g.generate_or_reset_core(ts, DEFAULT_ROLLBACK_ALLOWANCE);
        assert_eq!(prev.as_bytes()[..6], ts.to_be_bytes()[2..]);
        for i in 0..100_000u64 {
            let curr = g.generate_or_reset_core(ts - i.min(4_000), DEFAULT_ROLLBACK_ALLOWANCE);
            assert!(prev < curr);
            prev = curr;
        }
        assert!(prev.as_bytes()[..6] >= ts.to_be_bytes()[2..]);
    }

    /// Breaks increasing order of UUIDs if timestamp goes backwards a lot
    #[test]
    fn breaks_increasing_order_of_uuids_if_timestamp_goes_backwards_a_lot() {
        let ts = 0x0123_4567_89abu64;
        let mut g: ThreadGen = Default::default();
        let mut prev = g.generate_or_reset_core(ts, 10_000);

        let mut curr = g.generate_or_reset_core(ts - 10_000, 10_000);
        assert!(prev < curr);

        prev = curr;
        curr = g.generate_or_reset_core(ts - 10_001, 10_000);
        assert!(prev > curr);
        assert_eq!(curr.as_bytes()[..6], (ts - 10_001).to_be_bytes()[2..]);

        prev = curr;
        curr = g.generate_or_reset_core(ts - 10_002, 10_000);
        assert!(prev < curr);
    }

    /// Returns None if timestamp goes backwards a lot
    #[test]
    fn returns_none_if_timestamp_goes_backwards_a_lot() {
        let ts = 0x0123_4567_89abu64;
        let mut g: ThreadGen = Default::default();
        let prev = g.generate_or_abort_core(ts, 10_000).unwrap();

        let curr = g.generate_or_abort_core(ts - 10_000, 10_000);
        assert!(prev < curr.unwrap());

        assert!(g.generate_or_abort_core(ts - 10_001, 10_000).is_none());
        assert!(g.generate_or_abort_core(ts - 10_002, 10_000).is_none());
    }

    /// Moves to next millisecond at counter overflow
    #[test]
    fn moves_to_next_millisecond_at_counter_overflow() {
        let ts = 0x0123_4567_89abu64;
        let mut g = V7Generator::new(StepRng::new(u64::MAX, 0));
        let prev = g.generate_or_reset_core(ts, DEFAULT_ROLLBACK_ALLOWANCE);
        assert_eq!(prev.as_bytes()[..6], ts.to_be_bytes()[2..]);

        let curr = g.generate_or_reset_core(ts, DEFAULT_ROLLBACK_ALLOWANCE);
        assert!(prev < curr);
        assert_eq!(curr.as_bytes()[..6], (ts + 1).to_be_bytes()[2..]);
    }

    /// Panics on counter overflow at the maximum timestamp
    #[test]
    #[should_panic(expected = "counter overflow at the maximum `unix_ts_ms`")]
    fn panics_on_counter_overflow_at_the_maximum_timestamp() {
        let ts = (1u64 << 48) - 1;
        let mut g = V7Generator::new(StepRng::new(u64::MAX, 0));
        let prev = g.generate_or_reset_core(ts, DEFAULT_ROLLBACK_ALLOWANCE);
        assert_eq!(prev.as_bytes()[..6], [0xff; 6]);
        g.generate_or_reset_core(ts, DEFAULT_ROLLBACK_ALLOWANCE);
    }

    /// Generates version 7 from the system clock
    #[test]
    fn generates_version_7_from_the_system_clock() {
        let mut g = V7Generator::new(rand::thread_rng());
        assert_eq!(g.generate_or_abort().and_then(|e| e.version()), Some(7));
        let samples: Vec<_> = g.by_ref().take(1_000).collect();
        for w in samples.windows(2) {
            assert!(w[0] < w[1]);
        }
    }
}
