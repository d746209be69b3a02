//! Monotonic ULID generator

use rand::RngCore;
use tracing::warn;

use crate::random::random_tail;
use crate::ulid::{MAX_RANDOMNESS, MAX_TIMESTAMP};
use crate::{clock, Error, Ulid};

/// Default amount of timestamp rollback (ten seconds) tolerated by the generator.
pub const DEFAULT_ROLLBACK_ALLOWANCE: u64 = 10_000;

/// Represents a ULID generator that guarantees the strictly increasing order of ULIDs it
/// produces.
///
/// The generator remembers the timestamp and the randomness field of the last ULID. A ULID
/// requested within the same millisecond (or after a clock rollback no larger than the allowance)
/// reuses the timestamp and takes the previous randomness plus one; a ULID for a later
/// millisecond draws fresh randomness. Incrementing past the largest 80-bit value fails with
/// [`Error::Overflow`] rather than wrapping, and the generator recovers once the timestamp
/// advances.
///
/// The guarantee covers the ULIDs of one instance. Callers that need a process-wide order share
/// one instance, typically through [`IdGenerator`](crate::IdGenerator).
///
/// # Examples
///
/// ```rust
/// use cup_uid::MonotonicUlidGenerator;
///
/// let mut g = MonotonicUlidGenerator::new(rand::rngs::OsRng);
/// let a = g.generate()?;
/// let b = g.generate()?;
/// assert!(a.to_string() < b.to_string());
/// # Ok::<(), cup_uid::Error>(())
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct MonotonicUlidGenerator<R> {
    timestamp: u64,
    randomness: u128,

    /// Random number generator used by the generator.
    rng: R,
}

impl<R: RngCore> MonotonicUlidGenerator<R> {
    /// Creates a generator instance.
    pub const fn new(rng: R) -> Self {
        Self {
            timestamp: 0,
            randomness: 0,
            rng,
        }
    }

    /// Generates a new ULID object from the current timestamp.
    pub fn generate(&mut self) -> Result<Ulid, Error> {
        self.generate_core(clock::unix_ts_ms(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new ULID object from the `unix_ts_ms` passed.
    ///
    /// When `unix_ts_ms` is smaller than the previous timestamp by more than
    /// `rollback_allowance`, the generator is reset and the result breaks the increasing order.
    ///
    /// # Panics
    ///
    /// Panics if `unix_ts_ms` does not fit in 48 bits.
    pub fn generate_core(
        &mut self,
        unix_ts_ms: u64,
        rollback_allowance: u64,
    ) -> Result<Ulid, Error> {
        assert!(
            unix_ts_ms <= MAX_TIMESTAMP,
            "`unix_ts_ms` must be a 48-bit integer"
        );

        if unix_ts_ms > self.timestamp {
            self.timestamp = unix_ts_ms;
            self.randomness = random_tail(&mut self.rng);
        } else if unix_ts_ms.saturating_add(rollback_allowance) >= self.timestamp {
            if self.randomness == MAX_RANDOMNESS {
                warn!(
                    timestamp = self.timestamp,
                    "ULID randomness exhausted within the same millisecond"
                );
                return Err(Error::Overflow);
            }
            self.randomness += 1;
        } else {
            warn!(
                unix_ts_ms,
                last_unix_ts_ms = self.timestamp,
                "clock moved backwards; resetting monotonic ULID generator"
            );
            self.timestamp = unix_ts_ms;
            self.randomness = random_tail(&mut self.rng);
        }

        Ok(Ulid::from_parts(self.timestamp, self.randomness))
    }
}
