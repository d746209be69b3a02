//! Entry point functions for the stateless identifier kinds

use std::{cell::RefCell, process};

use rand::rngs::{SmallRng, ThreadRng};
use rand::SeedableRng;

use crate::{clock, random, Ulid, Uuid};

thread_local! {
    static FAST_RNG: RefCell<(u32, SmallRng)> =
        RefCell::new((process::id(), SmallRng::from_entropy()));
}

/// Returns the thread-local random number generator, reseeding it first if the process has
/// forked since the last call.
fn rng() -> ThreadRng {
    unix_fork_safety::reseed_thread_rng_upon_pid_change();
    rand::thread_rng()
}

/// Generates a UUIDv4 object.
///
/// # Examples
///
/// ```rust
/// let uuid = cup_uid::uuid4();
/// println!("{uuid}"); // e.g., "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
/// ```
pub fn uuid4() -> Uuid {
    random::uuid4_with(&mut rng())
}

/// Generates a UUIDv7 object.
///
/// UUIDs generated within the same millisecond are not ordered with respect to each other. Use
/// [`V7Generator`](crate::V7Generator) or [`IdGenerator`](crate::IdGenerator) when monotonic
/// order is required.
///
/// # Examples
///
/// ```rust
/// let uuid = cup_uid::uuid7();
/// println!("{uuid}"); // e.g., "01809424-3e59-7c05-9219-566f82fff672"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
/// ```
pub fn uuid7() -> Uuid {
    random::uuid7_with(&mut rng(), clock::unix_ts_ms())
}

/// Generates a ULID object.
///
/// # Examples
///
/// ```rust
/// let ulid = cup_uid::ulid();
/// println!("{ulid}"); // e.g., "01ARZ3NDEKTSV4RRFFQ69G5FAV"
/// ```
pub fn ulid() -> Ulid {
    random::ulid_with(&mut rng(), clock::unix_ts_ms())
}

/// Generates a ULID object from a non-cryptographic random number generator.
///
/// This function draws the 80 random bits from a thread-local [`SmallRng`] seeded from the
/// operating system, which is faster than [`ulid`] but makes the output predictable to anyone who
/// observes enough of it. Do not use it for identifiers that must be hard to guess. The generator
/// is seeded again when the process ID changes (i.e. upon process forks).
///
/// # Examples
///
/// ```rust
/// let ulid = cup_uid::ulid_fast();
/// println!("{ulid}"); // e.g., "01ARZ3NDEKTSV4RRFFQ69G5FAV"
/// ```
pub fn ulid_fast() -> Ulid {
    FAST_RNG.with(|cell| {
        let mut state = cell.borrow_mut();
        let (last_pid, rng) = &mut *state;
        let pid = process::id();
        if pid != *last_pid {
            *last_pid = pid;
            *rng = SmallRng::from_entropy();
        }
        random::ulid_with(rng, clock::unix_ts_ms())
    })
}

#[cfg(unix)]
mod unix_fork_safety {
    use std::{cell::Cell, process};

    thread_local! {
        static PID: Cell<u32> = Cell::new(process::id());
    }

    /// Reseeds ThreadRng immediately when the process ID changes (i.e. upon process forks).
    pub fn reseed_thread_rng_upon_pid_change() {
        PID.with(|last_pid| {
            let pid = process::id();
            if pid != last_pid.replace(pid) {
                // As of rand v0.8.5 and rand_chacha v0.3.1, up to 63 `u32` values have to be used
                // before reseeding after a fork.
                let _: [[u32; 32]; 2] = rand::random();
            }
        })
    }
}

#[cfg(not(unix))]
mod unix_fork_safety {
    pub const fn reseed_thread_rng_upon_pid_change() {}
}



#[cfg(test)]
mod tests_v4 {
    use super::sampling::{assert_bits, assert_canonical, assert_unique, N_SAMPLES};
    use super::uuid4;
    use crate::{Uuid, Variant};

    thread_local!(static SAMPLES: Vec<Uuid> = (0..N_SAMPLES).map(|_| uuid4()).collect());

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        SAMPLES.with(|samples| assert_canonical(samples, pattern));
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        SAMPLES.with(|samples| assert_unique(samples));
    }

    /// Sets version, variant and random bits properly
    #[test]
    fn sets_version_variant_and_random_bits_properly() {
        let constant = [(48, false), (49, true), (50, false), (51, false), (64, true), (65, false)];
        let random = (0..48).chain(52..64).chain(66..128);
        SAMPLES.with(|samples| assert_bits(samples, &constant, random));
        for e in SAMPLES.with(|samples| samples[..1_000].to_vec()) {
            assert_eq!(e.variant(), Variant::Var10);
            assert_eq!(e.version(), Some(4));
        }
    }
}

#[cfg(test)]
mod tests_ulid {
    use super::sampling::{assert_bits, assert_canonical, assert_recent, assert_unique, N_SAMPLES};
    use super::{ulid, ulid_fast};
    use crate::Ulid;

    const PATTERN: &str = r"^[0-7][0-9A-HJKMNP-TV-Z]{25}$";

    thread_local! {
        static SAMPLES: Vec<Ulid> = (0..N_SAMPLES).map(|_| ulid()).collect();
        static FAST_SAMPLES: Vec<Ulid> = (0..N_SAMPLES).map(|_| ulid_fast()).collect();
    }

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        SAMPLES.with(|samples| assert_canonical(samples, PATTERN));
        FAST_SAMPLES.with(|samples| assert_canonical(samples, PATTERN));
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        SAMPLES.with(|samples| assert_unique(samples));
        FAST_SAMPLES.with(|samples| assert_unique(samples));
    }

    /// Sets random bits properly
    #[test]
    fn sets_random_bits_properly() {
        SAMPLES.with(|samples| assert_bits(samples, &[], 48..128));
        FAST_SAMPLES.with(|samples| assert_bits(samples, &[], 48..128));
    }

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        let last = SAMPLES.with(|samples| samples[N_SAMPLES - 1].timestamp());
        assert_recent(last, 10_000);
        let last = FAST_SAMPLES.with(|samples| samples[N_SAMPLES - 1].timestamp());
        assert_recent(last, 10_000);
        for _ in 0..10_000 {
            assert_recent(ulid().timestamp(), 16);
            assert_recent(ulid_fast().timestamp(), 16);
        }
    }

    /// Generates timestamp prefixes in non-decreasing order
    #[test]
    fn generates_timestamp_prefixes_in_non_decreasing_order() {
        for samples in [SAMPLES.with(Vec::clone), FAST_SAMPLES.with(Vec::clone)] {
            for w in samples.windows(2) {
                assert!(w[0].timestamp() <= w[1].timestamp());
            }
        }
    }
}
