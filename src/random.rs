//! Stateless random-based generators
//!
//! These functions keep no state between calls. They take the random number generator (and,
//! for the time-carrying kinds, the timestamp) from the caller, so the same function serves both
//! the convenience entry points and deterministic tests.

use rand::RngCore;

use crate::{Ulid, Uuid};

/// Generates a UUIDv4 from 122 bits drawn from `rng`.
pub fn uuid4_with<R: RngCore + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes[6] = 0x40 | (bytes[6] >> 4);
    bytes[8] = 0x80 | (bytes[8] >> 2);
    Uuid::from(bytes)
}

/// Generates a UUIDv7 from `unix_ts_ms` and 74 bits drawn from `rng`.
///
/// UUIDs generated within the same millisecond are ordered by their random bits only; use
/// [`V7Generator`](crate::V7Generator) where monotonic order is required.
///
/// # Panics
///
/// Panics if `unix_ts_ms` does not fit in 48 bits.
pub fn uuid7_with<R: RngCore + ?Sized>(rng: &mut R, unix_ts_ms: u64) -> Uuid {
    Uuid::from_fields_v7(
        unix_ts_ms,
        rng.next_u32() as u16 & 0x0fff,
        rng.next_u64() >> 2,
    )
}

/// Generates a ULID from `unix_ts_ms` and 80 bits drawn from `rng`.
///
/// # Panics
///
/// Panics if `unix_ts_ms` does not fit in 48 bits.
pub fn ulid_with<R: RngCore + ?Sized>(rng: &mut R, unix_ts_ms: u64) -> Ulid {
    Ulid::from_parts(unix_ts_ms, random_tail(rng))
}

/// Draws the 80-bit randomness field of a ULID.
pub(crate) fn random_tail<R: RngCore + ?Sized>(rng: &mut R) -> u128 {
    (rng.next_u32() as u128 & 0xffff) << 64 | rng.next_u64() as u128
}
