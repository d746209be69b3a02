//! System clock readings in the units used by identifier timestamps.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Number of 100-nanosecond intervals between 1582-10-15 and 1970-01-01.
pub(crate) const GREGORIAN_OFFSET: u64 = 0x01b2_1dd2_1381_4000;

const TICKS_PER_SECOND: i64 = 10_000_000;

fn since_unix_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock may have gone backwards")
}

/// Returns the current Unix timestamp in milliseconds.
pub(crate) fn unix_ts_ms() -> u64 {
    since_unix_epoch().as_millis() as u64
}

/// Returns the current time as 100-nanosecond intervals since 1582-10-15.
pub(crate) fn gregorian_ticks() -> u64 {
    let d = since_unix_epoch();
    d.as_secs() * TICKS_PER_SECOND as u64 + (d.subsec_nanos() / 100) as u64 + GREGORIAN_OFFSET
}

/// Converts 100-nanosecond intervals since 1582-10-15 into an instant.
pub(crate) fn gregorian_instant(ticks: u64) -> Option<DateTime<Utc>> {
    let unix_ticks = ticks as i64 - GREGORIAN_OFFSET as i64;
    DateTime::<Utc>::from_timestamp(
        unix_ticks.div_euclid(TICKS_PER_SECOND),
        (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::{gregorian_instant, gregorian_ticks, unix_ts_ms, GREGORIAN_OFFSET};

    /// Converts Gregorian ticks to instants
    #[test]
    fn converts_gregorian_ticks_to_instants() {
        assert_eq!(
            gregorian_instant(GREGORIAN_OFFSET).map(|t| t.timestamp()),
            Some(0)
        );
        assert_eq!(
            gregorian_instant(0x1ec_9414_c232_ab00).map(|t| t.to_rfc3339()),
            Some("2022-02-22T19:22:22+00:00".to_owned())
        );
        assert_eq!(
            gregorian_instant(0).map(|t| t.to_rfc3339()),
            Some("1582-10-15T00:00:00+00:00".to_owned())
        );
    }

    /// Reads both clocks consistently
    #[test]
    fn reads_both_clocks_consistently() {
        let ms = unix_ts_ms();
        let ticks = gregorian_ticks();
        let from_ticks = (ticks - GREGORIAN_OFFSET) / 10_000;
        assert!(from_ticks >= ms && from_ticks - ms < 1_000);
    }
}
