//! Gregorian-time generators (UUID versions 1, 2 and 6)

use rand::RngCore;
use tracing::{debug, warn};

use crate::{clock, Error, Uuid};

const MAX_TIMESTAMP: u64 = (1 << 60) - 1;
const MAX_CLOCK_SEQ: u16 = (1 << 14) - 1;
const MAX_DCE_SEQ: u8 = (1 << 6) - 1;

/// Multicast bit of the node identifier, set on randomly generated nodes so that they never
/// collide with an IEEE 802 MAC address.
const MULTICAST_BIT: u64 = 1 << 40;

/// Default amount of clock rollback (ten seconds, in 100-nanosecond intervals) absorbed without
/// touching the clock sequence.
pub const DEFAULT_ROLLBACK_ALLOWANCE: u64 = 100_000_000;

/// Local domain of a DCE Security UUID.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LocalDomain {
    /// POSIX UID domain.
    Person,
    /// POSIX GID domain.
    Group,
    /// Organization domain.
    Org,
}

impl LocalDomain {
    /// Returns the domain byte stored in the UUID.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Person => 0,
            Self::Group => 1,
            Self::Org => 2,
        }
    }
}

/// Represents a generator of UUIDs based on the Gregorian timestamp, the clock sequence, and the
/// node identifier (UUID versions 1, 2 and 6).
///
/// The generator hands out a distinct 60-bit timestamp for every UUID: when the system clock has
/// not advanced since the previous call, or has moved back by no more than the rollback
/// allowance, the previous timestamp is incremented by one instead. When the clock moves back
/// further, the clock sequence is incremented and the generator resumes from the new time.
///
/// DCE Security UUIDs keep only the upper 28 bits of the timestamp and the upper 6 bits of the
/// clock sequence. The generator therefore steps those 6 bits on every version 2 call and
/// allows at most 64 such UUIDs per timestamp window of 2^32 ticks (about seven minutes).
///
/// # Examples
///
/// ```rust
/// use cup_uid::TimeBasedGenerator;
///
/// let mut g = TimeBasedGenerator::new(rand::rngs::OsRng);
/// println!("{}", g.generate_v1());
/// println!("{}", g.generate_v6());
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TimeBasedGenerator<R> {
    timestamp: u64,
    clock_seq: u16,
    node: u64,

    /// Upper 32 bits of the timestamp of the last DCE Security UUID.
    dce_window: u64,
    /// First and last 6-bit sequence values used within `dce_window`.
    dce_seq: Option<(u8, u8)>,

    /// Random number generator used by the generator.
    rng: R,
}

impl<R: RngCore> TimeBasedGenerator<R> {
    /// Creates a generator with a random node identifier that has the multicast bit set.
    pub fn new(mut rng: R) -> Self {
        let node = (rng.next_u64() & 0xffff_ffff_ffff) | MULTICAST_BIT;
        Self::with_node(rng, node)
    }

    /// Creates a generator with the given 48-bit node identifier.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not fit in 48 bits.
    pub fn with_node(mut rng: R, node: u64) -> Self {
        assert!(node < 1 << 48, "`node` must be a 48-bit integer");
        Self {
            timestamp: 0,
            clock_seq: rng.next_u32() as u16 & MAX_CLOCK_SEQ,
            node,
            dce_window: 0,
            dce_seq: None,
            rng,
        }
    }

    /// Returns the node identifier embedded in generated UUIDs.
    pub const fn node(&self) -> u64 {
        self.node
    }

    /// Returns the current clock sequence.
    pub const fn clock_seq(&self) -> u16 {
        self.clock_seq
    }

    /// Generates a new UUIDv1 object from the current time.
    pub fn generate_v1(&mut self) -> Uuid {
        self.generate_v1_core(clock::gregorian_ticks(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new UUIDv6 object from the current time.
    pub fn generate_v6(&mut self) -> Uuid {
        self.generate_v6_core(clock::gregorian_ticks(), DEFAULT_ROLLBACK_ALLOWANCE)
    }

    /// Generates a new DCE Security UUID (version 2) object from the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] once 64 UUIDs have been generated within the current
    /// timestamp window.
    pub fn generate_v2(&mut self, domain: LocalDomain, local_id: u32) -> Result<Uuid, Error> {
        self.generate_v2_core(
            domain,
            local_id,
            clock::gregorian_ticks(),
            DEFAULT_ROLLBACK_ALLOWANCE,
        )
    }

    /// Generates a new UUIDv1 object from the `timestamp` passed, in 100-nanosecond intervals
    /// since 1582-10-15.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 60-bit integer.
    pub fn generate_v1_core(&mut self, timestamp: u64, rollback_allowance: u64) -> Uuid {
        let timestamp = self.advance(timestamp, rollback_allowance);
        Uuid::from_fields_v1(timestamp, self.clock_seq, self.node)
    }

    /// Generates a new UUIDv6 object from the `timestamp` passed.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 60-bit integer.
    pub fn generate_v6_core(&mut self, timestamp: u64, rollback_allowance: u64) -> Uuid {
        let timestamp = self.advance(timestamp, rollback_allowance);
        Uuid::from_fields_v6(timestamp, self.clock_seq, self.node)
    }

    /// Generates a new DCE Security UUID object from the `timestamp` passed.
    ///
    /// The 6-bit clock sequence field starts from the upper bits of the clock sequence in each
    /// new timestamp window and is incremented on every call within the window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] instead of a duplicate when the 6-bit field would wrap around
    /// to its first value within the same window.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 60-bit integer.
    pub fn generate_v2_core(
        &mut self,
        domain: LocalDomain,
        local_id: u32,
        timestamp: u64,
        rollback_allowance: u64,
    ) -> Result<Uuid, Error> {
        let timestamp = self.advance(timestamp, rollback_allowance);
        let window = timestamp >> 32;
        let seq = match self.dce_seq {
            Some((first, last)) if window == self.dce_window => {
                let next = (last + 1) & MAX_DCE_SEQ;
                if next == first {
                    warn!(window, "DCE Security sequence exhausted within timestamp window");
                    return Err(Error::Overflow);
                }
                self.dce_seq = Some((first, next));
                next
            }
            _ => {
                let first = (self.clock_seq >> 8) as u8;
                self.dce_window = window;
                self.dce_seq = Some((first, first));
                first
            }
        };
        Ok(Uuid::from_fields_v2(
            local_id,
            domain.as_u8(),
            timestamp,
            seq,
            self.node,
        ))
    }

    fn advance(&mut self, timestamp: u64, rollback_allowance: u64) -> u64 {
        assert!(
            timestamp <= MAX_TIMESTAMP,
            "`timestamp` must be a 60-bit integer"
        );
        assert!(
            rollback_allowance <= MAX_TIMESTAMP,
            "`rollback_allowance` out of reasonable range"
        );

        if timestamp > self.timestamp {
            self.timestamp = timestamp;
        } else if timestamp + rollback_allowance >= self.timestamp
            && self.timestamp < MAX_TIMESTAMP
        {
            // go on with previous timestamp if new one is not much smaller
            self.timestamp += 1;
        } else {
            self.clock_seq = (self.clock_seq + 1) & MAX_CLOCK_SEQ;
            self.timestamp = timestamp;
            debug!(
                clock_seq = self.clock_seq,
                timestamp, "clock moved backwards; incremented clock sequence"
            );
        }
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalDomain, TimeBasedGenerator, DEFAULT_ROLLBACK_ALLOWANCE, MULTICAST_BIT};
    use crate::{Error, Fields, Uuid};
    use rand::rngs::ThreadRng;

    const TS: u64 = 0x1ec_9414_c232_ab00;
    const NODE: u64 = 0x9f6b_dece_d846;

    type ThreadGen = TimeBasedGenerator<ThreadRng>;

    fn timestamp_of(e: Uuid) -> u64 {
        match e.decode() {
            Fields::Gregorian { timestamp, .. } => timestamp,
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    /// Embeds node and clock sequence
    #[test]
    fn embeds_node_and_clock_sequence() {
        let mut g = ThreadGen::with_node(rand::thread_rng(), NODE);
        let e = g.generate_v1_core(TS, DEFAULT_ROLLBACK_ALLOWANCE);
        assert_eq!(
            e.decode(),
            Fields::Gregorian {
                timestamp: TS,
                clock_seq: g.clock_seq(),
                node: NODE,
            }
        );
        assert!(e.to_string().starts_with("c232ab00-9414-11ec-"));
        assert!(e.to_string().ends_with("-9f6bdeced846"));
    }

    /// Sets multicast bit of random node
    #[test]
    fn sets_multicast_bit_of_random_node() {
        for _ in 0..100 {
            let g = ThreadGen::new(rand::thread_rng());
            assert_ne!(g.node() & MULTICAST_BIT, 0);
            assert!(g.node() < 1 << 48);
        }
    }

    /// Generates increasing UUIDv6 even with decreasing or constant timestamp
    #[test]
    fn generates_increasing_uuidv6_even_with_decreasing_or_constant_timestamp() {
        let mut g = ThreadGen::new(rand::thread_rng());
        let clock_seq = g.clock_seq();
        let mut prev = g.generate_v6_core(TS, DEFAULT_ROLLBACK_ALLOWANCE);
        for i in 0..100_000u64 {
            let curr = g.generate_v6_core(TS - i.min(4_000), DEFAULT_ROLLBACK_ALLOWANCE);
            assert!(prev < curr);
            assert!(prev.to_string() < curr.to_string());
            prev = curr;
        }
        assert_eq!(g.clock_seq(), clock_seq);
        assert_eq!(timestamp_of(prev), TS + 100_000);
    }

    /// Increments clock sequence if timestamp goes backwards a lot
    #[test]
    fn increments_clock_sequence_if_timestamp_goes_backwards_a_lot() {
        let mut g = ThreadGen::new(rand::thread_rng());
        let clock_seq = g.clock_seq();
        let prev = g.generate_v1_core(TS, DEFAULT_ROLLBACK_ALLOWANCE);

        let curr = g.generate_v1_core(TS - DEFAULT_ROLLBACK_ALLOWANCE, DEFAULT_ROLLBACK_ALLOWANCE);
        assert_eq!(timestamp_of(curr), TS + 1);
        assert_eq!(g.clock_seq(), clock_seq);

        let rewound = TS - DEFAULT_ROLLBACK_ALLOWANCE - 2;
        let curr = g.generate_v1_core(rewound, DEFAULT_ROLLBACK_ALLOWANCE);
        assert_eq!(timestamp_of(curr), rewound);
        assert_eq!(g.clock_seq(), (clock_seq + 1) & 0x3fff);
        assert_ne!(prev, curr);
    }

    /// Replaces time low with local identifier in DCE Security UUIDs
    #[test]
    fn replaces_time_low_with_local_identifier_in_dce_security_uuids() {
        let mut g = ThreadGen::with_node(rand::thread_rng(), NODE);
        let e = g
            .generate_v2_core(LocalDomain::Group, 501, TS, DEFAULT_ROLLBACK_ALLOWANCE)
            .unwrap();
        assert_eq!(e.version(), Some(2));
        assert!(e.to_string().starts_with("000001f5-9414-21ec-"));
        assert_eq!(
            e.decode(),
            Fields::DceSecurity {
                local_id: 501,
                domain: 1,
                timestamp: TS & !0xffff_ffff,
                clock_seq: (g.clock_seq() >> 8) as u8,
                node: NODE,
            }
        );
    }

    /// Generates distinct DCE Security UUIDs for repeated local identifiers
    #[test]
    fn generates_distinct_dce_security_uuids_for_repeated_local_identifiers() {
        use std::collections::HashSet;

        let mut g = ThreadGen::with_node(rand::thread_rng(), NODE);
        let mut s = HashSet::new();
        for _ in 0..64 {
            let e = g
                .generate_v2_core(LocalDomain::Person, 1000, TS, DEFAULT_ROLLBACK_ALLOWANCE)
                .unwrap();
            assert!(e.to_string().starts_with("000003e8-9414-21ec-"));
            assert!(s.insert(e));
        }

        assert_eq!(
            g.generate_v2_core(LocalDomain::Person, 1000, TS, DEFAULT_ROLLBACK_ALLOWANCE),
            Err(Error::Overflow)
        );

        let e = g
            .generate_v2_core(LocalDomain::Person, 1000, TS + (1 << 32), DEFAULT_ROLLBACK_ALLOWANCE)
            .unwrap();
        assert!(e.to_string().starts_with("000003e8-9415-21ec-"));
        assert!(s.insert(e));
    }

    /// Generates UUIDv6 sortable by creation time from the system clock
    #[test]
    fn generates_uuidv6_sortable_by_creation_time_from_the_system_clock() {
        let mut g = ThreadGen::new(rand::thread_rng());
        let samples: Vec<String> = (0..10_000).map(|_| g.generate_v6().into()).collect();
        for w in samples.windows(2) {
            assert!(w[0] < w[1]);
        }
        let mut g1 = ThreadGen::new(rand::thread_rng());
        assert_eq!(g1.generate_v1().version(), Some(1));
    }
}
