//! Tagged identifier value and version tags

use std::fmt;

use chrono::{DateTime, Utc};

use crate::uuid::Fields;
use crate::{clock, Ulid, Uuid};

/// Kind of identifier a generator produces.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Version {
    /// Gregorian time, clock sequence and node.
    V1,
    /// DCE Security.
    V2,
    /// MD5 name-based.
    V3,
    /// Random.
    V4,
    /// SHA-1 name-based.
    V5,
    /// Reordered Gregorian time.
    V6,
    /// Unix time in milliseconds.
    V7,
    /// Universally Unique Lexicographically Sortable Identifier.
    Ulid,
}

impl Version {
    /// Returns the version tag for a UUID version number, or `None` for numbers outside 1..=7.
    pub const fn from_uuid_version(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            4 => Some(Self::V4),
            5 => Some(Self::V5),
            6 => Some(Self::V6),
            7 => Some(Self::V7),
            _ => None,
        }
    }

    /// Returns true if identifiers of this kind carry a recoverable timestamp.
    pub const fn is_time_carrying(self) -> bool {
        matches!(self, Self::V1 | Self::V6 | Self::V7 | Self::Ulid)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("UUIDv1"),
            Self::V2 => f.write_str("UUIDv2"),
            Self::V3 => f.write_str("UUIDv3"),
            Self::V4 => f.write_str("UUIDv4"),
            Self::V5 => f.write_str("UUIDv5"),
            Self::V6 => f.write_str("UUIDv6"),
            Self::V7 => f.write_str("UUIDv7"),
            Self::Ulid => f.write_str("ULID"),
        }
    }
}

/// Represents either a UUID or a ULID.
///
/// Both arms hold 128 bits; the arm decides how the value is rendered and which bits carry the
/// version. The version is always read from the value itself, so the tag returned by
/// [`version`](Identifier::version) never disagrees with the bits.
///
/// # Examples
///
/// ```rust
/// use cup_uid::{parse_ulid, Version};
///
/// let id = parse_ulid("01ARZ3NDEKTSV4RRFFQ69G5FAV")?;
/// assert_eq!(id.version(), Some(Version::Ulid));
/// assert_eq!(id.to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
/// assert_eq!(id.instant().map(|t| t.timestamp_millis()), Some(1469922850259));
/// # Ok::<(), cup_uid::Error>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Identifier {
    /// UUID in the 8-4-4-4-12 hexadecimal form.
    Uuid(Uuid),
    /// ULID in the 26-character Crockford base32 form.
    Ulid(Ulid),
}

impl Identifier {
    /// Returns the kind of the identifier.
    ///
    /// Returns `None` for UUIDs that do not have the RFC variant or whose version number lies
    /// outside 1..=7, including the nil and max UUIDs and those produced by
    /// [`ulid_to_uuid`](crate::ulid_to_uuid).
    pub const fn version(&self) -> Option<Version> {
        match self {
            Self::Uuid(uuid) => match uuid.version() {
                Some(n) => Version::from_uuid_version(n),
                None => None,
            },
            Self::Ulid(_) => Some(Version::Ulid),
        }
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        match self {
            Self::Uuid(uuid) => uuid.as_bytes(),
            Self::Ulid(ulid) => ulid.as_bytes(),
        }
    }

    /// Returns the UUID arm, if any.
    pub const fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(uuid) => Some(uuid),
            Self::Ulid(_) => None,
        }
    }

    /// Returns the ULID arm, if any.
    pub const fn as_ulid(&self) -> Option<&Ulid> {
        match self {
            Self::Uuid(_) => None,
            Self::Ulid(ulid) => Some(ulid),
        }
    }

    /// Returns the creation instant embedded in the identifier.
    ///
    /// Defined for ULIDs and UUID versions 1, 6 and 7. Every other kind returns `None`,
    /// including version 2, whose low timestamp bits have been overwritten.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Ulid(ulid) => ulid.instant(),
            Self::Uuid(uuid) => match uuid.decode() {
                Fields::Gregorian { timestamp, .. } => clock::gregorian_instant(timestamp),
                Fields::UnixTime { unix_ts_ms, .. } => {
                    DateTime::<Utc>::from_timestamp_millis(unix_ts_ms as i64)
                }
                _ => None,
            },
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => fmt::Display::fmt(uuid, f),
            Self::Ulid(ulid) => fmt::Display::fmt(ulid, f),
        }
    }
}

impl From<Uuid> for Identifier {
    fn from(src: Uuid) -> Self {
        Self::Uuid(src)
    }
}

impl From<Ulid> for Identifier {
    fn from(src: Ulid) -> Self {
        Self::Ulid(src)
    }
}

impl From<Identifier> for String {
    fn from(src: Identifier) -> Self {
        src.to_string()
    }
}
