//! Parsing, validation and conversion between identifier formats

use chrono::{DateTime, Utc};

use crate::{Error, Identifier, Ulid, Uuid};

/// Parses the 8-4-4-4-12 hexadecimal representation of a UUID.
///
/// # Examples
///
/// ```rust
/// use cup_uid::{parse_uuid, Version};
///
/// let id = parse_uuid("886313E1-3B8A-5372-9B90-0C9AEE199E5D")?;
/// assert_eq!(id.version(), Some(Version::V5));
/// assert_eq!(id.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
/// assert!(parse_uuid("886313e1-3b8a-5372-cb90-0c9aee199e5d").is_err());
/// # Ok::<(), cup_uid::Error>(())
/// ```
pub fn parse_uuid(text: &str) -> Result<Identifier, Error> {
    text.parse::<Uuid>().map(Identifier::Uuid)
}

/// Parses the 26-character Crockford base32 representation of a ULID.
pub fn parse_ulid(text: &str) -> Result<Identifier, Error> {
    text.parse::<Ulid>().map(Identifier::Ulid)
}

/// Returns true if `text` is a valid UUID string representation.
pub fn is_valid_uuid(text: &str) -> bool {
    parse_uuid(text).is_ok()
}

/// Returns true if `text` is a valid ULID string representation.
pub fn is_valid_ulid(text: &str) -> bool {
    parse_ulid(text).is_ok()
}

/// Renders an identifier in its canonical text form.
pub fn render(id: &Identifier) -> String {
    id.to_string()
}

/// Reinterprets the bits of a ULID as a UUID of the custom format (version 8).
///
/// The version and variant fields are overwritten and the other 122 bits are kept, so the result
/// parses as a UUID but claims no generation semantics. Both fields lie in the randomness part
/// of the ULID, so converted ULIDs of the same millisecond may sort differently from the
/// originals; ULIDs of different milliseconds keep their order.
pub const fn ulid_to_uuid(ulid: Ulid) -> Uuid {
    ulid.to_uuid()
}

/// Reinterprets the bits of a ULID as a UUIDv4.
///
/// For callers that require a formally valid version 4 value. The timestamp bits remain in
/// place, but a reader of the result has no way to tell them from randomness.
pub const fn ulid_to_uuid_v4(ulid: Ulid) -> Uuid {
    ulid.to_uuid_v4()
}

/// Returns the creation instant of a time-carrying identifier, or `None` for other kinds.
pub fn instant_of(id: &Identifier) -> Option<DateTime<Utc>> {
    id.instant()
}
