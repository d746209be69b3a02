use std::{fmt, str};

use chrono::{DateTime, Utc};
use fstr::FStr;

use crate::{Error, Uuid};

/// Represents a Universally Unique Lexicographically Sortable Identifier.
///
/// A ULID is a 48-bit big-endian Unix timestamp in milliseconds followed by 80 bits of
/// randomness, rendered as 26 characters of Crockford's base32.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Ulid([u8; 16]);

pub(crate) const MAX_TIMESTAMP: u64 = (1 << 48) - 1;
pub(crate) const MAX_RANDOMNESS: u128 = (1 << 80) - 1;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Maps ASCII bytes to base32 digit values, `0xff` marking bytes outside the alphabet.
const DECODE_MAP: [u8; 256] = {
    let mut map = [0xff; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        map[ALPHABET[i] as usize] = i as u8;
        map[ALPHABET[i].to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }
    // Crockford aliases
    map[b'O' as usize] = 0;
    map[b'o' as usize] = 0;
    map[b'I' as usize] = 1;
    map[b'i' as usize] = 1;
    map[b'L' as usize] = 1;
    map[b'l' as usize] = 1;
    map
};

impl Ulid {
    /// Nil ULID (00000000000000000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max ULID (7ZZZZZZZZZZZZZZZZZZZZZZZZZ)
    pub const MAX: Self = Self([0xff; 16]);

    /// Creates a ULID from a 48-bit timestamp in milliseconds and 80 bits of randomness.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_parts(timestamp: u64, randomness: u128) -> Self {
        if timestamp > MAX_TIMESTAMP || randomness > MAX_RANDOMNESS {
            panic!("invalid field value");
        }

        Self(((timestamp as u128) << 80 | randomness).to_be_bytes())
    }

    /// Creates a ULID from a 16-byte big-endian array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the 48-bit timestamp field in milliseconds since the Unix epoch.
    pub const fn timestamp(&self) -> u64 {
        (u128::from_be_bytes(self.0) >> 80) as u64
    }

    /// Returns the 80-bit randomness field.
    pub const fn randomness(&self) -> u128 {
        u128::from_be_bytes(self.0) & MAX_RANDOMNESS
    }

    /// Returns the instant encoded in the timestamp field.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp() as i64)
    }

    /// Reinterprets the 128 bits as a UUID.
    ///
    /// The version field is overwritten with `8` (the custom format, which claims no generation
    /// semantics) and the variant field with `10`, so that the result is a well-formed UUID. The
    /// other 122 bits are copied unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cup_uid::Ulid;
    ///
    /// let ulid = "01ARZ3NDEKTSV4RRFFQ69G5FAV".parse::<Ulid>()?;
    /// assert_eq!(ulid.to_uuid().to_string(), "01563e3a-b5d3-8676-8c61-efb99302bd5b");
    /// # Ok::<(), cup_uid::Error>(())
    /// ```
    pub const fn to_uuid(&self) -> Uuid {
        Uuid::from_payload(8, u128::from_be_bytes(self.0))
    }

    /// Reinterprets the 128 bits as a UUIDv4, overwriting the version field with `4` and the
    /// variant field with `10`.
    ///
    /// The result no longer carries a recognizable timestamp, so the creation order is lost.
    pub const fn to_uuid_v4(&self) -> Uuid {
        Uuid::from_payload(4, u128::from_be_bytes(self.0))
    }

    /// Copies all 128 bits of a UUID into a ULID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(*uuid.as_bytes())
    }

    /// Returns the 26-character Crockford base32 representation stored in a stack-allocated
    /// string type that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    pub fn encode(&self) -> FStr<26> {
        let value = u128::from_be_bytes(self.0);
        let mut buffer = [0u8; 26];
        for (i, e) in buffer.iter_mut().enumerate() {
            *e = ALPHABET[(value >> (5 * (25 - i))) as usize & 31];
        }
        debug_assert!(buffer.is_ascii());
        // SAFETY: ok because buffer consists of ASCII code points
        unsafe { FStr::from_bytes_unchecked(buffer) }
    }
}

impl fmt::Display for Ulid {
    /// Returns the 26-character canonical Crockford base32 representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Ulid {
    type Err = Error;

    /// Creates an object from the 26-character Crockford base32 representation.
    ///
    /// Decoding is case-insensitive and accepts the aliases `O` for `0` and `I` and `L` for `1`.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        if src.len() != 26 {
            return Err(Error::malformed_ulid("expected 26 characters"));
        }

        let mut value = 0u128;
        for (i, c) in src.bytes().enumerate() {
            let digit = DECODE_MAP[c as usize];
            if digit == 0xff {
                return Err(Error::malformed_ulid("invalid base32 digit"));
            }
            if i == 0 && digit > 7 {
                return Err(Error::malformed_ulid("value exceeds 128 bits"));
            }
            value = (value << 5) | digit as u128;
        }
        Ok(Self(value.to_be_bytes()))
    }
}

impl From<Ulid> for [u8; 16] {
    fn from(src: Ulid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Ulid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Ulid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Ulid> for u128 {
    fn from(src: Ulid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Ulid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<Ulid> for String {
    fn from(src: Ulid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Ulid {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Ulid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Ulid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Ulid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Ulid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a ULID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            <[u8; 16]>::try_from(value)
                .map(Self::Value::from)
                .map_err(de::Error::custom)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::Ulid;
        use serde_test::{assert_tokens, Configure, Token};

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases = [
                ("00000000000000000000000000", &[0u8; 16]),
                (
                    "01G2Q5J1WCFE0B24SFW5562QXK",
                    &[
                        1, 128, 174, 89, 7, 140, 123, 128, 177, 19, 47, 225, 74, 97, 95, 179,
                    ],
                ),
            ];

            for (text, bytes) in cases {
                let e = text.parse::<Ulid>().unwrap();
                assert_tokens(&e.readable(), &[Token::String(text)]);
                assert_tokens(&e.compact(), &[Token::Bytes(bytes)]);
            }
        }
    }
}
