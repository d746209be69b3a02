use std::{fmt, str};

use fstr::FStr;

use crate::Error;

/// Represents a Universally Unique IDentifier.
///
/// The value is stored as a 16-byte big-endian array, so the derived ordering agrees with the
/// lexicographic ordering of the canonical string representation.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

/// Bit mask covering the 4-bit version field and the 2-bit RFC variant field.
const VERSION_VARIANT_MASK: u128 = (0xf_u128 << 76) | (0x3_u128 << 62);

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Creates a UUID from a 16-byte big-endian array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates a UUIDv1 from a 60-bit Gregorian timestamp (100-nanosecond intervals since
    /// 1582-10-15), a 14-bit clock sequence, and a 48-bit node identifier.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_fields_v1(timestamp: u64, clock_seq: u16, node: u64) -> Self {
        if timestamp >= 1 << 60 || clock_seq >= 1 << 14 || node >= 1 << 48 {
            panic!("invalid field value");
        }

        let time_low = timestamp & 0xffff_ffff;
        let time_mid = (timestamp >> 32) & 0xffff;
        let time_hi = timestamp >> 48;
        Self::from_u128(
            (time_low as u128) << 96
                | (time_mid as u128) << 80
                | ((0x1000 | time_hi) as u128) << 64
                | ((0x8000 | clock_seq) as u128) << 48
                | node as u128,
        )
    }

    /// Creates a DCE Security UUID (version 2) from a 32-bit local identifier, a local domain
    /// byte, a 60-bit Gregorian timestamp, a 6-bit clock sequence, and a 48-bit node identifier.
    ///
    /// The local identifier takes the place of the low 32 bits of the timestamp and the domain
    /// takes the place of the low byte of the clock sequence.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_fields_v2(
        local_id: u32,
        domain: u8,
        timestamp: u64,
        clock_seq: u8,
        node: u64,
    ) -> Self {
        if timestamp >= 1 << 60 || clock_seq >= 1 << 6 || node >= 1 << 48 {
            panic!("invalid field value");
        }

        let time_mid = (timestamp >> 32) & 0xffff;
        let time_hi = timestamp >> 48;
        Self::from_u128(
            (local_id as u128) << 96
                | (time_mid as u128) << 80
                | ((0x2000 | time_hi) as u128) << 64
                | ((0x80 | clock_seq) as u128) << 56
                | (domain as u128) << 48
                | node as u128,
        )
    }

    /// Creates a UUIDv6 from the same field values as [`Uuid::from_fields_v1`], laying out the
    /// timestamp from the most significant bits down so the value sorts by creation time.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_fields_v6(timestamp: u64, clock_seq: u16, node: u64) -> Self {
        if timestamp >= 1 << 60 || clock_seq >= 1 << 14 || node >= 1 << 48 {
            panic!("invalid field value");
        }

        let time_high = timestamp >> 28;
        let time_mid = (timestamp >> 12) & 0xffff;
        let time_low = timestamp & 0x0fff;
        Self::from_u128(
            (time_high as u128) << 96
                | (time_mid as u128) << 80
                | ((0x6000 | time_low) as u128) << 64
                | ((0x8000 | clock_seq) as u128) << 48
                | node as u128,
        )
    }

    /// Creates a UUIDv7 from a 48-bit Unix timestamp in milliseconds and 12 + 62 bits of payload.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds the width of its field.
    pub const fn from_fields_v7(unix_ts_ms: u64, rand_a: u16, rand_b: u64) -> Self {
        if unix_ts_ms >= 1 << 48 || rand_a >= 1 << 12 || rand_b >= 1 << 62 {
            panic!("invalid field value");
        }

        Self([
            (unix_ts_ms >> 40) as u8,
            (unix_ts_ms >> 32) as u8,
            (unix_ts_ms >> 24) as u8,
            (unix_ts_ms >> 16) as u8,
            (unix_ts_ms >> 8) as u8,
            unix_ts_ms as u8,
            0x70 | (rand_a >> 8) as u8,
            rand_a as u8,
            0x80 | (rand_b >> 56) as u8,
            (rand_b >> 48) as u8,
            (rand_b >> 40) as u8,
            (rand_b >> 32) as u8,
            (rand_b >> 24) as u8,
            (rand_b >> 16) as u8,
            (rand_b >> 8) as u8,
            rand_b as u8,
        ])
    }

    /// Creates a UUID from arbitrary 128 bits, overwriting the version field with `version` and
    /// the variant field with `10`.
    ///
    /// # Panics
    ///
    /// Panics if `version` is not a 4-bit value.
    pub const fn from_payload(version: u8, payload: u128) -> Self {
        if version > 0xf {
            panic!("invalid version number");
        }

        Self::from_u128(
            (payload & !VERSION_VARIANT_MASK) | (version as u128) << 76 | 0b10_u128 << 62,
        )
    }

    /// Creates a UUID from its 128-bit big-endian integer value.
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Reports the variant field value of the UUID.
    pub const fn variant(&self) -> Variant {
        match self.0[8] >> 4 {
            0x0..=0x7 => Variant::Var0,
            0x8..=0xb => Variant::Var10,
            0xc..=0xd => Variant::Var110,
            _ => Variant::VarReserved,
        }
    }

    /// Returns the version field value of the UUID, or `None` if the UUID does not have the
    /// RFC variant (`10`).
    pub const fn version(&self) -> Option<u8> {
        match self.variant() {
            Variant::Var10 => Some(self.0[6] >> 4),
            _ => None,
        }
    }

    /// Splits the UUID into the field values of its layout.
    ///
    /// Decoding never fails: values without a recognized time-carrying layout are returned as
    /// [`Fields::Opaque`].
    pub fn decode(&self) -> Fields {
        let value = u128::from(*self);
        let time_mid = (value >> 80) as u64 & 0xffff;
        let time_hi = (value >> 64) as u64 & 0x0fff;
        let node = value as u64 & 0xffff_ffff_ffff;

        match self.version() {
            Some(1) => Fields::Gregorian {
                timestamp: time_hi << 48 | time_mid << 32 | (value >> 96) as u64,
                clock_seq: (value >> 48) as u16 & 0x3fff,
                node,
            },
            Some(2) => Fields::DceSecurity {
                local_id: (value >> 96) as u32,
                domain: (value >> 48) as u8,
                timestamp: time_hi << 48 | time_mid << 32,
                clock_seq: (value >> 56) as u8 & 0x3f,
                node,
            },
            Some(6) => Fields::Gregorian {
                timestamp: ((value >> 96) as u64) << 28 | time_mid << 12 | time_hi,
                clock_seq: (value >> 48) as u16 & 0x3fff,
                node,
            },
            Some(7) => Fields::UnixTime {
                unix_ts_ms: (value >> 80) as u64,
                rand_a: time_hi as u16,
                rand_b: value as u64 & ((1 << 62) - 1),
            },
            Some(_) => Fields::Opaque {
                payload: value & !VERSION_VARIANT_MASK,
            },
            None => Fields::Opaque { payload: value },
        }
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// string type that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cup_uid::Uuid;
    ///
    /// let x = "01809424-3e59-7c05-9219-566f82fff672".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(&y as &str, "01809424-3e59-7c05-9219-566f82fff672");
    /// assert_eq!(format!("{}", y), "01809424-3e59-7c05-9219-566f82fff672");
    /// # Ok::<(), cup_uid::Error>(())
    /// ```
    pub fn encode(&self) -> FStr<36> {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut pos = 0;
        for (i, e) in self.0.iter().enumerate() {
            buffer[pos] = DIGITS[(e >> 4) as usize];
            buffer[pos + 1] = DIGITS[(e & 15) as usize];
            pos += 2;
            if i == 3 || i == 5 || i == 7 || i == 9 {
                buffer[pos] = b'-';
                pos += 1;
            }
        }
        debug_assert!(buffer.is_ascii());
        // SAFETY: ok because buffer consists of ASCII code points
        unsafe { FStr::from_bytes_unchecked(buffer) }
    }
}

/// UUID variant field values.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// `0xxx`: reserved for NCS backward compatibility (includes the Nil UUID).
    Var0,
    /// `10xx`: the variant specified by RFC 4122 and RFC 9562.
    Var10,
    /// `110x`: reserved for Microsoft backward compatibility.
    Var110,
    /// `111x`: reserved for future definition (includes the Max UUID).
    VarReserved,
}

/// Field values of a UUID as laid out by its version.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Fields {
    /// Version 1 or 6.
    Gregorian {
        /// 60-bit count of 100-nanosecond intervals since 1582-10-15.
        timestamp: u64,
        /// 14-bit clock sequence.
        clock_seq: u16,
        /// 48-bit node identifier.
        node: u64,
    },
    /// Version 2.
    DceSecurity {
        local_id: u32,
        domain: u8,
        /// Gregorian timestamp with the low 32 bits lost to `local_id`.
        timestamp: u64,
        /// 6-bit clock sequence.
        clock_seq: u8,
        node: u64,
    },
    /// Version 7.
    UnixTime {
        unix_ts_ms: u64,
        rand_a: u16,
        rand_b: u64,
    },
    /// Any other layout. The version and variant bits are cleared when the UUID has the RFC
    /// variant; otherwise the 128 bits are returned as they are.
    Opaque { payload: u128 },
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = Error;

    /// Creates an object from the 8-4-4-4-12 hexadecimal string representation.
    ///
    /// Upper and lower case digits are accepted. The variant bits must be `10` unless the string
    /// represents the Nil or Max UUID.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const ERR_DIGIT: Error = Error::malformed_uuid("invalid hexadecimal digit");
        if src.len() != 36 {
            return Err(Error::malformed_uuid("expected 36 characters"));
        }

        let mut dst = [0u8; 16];
        let mut iter = src.bytes();
        for (i, e) in dst.iter_mut().enumerate() {
            let hi = iter.next().and_then(hex_digit).ok_or(ERR_DIGIT)?;
            let lo = iter.next().and_then(hex_digit).ok_or(ERR_DIGIT)?;
            *e = (hi << 4) | lo;
            if (i == 3 || i == 5 || i == 7 || i == 9) && iter.next() != Some(b'-') {
                return Err(Error::malformed_uuid("hyphen expected"));
            }
        }

        let uuid = Self(dst);
        if uuid.variant() == Variant::Var10 || uuid == Self::NIL || uuid == Self::MAX {
            Ok(uuid)
        } else {
            Err(Error::malformed_uuid("variant bits must be 10"))
        }
    }
}

const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Uuid {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
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
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
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

}

#[cfg(test)]
mod tests {
    use super::{Fields, Uuid, Variant};

    /// Returns a collection of prepared UUIDv7 cases
    fn prepare_cases() -> &'static [((u64, u16, u64), &'static str)] {
        const MAX_UINT48: u64 = (1 << 48) - 1;
        const MAX_UINT12: u16 = (1 << 12) - 1;
        const MAX_UINT62: u64 = (1 << 62) - 1;

        &[
            ((0, 0, 0), "00000000-0000-7000-8000-000000000000"),
            ((MAX_UINT48, 0, 0), "ffffffff-ffff-7000-8000-000000000000"),
            ((0, MAX_UINT12, 0), "00000000-0000-7fff-8000-000000000000"),
            ((0, 0, MAX_UINT62), "00000000-0000-7000-bfff-ffffffffffff"),
            (
                (MAX_UINT48, MAX_UINT12, MAX_UINT62),
                "ffffffff-ffff-7fff-bfff-ffffffffffff",
            ),
            (
                (0x17f22e279b0, 0xcc3, 0x18c4dc0c0c07398f),
                "017f22e2-79b0-7cc3-98c4-dc0c0c07398f",
            ),
        ]
    }

    /// Encodes and decodes prepared cases correctly
    #[test]
    fn encodes_and_decodes_prepared_cases_correctly() {
        for (fs, text) in prepare_cases() {
            let from_fields = Uuid::from_fields_v7(fs.0, fs.1, fs.2);
            assert_eq!(Ok(from_fields), text.parse());
            assert_eq!(Ok(from_fields), text.to_uppercase().parse());
            assert_eq!(&from_fields.encode() as &str, *text);
            assert_eq!(&from_fields.to_string(), text);
            assert_eq!(
                from_fields.decode(),
                Fields::UnixTime {
                    unix_ts_ms: fs.0,
                    rand_a: fs.1,
                    rand_b: fs.2,
                }
            );
            #[cfg(feature = "uuid")]
            assert_eq!(&uuid::Uuid::from(from_fields).to_string(), text);
        }
    }

    /// Encodes time-based test vectors from RFC 9562
    #[test]
    fn encodes_time_based_test_vectors() {
        const TIMESTAMP: u64 = 0x1ec_9414_c232_ab00;
        const CLOCK_SEQ: u16 = 0x33c8;
        const NODE: u64 = 0x9f6b_dece_d846;

        let v1 = Uuid::from_fields_v1(TIMESTAMP, CLOCK_SEQ, NODE);
        assert_eq!(&v1.encode() as &str, "c232ab00-9414-11ec-b3c8-9f6bdeced846");
        assert_eq!(v1.version(), Some(1));

        let v6 = Uuid::from_fields_v6(TIMESTAMP, CLOCK_SEQ, NODE);
        assert_eq!(&v6.encode() as &str, "1ec9414c-232a-6b00-b3c8-9f6bdeced846");
        assert_eq!(v6.version(), Some(6));

        let expected = Fields::Gregorian {
            timestamp: TIMESTAMP,
            clock_seq: CLOCK_SEQ,
            node: NODE,
        };
        assert_eq!(v1.decode(), expected);
        assert_eq!(v6.decode(), expected);
    }

    /// Replaces time low and clock sequence low with DCE Security fields
    #[test]
    fn replaces_time_low_and_clock_sequence_low_with_dce_fields() {
        let v2 = Uuid::from_fields_v2(1000, 0, 0x1ec_9414_c232_ab00, 0x33, 0x9f6b_dece_d846);
        assert_eq!(&v2.encode() as &str, "000003e8-9414-21ec-b300-9f6bdeced846");
        assert_eq!(
            v2.decode(),
            Fields::DceSecurity {
                local_id: 1000,
                domain: 0,
                timestamp: 0x1ec_9414_0000_0000,
                clock_seq: 0x33,
                node: 0x9f6b_dece_d846,
            }
        );
    }

    /// Overwrites version and variant bits of payload
    #[test]
    fn overwrites_version_and_variant_bits_of_payload() {
        let e = Uuid::from_payload(4, u128::MAX);
        assert_eq!(&e.encode() as &str, "ffffffff-ffff-4fff-bfff-ffffffffffff");
        assert_eq!(e.version(), Some(4));
        assert_eq!(e.variant(), Variant::Var10);

        let e = Uuid::from_payload(8, 0);
        assert_eq!(&e.encode() as &str, "00000000-0000-8000-8000-000000000000");
        assert_eq!(e.decode(), Fields::Opaque { payload: 0 });
    }

    /// Returns error to invalid string representation
    #[test]
    fn returns_error_to_invalid_string_representation() {
        let cases = [
            "",
            " 0180a8f0-5b82-75b4-9fef-ecad657c30bb",
            "0180a8f0-5b84-7438-ab50-f0626f78002b ",
            " 0180a8f0-5b84-7438-ab50-f063bd5331af ",
            "+0180a8f0-5b84-7438-ab50-f06405d35edb",
            "-0180a8f0-5b84-7438-ab50-f06508df4c2d",
            "+180a8f0-5b84-7438-ab50-f066aa10a367",
            "-180a8f0-5b84-7438-ab50-f067cdce1d69",
            "0180a8f05b847438ab50f068decfbfd7",
            "0180a8f0-5b847438-ab50-f06991838802",
            "{0180a8f0-5b84-7438-ab50-f06ac2e5e082}",
            "0180a8f0-5b84-74 8-ab50-f06bed27bdc7",
            "0180a8g0-5b84-7438-ab50-f06c91175b8a",
            "0180a8f0-5b84-7438-ab50_f06d3ea24429",
            "0180a8f0-5b84-7438-7b50-f06d3ea24429",
            "0180a8f0-5b84-7438-cb50-f06d3ea24429",
            "0180a8f0-5b84-7438-eb50-f06d3ea24429",
            "0180a8f0-5b84-7438-ab50-f06d3ea2442é",
        ];

        for e in cases {
            assert!(e.parse::<Uuid>().unwrap_err().is_malformed(), "{e}");
        }
    }

    /// Returns Nil and Max UUIDs
    #[test]
    fn returns_nil_and_max_uuids() {
        assert_eq!(
            &Uuid::NIL.encode() as &str,
            "00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            &Uuid::MAX.encode() as &str,
            "ffffffff-ffff-ffff-ffff-ffffffffffff"
        );
        assert_eq!("00000000-0000-0000-0000-000000000000".parse(), Ok(Uuid::NIL));
        assert_eq!("FFFFFFFF-FFFF-FFFF-FFFF-FFFFFFFFFFFF".parse(), Ok(Uuid::MAX));
        assert_eq!(Uuid::NIL.variant(), Variant::Var0);
        assert_eq!(Uuid::MAX.variant(), Variant::VarReserved);
        assert_eq!(Uuid::NIL.version(), None);
    }

    /// Has symmetric converters
    #[test]
    fn has_symmetric_converters() {
        for (fs, _) in prepare_cases() {
            let e = Uuid::from_fields_v7(fs.0, fs.1, fs.2);
            assert_eq!(Uuid::from(<[u8; 16]>::from(e)), e);
            assert_eq!(Uuid::from(u128::from(e)), e);
            assert_eq!(Uuid::from_bytes(*e.as_bytes()), e);
            assert_eq!(e.encode().parse(), Ok(e));
            assert_eq!(e.encode().to_uppercase().parse(), Ok(e));
            assert_eq!(Uuid::try_from(e.to_string()), Ok(e));
            assert_eq!(Uuid::try_from(e.to_string().to_uppercase()), Ok(e));
            #[cfg(feature = "uuid")]
            assert_eq!(Uuid::from(<uuid::Uuid>::from(e)), e);
            #[cfg(feature = "uuid")]
            assert_eq!(uuid::Uuid::from(e).as_u128(), u128::from(e));
        }
    }
}
