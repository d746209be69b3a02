//! Name-based UUIDs (versions 3 and 5) and hash-derived ULIDs
//!
//! Everything in this module is a pure function of its arguments: identical inputs always
//! produce identical identifiers, and no entropy or clock is consulted.

use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::{Ulid, Uuid};

/// Namespace for fully-qualified domain names (6ba7b810-9dad-11d1-80b4-00c04fd430c8).
pub const NAMESPACE_DNS: Uuid = Uuid::from_u128(0x6ba7b810_9dad_11d1_80b4_00c04fd430c8);

/// Namespace for URLs (6ba7b811-9dad-11d1-80b4-00c04fd430c8).
pub const NAMESPACE_URL: Uuid = Uuid::from_u128(0x6ba7b811_9dad_11d1_80b4_00c04fd430c8);

/// Namespace for ISO object identifiers (6ba7b812-9dad-11d1-80b4-00c04fd430c8).
pub const NAMESPACE_OID: Uuid = Uuid::from_u128(0x6ba7b812_9dad_11d1_80b4_00c04fd430c8);

/// Namespace for X.500 distinguished names (6ba7b814-9dad-11d1-80b4-00c04fd430c8).
pub const NAMESPACE_X500: Uuid = Uuid::from_u128(0x6ba7b814_9dad_11d1_80b4_00c04fd430c8);

/// Hash function applied to a [`NameSeed`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum HashAlgorithm {
    /// MD5, producing a UUIDv3.
    Md5,
    /// SHA-1, producing a UUIDv5.
    Sha1,
}

/// Input of name-based generation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NameSeed<'a> {
    pub namespace: Uuid,
    pub name: &'a str,
    pub algorithm: HashAlgorithm,
}

impl<'a> NameSeed<'a> {
    /// Creates a seed for a UUIDv3.
    pub const fn md5(namespace: Uuid, name: &'a str) -> Self {
        Self {
            namespace,
            name,
            algorithm: HashAlgorithm::Md5,
        }
    }

    /// Creates a seed for a UUIDv5.
    pub const fn sha1(namespace: Uuid, name: &'a str) -> Self {
        Self {
            namespace,
            name,
            algorithm: HashAlgorithm::Sha1,
        }
    }

    /// Hashes the seed into a UUIDv3 or UUIDv5 depending on the algorithm selected.
    pub fn generate(&self) -> Uuid {
        match self.algorithm {
            HashAlgorithm::Md5 => uuid3(self.namespace, self.name),
            HashAlgorithm::Sha1 => uuid5(self.namespace, self.name),
        }
    }
}

/// Generates a UUIDv3 from the MD5 hash of `namespace` followed by `name`.
///
/// # Examples
///
/// ```rust
/// use cup_uid::{name::NAMESPACE_DNS, uuid3};
///
/// let uuid = uuid3(NAMESPACE_DNS, "python.org");
/// assert_eq!(uuid.to_string(), "6fa459ea-ee8a-3ca4-894e-db77e160355e");
/// ```
pub fn uuid3(namespace: Uuid, name: &str) -> Uuid {
    let mut context = md5::Context::new();
    context.consume(namespace.as_bytes());
    context.consume(name.as_bytes());
    let digest: [u8; 16] = context.compute().into();
    Uuid::from_payload(3, u128::from_be_bytes(digest))
}

/// Generates a UUIDv5 from the first 128 bits of the SHA-1 hash of `namespace` followed by
/// `name`.
pub fn uuid5(namespace: Uuid, name: &str) -> Uuid {
    let mut hasher = Sha1::new();
    hasher.update(namespace.as_bytes());
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_payload(5, u128::from_be_bytes(bytes))
}

impl Ulid {
    /// Creates a ULID whose timestamp field is `timestamp` and whose randomness field is the
    /// first 80 bits of the SHA-256 hash of `name`.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` does not fit in 48 bits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cup_uid::Ulid;
    ///
    /// let a = Ulid::from_hash(1234567890123, "hello");
    /// let b = Ulid::from_hash(1234567890123, "hello");
    /// assert_eq!(a, b);
    /// assert_eq!(a.timestamp(), 1234567890123);
    /// ```
    pub fn from_hash(timestamp: u64, name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; 16];
        bytes[6..].copy_from_slice(&digest[..10]);
        Self::from_parts(timestamp, u128::from_be_bytes(bytes))
    }
}
