//! UUID (versions 1 to 7) and ULID generation, parsing, validation and conversion
//!
//! ```rust
//! use cup_uid::{ulid, uuid4, uuid7};
//!
//! println!("{}", uuid7()); // e.g. "01809424-3e59-7c05-9219-566f82fff672"
//! println!("{}", uuid4()); // e.g. "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
//! println!("{}", ulid()); // e.g. "01ARZ3NDEKTSV4RRFFQ69G5FAV"
//! ```
//!
//! Every identifier is a 128-bit value. [`Uuid`] renders as 36 lowercase hexadecimal characters
//! in the 8-4-4-4-12 form; [`Ulid`] renders as 26 characters of Crockford's base32. Both order
//! by their big-endian bytes, so the byte order, the value order and the text order agree.
//!
//! # Generators
//!
//! | Kind             | Source                                                  | State     |
//! | ---------------- | ------------------------------------------------------- | --------- |
//! | v1, v6           | [`TimeBasedGenerator`]: Gregorian time, clock seq, node | per value |
//! | v2               | [`TimeBasedGenerator::generate_v2`]                     | per value |
//! | v3, v5           | [`uuid3`], [`uuid5`]: hash of namespace and name        | none      |
//! | v4               | [`uuid4`], [`uuid4_with`]: 122 random bits              | none      |
//! | v7               | [`uuid7`], [`uuid7_with`]: Unix ms and 74 random bits   | none      |
//! | v7, monotonic    | [`V7Generator`]: Unix ms and a 42-bit counter           | per value |
//! | ULID             | [`ulid`], [`ulid_with`]: Unix ms and 80 random bits     | none      |
//! | ULID, fast       | [`ulid_fast`]: as [`ulid`] with a non-cryptographic RNG | none      |
//! | ULID, monotonic  | [`MonotonicUlidGenerator`]: Unix ms and an 80-bit tail  | per value |
//! | ULID, hash       | [`Ulid::from_hash`]: given ms and SHA-256 of a name     | none      |
//!
//! [`IdGenerator`] bundles all of them behind a single thread-safe value that dispatches on
//! [`Version`]:
//!
//! ```rust
//! use cup_uid::{Args, IdGenerator, LocalDomain, Version};
//!
//! let g = IdGenerator::new();
//! let a = g.generate(Version::Ulid, &Args::monotonic())?;
//! let b = g.generate(Version::Ulid, &Args::monotonic())?;
//! assert!(a.to_string() < b.to_string());
//!
//! let dce = g.generate(Version::V2, &Args::local(LocalDomain::Person, 1000))?;
//! assert_eq!(dce.version(), Some(Version::V2));
//! # Ok::<(), cup_uid::Error>(())
//! ```
//!
//! # Parsing and conversion
//!
//! ```rust
//! use cup_uid::{is_valid_uuid, parse_ulid, ulid_to_uuid, Identifier};
//!
//! let id = parse_ulid("01ARZ3NDEKTSV4RRFFQ69G5FAV")?;
//! let Identifier::Ulid(ulid) = id else { unreachable!() };
//! let uuid = ulid_to_uuid(ulid);
//! assert_eq!(uuid.to_string(), "01563e3a-b5d3-8676-8c61-efb99302bd5b");
//! assert!(is_valid_uuid(&uuid.to_string()));
//! # Ok::<(), cup_uid::Error>(())
//! ```
//!
//! # Crate features
//!
//! - `serde` enables the serialization and deserialization of [`Uuid`] and [`Ulid`].
//! - `uuid` enables the conversion between [`Uuid`] and `uuid::Uuid`.
//!
//! The generators emit [`tracing`] events when the clock moves backwards; the crate does not
//! install a subscriber.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod clock;
mod error;
mod identifier;
mod ulid;
mod uuid;
pub use error::{Error, Format};
pub use identifier::{Identifier, Version};
pub use ulid::Ulid;
pub use uuid::{Fields, Uuid, Variant};

pub mod name;
pub use name::{uuid3, uuid5, HashAlgorithm, NameSeed};

mod random;
pub use random::{ulid_with, uuid4_with, uuid7_with};

pub mod time_based;
pub use time_based::{LocalDomain, TimeBasedGenerator};

pub mod v7;
pub use v7::V7Generator;

pub mod monotonic;
pub use monotonic::MonotonicUlidGenerator;

mod generator;
pub use generator::{Args, IdGenerator};

mod convert;
pub use convert::{
    instant_of, is_valid_ulid, is_valid_uuid, parse_ulid, parse_uuid, render, ulid_to_uuid,
    ulid_to_uuid_v4,
};

mod entry;
pub use entry::{ulid, ulid_fast, uuid4, uuid7};
