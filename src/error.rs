//! Error type shared by parsers and generators.

use std::fmt;
use thiserror::Error;

use crate::Version;

/// Text format an input was expected to be in.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Format {
    /// 8-4-4-4-12 hexadecimal UUID representation.
    Uuid,
    /// 26-character Crockford base32 ULID representation.
    Ulid,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uuid => "UUID",
            Self::Ulid => "ULID",
        })
    }
}

/// Errors returned by parsing and generation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum Error {
    /// The input is not a valid string representation.
    #[error("invalid {format} string representation: {reason}")]
    Malformed {
        /// Format the input was parsed as.
        format: Format,
        /// Short description of the first violation found.
        reason: &'static str,
    },

    /// The identifier kind cannot be generated from the arguments given.
    #[error("cannot generate {0} from the given arguments")]
    UnsupportedVersion(Version),

    /// A sequence field is exhausted within the current time window.
    ///
    /// Raised by monotonic ULIDs when the randomness field cannot be incremented within the
    /// same millisecond, and by DCE Security UUIDs when all 64 sequence values of a timestamp
    /// window are used.
    #[error("sequence exhausted; the clock must advance before the next identifier")]
    Overflow,
}

impl Error {
    pub(crate) const fn malformed_uuid(reason: &'static str) -> Self {
        Self::Malformed {
            format: Format::Uuid,
            reason,
        }
    }

    pub(crate) const fn malformed_ulid(reason: &'static str) -> Self {
        Self::Malformed {
            format: Format::Ulid,
            reason,
        }
    }

    /// Returns true if this error was caused by an invalid string representation.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
