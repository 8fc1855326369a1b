use std::fmt;

use cid::{Cid, Version};

use crate::codec::{CidFormat, Codec};

/// Hash length sentinel: use the hash function's natural digest length.
pub const DEFAULT_HASH_LENGTH: i32 = -1;

/// Multicodec code of sha2-256, the hash function every version 0
/// identifier carries.
const SHA2_256: u64 = 0x12;

/// The non-digest part of an identifier, used as a template for deriving an
/// identifier from new content.
///
/// Codec and hash function are held as raw multicodec codes so that a prefix
/// can describe combinations the builder will refuse; validation happens when
/// an identifier is built, not when the template is assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Prefix {
    pub version: Version,
    pub codec: u64,
    pub mh_type: u64,
    /// Digest length in bytes, or [`DEFAULT_HASH_LENGTH`].
    pub mh_len: i32,
}

impl Prefix {
    /// The legacy version 0 template: dag-pb, sha2-256, natural length.
    pub const fn v0() -> Self {
        Self {
            version: Version::V0,
            codec: Codec::DAG_PROTOBUF,
            mh_type: SHA2_256,
            mh_len: DEFAULT_HASH_LENGTH,
        }
    }

    /// A version 1 template for the given codec and hash function code.
    pub const fn v1(codec: Codec, mh_type: u64) -> Self {
        Self {
            version: Version::V1,
            codec: codec.code(),
            mh_type,
            mh_len: DEFAULT_HASH_LENGTH,
        }
    }

    /// Assemble a template from a user-facing format, a hash code and length.
    pub fn from_format(format: CidFormat, mh_type: u64, mh_len: i32) -> Self {
        let (version, codec) = format.version_and_codec();
        Self {
            version,
            codec: codec.code(),
            mh_type,
            mh_len,
        }
    }

    /// The template an existing identifier was derived with.
    pub fn of(cid: &Cid) -> Self {
        Self {
            version: cid.version(),
            codec: cid.codec(),
            mh_type: cid.hash().code(),
            mh_len: i32::from(cid.hash().size()),
        }
    }

    /// Replace the hash length.
    pub fn with_length(mut self, mh_len: i32) -> Self {
        self.mh_len = mh_len;
        self
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Self::v0()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = u64::from(self.version);
        write!(
            f,
            "v{version}-{:#x}-{:#x}-{}",
            self.codec, self.mh_type, self.mh_len
        )
    }
}
