use std::fmt;

use cairn_types::{TypeError, TypeResult};
use multihash::Multihash;
use multihash_codetable::{Code, MultihashDigest};

/// A supported multihash function.
///
/// The registry is fixed: only the functions listed in [`HashFunction::ALL`]
/// can be used to build identifiers. Each entry carries its multihash name,
/// its multicodec code and its natural digest length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashFunction {
    name: &'static str,
    code: u64,
    length: u8,
    digest: Code,
}

impl HashFunction {
    /// The default function, and the only one a version 0 identifier carries.
    pub const SHA2_256: Self = Self::new("sha2-256", 0x12, 32, Code::Sha2_256);
    pub const SHA2_512: Self = Self::new("sha2-512", 0x13, 64, Code::Sha2_512);
    pub const SHA3_512: Self = Self::new("sha3-512", 0x14, 64, Code::Sha3_512);
    pub const SHA3_256: Self = Self::new("sha3-256", 0x16, 32, Code::Sha3_256);
    pub const KECCAK_256: Self = Self::new("keccak-256", 0x1b, 32, Code::Keccak256);
    pub const BLAKE3: Self = Self::new("blake3", 0x1e, 32, Code::Blake3_256);
    pub const BLAKE2B_256: Self = Self::new("blake2b-256", 0xb220, 32, Code::Blake2b256);
    pub const BLAKE2B_512: Self = Self::new("blake2b-512", 0xb240, 64, Code::Blake2b512);

    /// Every registered function.
    pub const ALL: [Self; 8] = [
        Self::SHA2_256,
        Self::SHA2_512,
        Self::SHA3_512,
        Self::SHA3_256,
        Self::KECCAK_256,
        Self::BLAKE3,
        Self::BLAKE2B_256,
        Self::BLAKE2B_512,
    ];

    const fn new(name: &'static str, code: u64, length: u8, digest: Code) -> Self {
        Self {
            name,
            code,
            length,
            digest,
        }
    }

    /// Look up a function by its multihash name (`sha2-256`, `blake3`, ...).
    pub fn from_name(name: &str) -> TypeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| TypeError::UnsupportedHashFunction(name.to_string()))
    }

    /// Look up a function by its multicodec code.
    pub fn from_code(code: u64) -> TypeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.code == code)
            .ok_or_else(|| TypeError::UnsupportedHashFunction(format!("{code:#x}")))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    /// Natural digest length in bytes.
    pub fn natural_length(&self) -> u8 {
        self.length
    }

    /// Resolve a requested digest length.
    ///
    /// `-1` means the natural length. Any other value must lie in
    /// `1..=natural_length`; shorter values yield truncated digests.
    pub fn resolve_length(&self, requested: i32) -> TypeResult<u8> {
        if requested == cairn_types::DEFAULT_HASH_LENGTH {
            return Ok(self.length);
        }
        match u8::try_from(requested) {
            Ok(len) if len >= 1 && len <= self.length => Ok(len),
            _ => Err(TypeError::InvalidHashLength {
                requested,
                max: self.length,
            }),
        }
    }

    /// Full-length multihash of `data`.
    pub fn digest(&self, data: &[u8]) -> Multihash<64> {
        self.digest.digest(data)
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
