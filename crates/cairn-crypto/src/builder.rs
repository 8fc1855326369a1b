use cairn_types::{Cid, Codec, Prefix, TypeError, TypeResult, Version};
use tracing::trace;

use crate::hasher::HashFunction;

/// Derives content identifiers from a [`Prefix`] and raw bytes.
///
/// Building is pure and deterministic: the same prefix and bytes always
/// yield a bit-identical identifier.
pub struct CidBuilder;

impl CidBuilder {
    /// Build the identifier for `data` under `prefix`.
    ///
    /// Version 0 identifiers are always dag-pb over a natural-length
    /// sha2-256 digest: the prefix codec is ignored, and any other hash
    /// function or length is rejected. Version 1 identifiers use the prefix
    /// codec and hash function, truncating the digest when a shorter length
    /// is requested.
    pub fn build(prefix: &Prefix, data: &[u8]) -> TypeResult<Cid> {
        let function = HashFunction::from_code(prefix.mh_type)?;
        let cid = match prefix.version {
            Version::V0 => {
                if function != HashFunction::SHA2_256 {
                    return Err(TypeError::UnsupportedHashFunction(format!(
                        "{function} (version 0 requires sha2-256)"
                    )));
                }
                if function.resolve_length(prefix.mh_len)? != function.natural_length() {
                    return Err(TypeError::InvalidHashLength {
                        requested: prefix.mh_len,
                        max: function.natural_length(),
                    });
                }
                Cid::new_v0(function.digest(data)).map_err(|e| TypeError::Cid(e.to_string()))?
            }
            Version::V1 => {
                let codec = Codec::from_code(prefix.codec)
                    .ok_or_else(|| TypeError::UnsupportedCodec(format!("{:#x}", prefix.codec)))?;
                let length = function.resolve_length(prefix.mh_len)?;
                let digest = function.digest(data).truncate(length);
                Cid::new_v1(codec.code(), digest)
            }
        };
        trace!(%prefix, %cid, "built cid");
        Ok(cid)
    }

    /// Check that `cid` is the identifier of `data` under its own prefix.
    pub fn verify(cid: &Cid, data: &[u8]) -> TypeResult<bool> {
        Ok(Self::build(&Prefix::of(cid), data)? == *cid)
    }
}
