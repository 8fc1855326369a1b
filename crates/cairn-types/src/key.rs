use cid::Cid;

use crate::error::{TypeError, TypeResult};

/// Path namespace accepted in front of an identifier (`/ipfs/<cid>`).
const IPFS_NAMESPACE: &str = "/ipfs/";

/// Parse a caller-supplied identifier string.
///
/// An empty string is rejected before any decoding is attempted, so it can
/// never reach a store.
pub fn parse_cid(key: &str) -> TypeResult<Cid> {
    if key.is_empty() {
        return Err(TypeError::EmptyKey);
    }
    Cid::try_from(key).map_err(|e| TypeError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Strip an optional `/ipfs/` namespace and any trailing slash from a path.
pub fn strip_path_namespace(path: &str) -> &str {
    path.strip_prefix(IPFS_NAMESPACE)
        .unwrap_or(path)
        .trim_end_matches('/')
}
