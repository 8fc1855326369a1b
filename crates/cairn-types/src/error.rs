use thiserror::Error;

/// Errors produced while parsing or deriving identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("zero length cid invalid")]
    EmptyKey,

    #[error("invalid content id: {key} ({reason})")]
    Decode { key: String, reason: String },

    #[error("unrecognized format: {0}")]
    UnsupportedCodec(String),

    #[error("unrecognized multihash function: {0}")]
    UnsupportedHashFunction(String),

    #[error("invalid multihash length {requested}: must be -1 or between 1 and {max}")]
    InvalidHashLength { requested: i32, max: u8 },

    #[error("cid construction failed: {0}")]
    Cid(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
