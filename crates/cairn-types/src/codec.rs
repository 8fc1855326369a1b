use std::fmt;
use std::str::FromStr;

use cid::Version;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Multicodec of the content an identifier addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    /// Raw bytes (0x55).
    Raw,
    /// MerkleDAG protobuf (0x70). The only codec a version 0 identifier may carry.
    DagProtobuf,
    /// MerkleDAG CBOR (0x71).
    DagCbor,
}

impl Codec {
    pub const RAW: u64 = 0x55;
    pub const DAG_PROTOBUF: u64 = 0x70;
    pub const DAG_CBOR: u64 = 0x71;

    /// Multicodec table code.
    pub const fn code(&self) -> u64 {
        match self {
            Self::Raw => Self::RAW,
            Self::DagProtobuf => Self::DAG_PROTOBUF,
            Self::DagCbor => Self::DAG_CBOR,
        }
    }

    /// Look up a supported codec by its multicodec code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            Self::RAW => Some(Self::Raw),
            Self::DAG_PROTOBUF => Some(Self::DagProtobuf),
            Self::DAG_CBOR => Some(Self::DagCbor),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::DagProtobuf => "dag-pb",
            Self::DagCbor => "dag-cbor",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-facing CID format selector accepted by `block put`.
///
/// `V0` is the legacy base58 form: it pins the version to 0 and the codec to
/// dag-pb. The other names select a version 1 identifier with the given codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CidFormat {
    #[default]
    V0,
    Raw,
    Cbor,
    Protobuf,
}

impl CidFormat {
    /// The version and codec this format selects.
    pub fn version_and_codec(&self) -> (Version, Codec) {
        match self {
            Self::V0 => (Version::V0, Codec::DagProtobuf),
            Self::Raw => (Version::V1, Codec::Raw),
            Self::Cbor => (Version::V1, Codec::DagCbor),
            Self::Protobuf => (Version::V1, Codec::DagProtobuf),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0 => "v0",
            Self::Raw => "raw",
            Self::Cbor => "cbor",
            Self::Protobuf => "protobuf",
        }
    }
}

impl FromStr for CidFormat {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v0" => Ok(Self::V0),
            "raw" => Ok(Self::Raw),
            "cbor" => Ok(Self::Cbor),
            "protobuf" => Ok(Self::Protobuf),
            other => Err(TypeError::UnsupportedCodec(other.to_string())),
        }
    }
}

impl fmt::Display for CidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_code_roundtrip() {
        for codec in [Codec::Raw, Codec::DagProtobuf, Codec::DagCbor] {
            assert_eq!(Codec::from_code(codec.code()), Some(codec));
        }
        assert_eq!(Codec::from_code(0x0129), None);
    }

    #[test]
    fn format_parse() {
        assert_eq!("v0".parse::<CidFormat>().unwrap(), CidFormat::V0);
        assert_eq!("raw".parse::<CidFormat>().unwrap(), CidFormat::Raw);
        assert_eq!("cbor".parse::<CidFormat>().unwrap(), CidFormat::Cbor);
        assert_eq!("protobuf".parse::<CidFormat>().unwrap(), CidFormat::Protobuf);
    }

    #[test]
    fn unknown_format_is_unsupported_codec() {
        let err = "dag-json".parse::<CidFormat>().unwrap_err();
        assert_eq!(err, TypeError::UnsupportedCodec("dag-json".into()));
        assert_eq!(err.to_string(), "unrecognized format: dag-json");
    }

    #[test]
    fn v0_selects_dag_protobuf() {
        assert_eq!(
            CidFormat::V0.version_and_codec(),
            (Version::V0, Codec::DagProtobuf)
        );
        assert_eq!(CidFormat::Raw.version_and_codec(), (Version::V1, Codec::Raw));
    }

    #[test]
    fn default_format_is_v0() {
        assert_eq!(CidFormat::default(), CidFormat::V0);
        assert_eq!(format!("{}", CidFormat::default()), "v0");
    }
}
