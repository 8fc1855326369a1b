use cairn_store::StoreError;
use cairn_stream::{ErrorKind, RecordError, StreamError};
use cairn_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("cannot resolve {path}: {reason}")]
    Resolve { path: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("some blocks not removed")]
    NotAllRemoved { failures: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Where this error falls in the user-visible taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Type(_) | Self::InvalidRequest(_) | Self::Resolve { .. } => ErrorKind::Input,
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(StoreError::Type(_)) => ErrorKind::Input,
            Self::Store(_) | Self::Io(_) => ErrorKind::Io,
            Self::Stream(StreamError::Cancelled) => ErrorKind::Cancelled,
            Self::Stream(StreamError::Record(record)) => record.kind,
            Self::Stream(StreamError::Io(_)) => ErrorKind::Io,
            Self::Stream(_) | Self::NotAllRemoved { .. } | Self::Config(_) => ErrorKind::Internal,
        }
    }

    pub fn to_record(&self) -> RecordError {
        RecordError::new(self.kind(), self.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_crypto::CidBuilder;
    use cairn_types::Prefix;

    #[test]
    fn taxonomy() {
        let cid = CidBuilder::build(&Prefix::v0(), b"x").unwrap();
        assert_eq!(CoreError::from(TypeError::EmptyKey).kind(), ErrorKind::Input);
        assert_eq!(
            CoreError::from(StoreError::NotFound(cid)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::from(StoreError::Type(TypeError::EmptyKey)).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            CoreError::from(StoreError::WriteFailure {
                cid,
                reason: "disk full".into()
            })
            .kind(),
            ErrorKind::Io
        );
        assert_eq!(
            CoreError::from(StreamError::Cancelled).kind(),
            ErrorKind::Cancelled
        );
    }

    #[test]
    fn messages_pass_through() {
        let err = CoreError::from(StoreError::Type(TypeError::EmptyKey));
        assert_eq!(err.to_string(), "zero length cid invalid");
        let record = err.to_record();
        assert_eq!(record.kind, ErrorKind::Input);
        assert_eq!(record.message, "zero length cid invalid");
    }
}
