use std::fmt;
use std::io::{Cursor, Read};

use serde::{Deserialize, Serialize};

/// Byte source of a payload response.
pub type PayloadReader = Box<dyn Read + Send>;

/// What a response carries for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Exactly one payload record.
    Payload,
    /// Any number of item and error records.
    Items,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload => f.write_str("payload"),
            Self::Items => f.write_str("items"),
        }
    }
}

/// Classification of a failure, shared by every layer that reports one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Empty or malformed identifier, unknown format or hash, bad length.
    Input,
    /// The identifier is absent from the store.
    NotFound,
    /// The identifier is protected by a pin.
    Pinned,
    /// Store or payload read/write failure.
    Io,
    /// The request was cancelled before the item was handled.
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::NotFound => "not-found",
            Self::Pinned => "pinned",
            Self::Io => "io",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A failure carried through a stream as a record of its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordError {
    /// What the failure is about, usually an identifier string.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl RecordError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            subject: None,
            kind,
            message: message.into(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{subject}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RecordError {}

/// A byte reader paired with the total length the producer declared for it.
pub struct Payload {
    reader: PayloadReader,
    length: u64,
}

impl Payload {
    pub fn new(reader: PayloadReader, length: u64) -> Self {
        Self { reader, length }
    }

    /// A payload over bytes already in memory.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let length = data.len() as u64;
        Self::new(Box::new(Cursor::new(data)), length)
    }

    /// Declared total length in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn into_reader(self) -> PayloadReader {
        self.reader
    }

    /// Split into reader and declared length.
    pub fn into_parts(self) -> (PayloadReader, u64) {
        (self.reader, self.length)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// One record pulled from a response.
#[derive(Debug)]
pub enum StreamRecord<T> {
    Payload(Payload),
    Item(T),
    Error(RecordError),
}

impl<T> StreamRecord<T> {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Payload(_) => "payload",
            Self::Item(_) => "item",
            Self::Error(_) => "error",
        }
    }
}
