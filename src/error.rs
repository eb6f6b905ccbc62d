//! Error types for retrieval and answer extraction.
//!
//! Service and malformed-record failures abort a retrieval pass. Extraction
//! failures never do: they are stored on the affected [`Submission`].
//!
//! [`Submission`]: crate::models::Submission

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A remote call to the task service failed.
///
/// Calls are issued once; the SDK client is configured without retries.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a service answer: credential resolution,
    /// connect, timeout, or an unreadable response.
    #[error("request to {operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// The service answered with an error.
    #[error("{operation} returned {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        /// Error code, when the service sent one (e.g. `RequestError`).
        code: Option<String>,
        message: String,
    },

    /// The response lacked a field the operation requires.
    #[error("failed to decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

/// A raw record lacks a required field or carries an unparseable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{record} {id} is missing or has an invalid `{field}` field")]
pub struct MalformedRecord {
    /// Kind of record ("HIT" or "assignment").
    pub record: &'static str,
    /// Identifier of the record, or `<unknown>` when the id itself is missing.
    pub id: String,
    /// Wire name of the offending field.
    pub field: &'static str,
}

impl MalformedRecord {
    pub fn new(record: &'static str, id: Option<&str>, field: &'static str) -> Self {
        Self {
            record,
            id: id.unwrap_or("<unknown>").to_string(),
            field,
        }
    }
}

/// Why an answer envelope could not be turned into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("assignment has no answer envelope")]
    MissingEnvelope,

    #[error("answer envelope is not well-formed XML: {0}")]
    Envelope(String),

    #[error("answer envelope contains no FreeText field")]
    NoFreeText,

    #[error("answer envelope contains {0} FreeText fields, expected exactly one")]
    MultipleFreeText(usize),

    #[error("FreeText content is not a JSON object: {0}")]
    Payload(String),
}

impl Serialize for DecodeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A decode failure tied to the submission it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("failed to extract answer for assignment {submission_id}: {cause}")]
pub struct ExtractionError {
    pub submission_id: String,
    pub cause: DecodeError,
}

/// Failures that abort a retrieval pass.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Malformed(#[from] MalformedRecord),
}
