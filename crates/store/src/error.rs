use thiserror::Error;

use finanzas_core::DomainError;

/// Failures talking to the hosted data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (network, timeout, 5xx).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but refused the request (4xx).
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A row could not be decoded into a domain record.
    #[error("failed to decode store payload: {0}")]
    Decode(String),

    /// Domain validation or lookup failure.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Failures of the key/value adapter. Reads never fail; they return `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("key/value storage is not available")]
    Unavailable,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("failed to encode value: {0}")]
    Encode(String),

    #[error("failed to persist key/value data: {0}")]
    Io(String),
}
