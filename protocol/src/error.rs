//! Crate-level error type.
//!
//! Each module has its own error enum; [`Error`] is what the public
//! operations in [`crate::api`] and [`crate::identity`] return. Key
//! material never appears in any message.

use thiserror::Error;

use crate::actions::DecodeError;
use crate::crypto::KeyError;
use crate::identity::{AddressError, SignerError};
use crate::transaction::{ActionBuildFailure, EncodingError, SignError};

/// Errors surfaced by the top-level operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A raw extended key was not 64 bytes.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length in bytes.
        expected: usize,
        /// Length we were given.
        actual: usize,
    },

    /// A key was not valid hex, or an xpub was not a curve point.
    #[error("invalid key encoding")]
    InvalidKeyEncoding,

    /// An action object had no string `type` field.
    #[error("no action type provided on action {index}")]
    MissingActionType { index: usize },

    /// An action `type` that isn't registered.
    #[error("unknown action type {action_type} on action {index}")]
    UnknownActionType { index: usize, action_type: String },

    /// An action payload that didn't parse into its type's shape.
    #[error("bad action: {reason} on action {index}")]
    MalformedAction { index: usize, reason: String },

    /// One or more actions failed to build.
    #[error("action build failed: {0}")]
    ActionBuildFailure(ActionBuildFailure),

    /// A TTL too large to turn into a deadline.
    #[error("ttl out of range: {0:?}")]
    TtlOutOfRange(std::time::Duration),

    /// Request or response JSON could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("address error: {0}")]
    Address(#[from] AddressError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("transaction encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("signing error: {0}")]
    Sign(#[from] SignError),
}

impl From<KeyError> for Error {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::InvalidLength { expected, actual } => {
                Error::InvalidKeyLength { expected, actual }
            }
            KeyError::InvalidHex | KeyError::InvalidPublicKey => Error::InvalidKeyEncoding,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::MissingType { index } => Error::MissingActionType { index },
            DecodeError::UnknownType { index, action_type } => {
                Error::UnknownActionType { index, action_type }
            }
            DecodeError::Malformed { index, reason } => Error::MalformedAction { index, reason },
        }
    }
}

impl From<ActionBuildFailure> for Error {
    fn from(e: ActionBuildFailure) -> Self {
        Error::ActionBuildFailure(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Shorthand used throughout the public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_map_to_top_level_variants() {
        let e: Error = KeyError::InvalidLength {
            expected: 64,
            actual: 3,
        }
        .into();
        assert!(matches!(
            e,
            Error::InvalidKeyLength {
                expected: 64,
                actual: 3
            }
        ));
        assert!(matches!(
            Error::from(KeyError::InvalidPublicKey),
            Error::InvalidKeyEncoding
        ));
    }

    #[test]
    fn decode_errors_keep_the_action_index() {
        let e: Error = DecodeError::UnknownType {
            index: 4,
            action_type: "issue".into(),
        }
        .into();
        assert_eq!(e.to_string(), "unknown action type issue on action 4");

        let e: Error = DecodeError::MissingType { index: 2 }.into();
        assert!(matches!(e, Error::MissingActionType { index: 2 }));
    }

    #[test]
    fn json_errors_become_serialization() {
        let e: Error = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(matches!(e, Error::Serialization(_)));
    }
}
