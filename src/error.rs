//! # Error Types
//!
//! Error handling for the codec, the type registry and the dispatcher.
//!
//! Every fallible operation in the crate returns [`Result`], backed by the
//! single [`WireError`] enum.
//!
//! ## Error Categories
//! - **Registration**: duplicate type/property hashes, duplicate handler bindings.
//!   Fatal at startup.
//! - **Encoding**: property count or size limits exceeded, unsupported array elements.
//!   Reject the message.
//! - **Decoding**: truncated streams, bad tags, kind mismatches, size limits.
//!   Reject the message, never the process.
//! - **Dispatch**: no handler bound for the decoded kind.
//! - **Construction**: the handler construction collaborator is missing.
//!   Caught by the readiness check.
//!
//! Unknown type or property hashes met while decoding are *not* errors; the
//! decoder skips them.
//!
//! ## Example Usage
//! ```rust
//! use tagwire::error::{ErrorCategory, WireError};
//!
//! let err = WireError::UnexpectedEndOfStream { needed: 4, remaining: 1 };
//! assert_eq!(err.category(), ErrorCategory::Decoding);
//! assert!(!err.is_fatal());
//! ```

use crate::core::value::Tag;
use std::io;
use thiserror::Error;

/// Broad classification of a [`WireError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Registration,
    Encoding,
    Decoding,
    Dispatch,
    Construction,
    Config,
    Io,
}

// WireError is the primary error type for all codec, registry and dispatch operations
#[derive(Error, Debug)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Type hash collision 0x{hash:08x}: '{existing}' and '{incoming}'")]
    DuplicateTypeHash {
        hash: u32,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("Property hash collision 0x{hash:04x} on '{type_name}': '{existing}' and '{incoming}'")]
    DuplicatePropertyHash {
        type_name: &'static str,
        hash: u16,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("'{kind}' is already bound to handler '{handler}'")]
    DuplicateBinding {
        kind: &'static str,
        handler: &'static str,
    },

    #[error("Encoding limit exceeded: {0}")]
    EncodingLimitExceeded(String),

    #[error("Unsupported array element kind: {0:?}")]
    UnsupportedArrayElement(Tag),

    #[error("Unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEndOfStream { needed: usize, remaining: usize },

    #[error("Invalid tag byte: {0}")]
    InvalidTag(u8),

    #[error("Invalid bool byte: {0}")]
    InvalidBool(u8),

    #[error("Invalid char scalar value: 0x{0:x}")]
    InvalidChar(u32),

    #[error("Invalid UTF-8 in string payload")]
    InvalidUtf8,

    #[error("{what} of {size} exceeds the configured maximum of {max}")]
    SizeLimitExceeded {
        what: &'static str,
        size: usize,
        max: usize,
    },

    #[error("Nesting depth exceeds the configured maximum of {0}")]
    DepthLimitExceeded(usize),

    #[error("{0} trailing bytes after top-level value")]
    TrailingBytes(usize),

    #[error("Property '{type_name}.{property}' expects {expected:?}, found {found:?}")]
    PropertyKindMismatch {
        type_name: &'static str,
        property: &'static str,
        expected: Tag,
        found: Tag,
    },

    #[error("No handler bound for message kind '{0}'")]
    UnroutableMessage(String),

    #[error("No construction service configured for handlers")]
    ConstructionUnavailable,

    #[error("Service '{0}' is not registered")]
    ServiceMissing(&'static str),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WireError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WireError::Io(_) => ErrorCategory::Io,
            WireError::DuplicateTypeHash { .. }
            | WireError::DuplicatePropertyHash { .. }
            | WireError::DuplicateBinding { .. } => ErrorCategory::Registration,
            WireError::EncodingLimitExceeded(_) | WireError::UnsupportedArrayElement(_) => {
                ErrorCategory::Encoding
            }
            WireError::UnexpectedEndOfStream { .. }
            | WireError::InvalidTag(_)
            | WireError::InvalidBool(_)
            | WireError::InvalidChar(_)
            | WireError::InvalidUtf8
            | WireError::SizeLimitExceeded { .. }
            | WireError::DepthLimitExceeded(_)
            | WireError::TrailingBytes(_)
            | WireError::PropertyKindMismatch { .. } => ErrorCategory::Decoding,
            WireError::UnroutableMessage(_) | WireError::Handler(_) => ErrorCategory::Dispatch,
            WireError::ConstructionUnavailable | WireError::ServiceMissing(_) => {
                ErrorCategory::Construction
            }
            WireError::ConfigError(_) => ErrorCategory::Config,
        }
    }

    /// Whether the process should refuse to start on this error.
    ///
    /// Per-message failures (encoding, decoding, dispatch) are recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Registration | ErrorCategory::Construction | ErrorCategory::Config
        )
    }
}

/// Type alias for Results using WireError
pub type Result<T> = std::result::Result<T, WireError>;
