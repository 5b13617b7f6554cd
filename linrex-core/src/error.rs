//! Error types for the pattern adapter
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by who is at fault: the caller's arguments, the
//! caller's pattern, a replacement callback, or the adapter itself.

use thiserror::Error;

use crate::groups::GroupRegistryError;

/// Error raised by a replacement callback, propagated unchanged
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the pattern adapter
#[derive(Error, Debug)]
pub enum RegexError {
    /// Construction input has the wrong shape (not text, bytes, a pattern,
    /// or a non-empty sequence of those)
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The engine rejected the translated pattern, or a group name repeats
    #[error("{0}")]
    Syntax(String),

    /// A set member uses an anchor outside a character class
    #[error("[{index}] operators ^ and $ are not safe to use in a set")]
    UnsafeSetMember {
        /// Position of the offending member
        index: usize,
    },

    /// The combined program, the acceptor and the member programs disagree.
    ///
    /// This is never caused by caller input.
    #[error("inconsistency in {operation}: {detail}")]
    Inconsistency {
        /// The operation that detected the fault
        operation: &'static str,
        /// What disagreed
        detail: String,
    },

    /// A replacement callback failed; the replace call was abandoned
    #[error("replacement callback failed: {0}")]
    Callback(#[source] CallbackError),
}

impl RegexError {
    pub(crate) fn inconsistency(operation: &'static str, detail: impl Into<String>) -> Self {
        RegexError::Inconsistency {
            operation,
            detail: detail.into(),
        }
    }

    /// Whether this error reports a broken adapter invariant rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, RegexError::Inconsistency { .. })
    }
}

impl From<GroupRegistryError> for RegexError {
    fn from(err: GroupRegistryError) -> Self {
        RegexError::Syntax(err.to_string())
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, RegexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_member_display() {
        let err = RegexError::UnsafeSetMember { index: 2 };
        assert_eq!(
            err.to_string(),
            "[2] operators ^ and $ are not safe to use in a set"
        );
    }

    #[test]
    fn test_inconsistency_is_internal() {
        let err = RegexError::inconsistency("exec", "acceptor returned no candidates");
        assert!(err.is_internal());
        assert_eq!(
            err.to_string(),
            "inconsistency in exec: acceptor returned no candidates"
        );
        assert!(!RegexError::Syntax("bad".to_string()).is_internal());
    }

    #[test]
    fn test_duplicate_group_becomes_syntax_error() {
        let err: RegexError = GroupRegistryError::DuplicateGroupName("year".to_string()).into();
        assert!(matches!(err, RegexError::Syntax(_)));
        assert_eq!(err.to_string(), "duplicate capture group name 'year'");
    }

    #[test]
    fn test_callback_error_keeps_source() {
        use std::error::Error as _;

        let inner: CallbackError = "boom".into();
        let err = RegexError::Callback(inner);
        assert_eq!(err.to_string(), "replacement callback failed: boom");
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
