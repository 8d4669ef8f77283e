//! The data-plane result type.
//!
//! Parse mismatches are ordinary values, not exceptional control flow: a
//! combinator that fails to match emits an [`Outcome::Error`] result into
//! its stream and keeps going. Containing combinators decide whether an
//! error path is recoverable (alternation, optionality) or propagates.

use std::sync::Arc;
use thiserror::Error;

/// Why a parse path failed to match.
///
/// Carried inside results; the `Display` string is the short human-readable
/// message surfaced to the top-level caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A literal did not match at the observed offset.
    #[error("expected '{0}'")]
    Expected(Arc<str>),

    /// No alternative of a `OneOf` produced a value.
    #[error("expected OneOf")]
    ExpectedOneOf,

    /// A repetition ended before reaching its minimum count.
    #[error("expected more")]
    ExpectedMore,

    /// Fallback injected when a cyclic stream subscription is detected.
    /// Consumed by the reentrant retry driver; at the top level it means the
    /// grammar admits nothing but the empty derivation here.
    #[error("matches only the empty language")]
    EmptyLanguage,

    /// A repetition step succeeded without consuming input and was aborted.
    #[error("repetition matched without consuming input")]
    NoProgress,
}

/// One parse outcome: a value or an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<V> {
    Value(V),
    Error(ParseError),
}

/// A tagged outcome at an input offset.
///
/// For values the offset is the position after the match; for errors it is
/// the position at which the mismatch was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult<V> {
    pub offset: usize,
    pub outcome: Outcome<V>,
}

impl<V> ParseResult<V> {
    /// A successful result ending at `offset`.
    pub fn value(offset: usize, value: V) -> Self {
        Self {
            offset,
            outcome: Outcome::Value(value),
        }
    }

    /// A mismatch observed at `offset`.
    pub fn error(offset: usize, error: ParseError) -> Self {
        Self {
            offset,
            outcome: Outcome::Error(error),
        }
    }

    /// Returns `true` for value outcomes.
    pub fn is_value(&self) -> bool {
        matches!(self.outcome, Outcome::Value(_))
    }

    /// Returns `true` for error outcomes.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    /// Borrows the value, if this is one.
    pub fn as_value(&self) -> Option<&V> {
        match &self.outcome {
            Outcome::Value(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    /// Borrows the error, if this is one.
    pub fn as_error(&self) -> Option<&ParseError> {
        match &self.outcome {
            Outcome::Value(_) => None,
            Outcome::Error(e) => Some(e),
        }
    }

    /// Consumes the result, returning the value if present.
    pub fn into_value(self) -> Option<V> {
        match self.outcome {
            Outcome::Value(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    /// Re-tags an error result with a different value type.
    ///
    /// Errors carry no value, so they move freely between streams of
    /// different element types; value results cannot be re-tagged.
    pub fn cast_error<T>(self) -> ParseResult<T> {
        match self.outcome {
            Outcome::Error(e) => ParseResult::error(self.offset, e),
            Outcome::Value(_) => panic!("cast_error called on a value result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ParseError::Expected(Arc::from("abc")).to_string(),
            "expected 'abc'"
        );
        assert_eq!(ParseError::ExpectedOneOf.to_string(), "expected OneOf");
        assert_eq!(ParseError::ExpectedMore.to_string(), "expected more");
        assert_eq!(
            ParseError::EmptyLanguage.to_string(),
            "matches only the empty language"
        );
    }

    #[test]
    fn test_accessors() {
        let v: ParseResult<u32> = ParseResult::value(3, 7);
        assert!(v.is_value());
        assert_eq!(v.as_value(), Some(&7));
        assert_eq!(v.as_error(), None);

        let e: ParseResult<u32> = ParseResult::error(0, ParseError::ExpectedOneOf);
        assert!(e.is_error());
        assert_eq!(e.clone().into_value(), None);
        let retagged: ParseResult<String> = e.cast_error();
        assert_eq!(retagged.offset, 0);
    }
}
