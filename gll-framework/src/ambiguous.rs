//! The recursive interpretation tree of ambiguous combinators.
//!
//! Ambiguous sequences and repetitions do not emit flat tuples: every level
//! emits its own result together with a stream of interpretations of the
//! remainder. Enumerating the tree enumerates every parse of an ambiguous
//! grammar; [`flatten`] walks one interpretation path into a flat sequence.

use std::rc::Rc;

use stream_core::{Outcome, ParseError, ParseResult, ParserPath, ResultStream};

/// One level of an ambiguous interpretation tree: the result matched at this
/// level and, when more input elements follow, the stream of
/// interpretations of the remainder starting at this result's offset.
#[derive(Clone)]
pub struct AmbiguousValue<V: Clone + 'static> {
    pub node: ParseResult<V>,
    pub next: Option<Rc<ResultStream<ParseResult<AmbiguousValue<V>>>>>,
}

impl<V: Clone + 'static> AmbiguousValue<V> {
    /// A leaf level with nothing after it.
    pub fn leaf(node: ParseResult<V>) -> Self {
        Self { node, next: None }
    }

    /// A level followed by the interpretations in `next`.
    pub fn chained(
        node: ParseResult<V>,
        next: Rc<ResultStream<ParseResult<AmbiguousValue<V>>>>,
    ) -> Self {
        Self {
            node,
            next: Some(next),
        }
    }
}

/// Linearizes one interpretation path of an ambiguity tree.
///
/// At each level the first available result is taken: a value yields its
/// `node` and the walk follows `next`; an error yields that error and ends
/// the walk. Subscriptions along the path are cycle-safe, falling back to an
/// empty-language error should a level's stream be owned by one of the
/// caller's ancestors.
pub fn flatten<V: Clone + 'static>(
    stream: Rc<ResultStream<ParseResult<AmbiguousValue<V>>>>,
    ancestry: &ParserPath,
) -> Flatten<V> {
    Flatten {
        current: Some(stream),
        ancestry: ancestry.clone(),
    }
}

/// Iterator over one interpretation path; see [`flatten`].
pub struct Flatten<V: Clone + 'static> {
    current: Option<Rc<ResultStream<ParseResult<AmbiguousValue<V>>>>>,
    ancestry: ParserPath,
}

impl<V: Clone + 'static> Iterator for Flatten<V> {
    type Item = ParseResult<V>;

    fn next(&mut self) -> Option<ParseResult<V>> {
        let stream = self.current.take()?;
        let fallback = ParseResult::error(stream.owner().offset, ParseError::EmptyLanguage);
        let first = stream.subscribe(&self.ancestry, fallback).next()?;
        match first.outcome {
            Outcome::Value(level) => {
                self.current = level.next;
                Some(level.node)
            }
            Outcome::Error(error) => Some(ParseResult::error(first.offset, error)),
        }
    }
}
