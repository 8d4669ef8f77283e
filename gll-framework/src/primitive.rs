//! Leaf parsers.

use std::sync::Arc;

use stream_core::{NodeName, Outcome, ParseError};

use crate::context::Context;
use crate::traits::{instance_addr, NodeNames, Parser};

/// Matches a fixed byte string at the current offset.
///
/// A match emits one unit value at `offset + len`; a mismatch emits one
/// error at the offset. The empty literal matches everywhere with zero
/// consumption.
pub struct Literal {
    text: Arc<str>,
}

impl Literal {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    /// The bytes this literal matches.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Parser for Literal {
    type Value = ();

    fn parse(&self, ctx: &mut Context<()>) {
        if ctx.rest().starts_with(self.text.as_bytes()) {
            ctx.emit_value(ctx.offset() + self.text.len(), ());
        } else {
            ctx.emit_error(ctx.offset(), ParseError::Expected(Arc::clone(&self.text)));
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |_| {
            let bytes: Vec<u64> = self.text.bytes().map(u64::from).collect();
            NodeNames::hash_shape("literal", &bytes)
        })
    }
}

/// Ignores the input and emits a fixed outcome once, anchored at the current
/// offset. Lifts constants (and constant errors) into the combinator graph.
pub struct Always<V: Clone + 'static> {
    outcome: Outcome<V>,
}

impl<V: Clone + 'static> Always<V> {
    pub fn new(outcome: Outcome<V>) -> Self {
        Self { outcome }
    }

    /// An `Always` that emits the given value.
    pub fn value(value: V) -> Self {
        Self::new(Outcome::Value(value))
    }

    /// An `Always` that emits the given error.
    pub fn error(error: ParseError) -> Self {
        Self::new(Outcome::Error(error))
    }
}

impl<V: Clone + 'static> Parser for Always<V> {
    type Value = V;

    fn parse(&self, ctx: &mut Context<V>) {
        match self.outcome.clone() {
            Outcome::Value(value) => ctx.emit_value(ctx.offset(), value),
            Outcome::Error(error) => ctx.emit_error(ctx.offset(), error),
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        // The carried outcome is opaque to structural hashing; the instance
        // address stands in for it, so clones of one handle share a name
        // while distinct constants never do.
        let addr = instance_addr(self);
        names.resolve(addr, |_| NodeNames::hash_shape("always", &[addr as u64]))
    }
}
