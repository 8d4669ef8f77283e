use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use stream_core::NodeName;

use crate::context::Context;

/// A parser node.
///
/// `parse` runs the node with the given activation context, emitting zero or
/// more results into the context's stream, and closes that stream before
/// returning, on every exit path. `node_name` reports the node's structural
/// hash through the shared [`NodeNames`] cache.
///
/// Parsers are immutable during parsing and are shared behind `Rc`; the
/// caller keeps every node alive for as long as any context references it.
pub trait Parser {
    type Value: Clone + 'static;

    /// Runs this parser with the given activation context.
    fn parse(&self, ctx: &mut Context<Self::Value>);

    /// Returns this parser's structural name.
    ///
    /// Implementations delegate to [`NodeNames::resolve`] with their own
    /// address, so that a self-referential shape resolves to
    /// [`NodeName::PLACEHOLDER`] at the point of re-entry instead of
    /// recursing forever.
    fn node_name(&self, names: &mut NodeNames) -> NodeName;
}

/// Moves a parser onto the heap, returning the shared handle combinators
/// take as children. Cloning the handle is how a single node is referenced
/// from several places in a grammar.
pub fn heap<P: Parser + 'static>(parser: P) -> Rc<dyn Parser<Value = P::Value>> {
    Rc::new(parser)
}

/// Returns the address identifying a parser instance in the name cache.
pub(crate) fn instance_addr<P: ?Sized>(parser: &P) -> usize {
    parser as *const P as *const u8 as usize
}

enum NameState {
    /// The name is being computed further up the stack; a request from
    /// inside the computation means the shape is self-referential.
    Computing,
    Done(NodeName),
}

/// Cache of structural names, keyed by parser-instance address.
///
/// The cache serves two purposes: it makes name computation linear in the
/// size of the grammar graph, and its `Computing` marker breaks the
/// otherwise-infinite recursion of self-referential shapes.
#[derive(Default)]
pub struct NodeNames {
    cache: HashMap<usize, NameState>,
}

impl NodeNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the name for the instance at `addr`, running `compute` on a
    /// miss. A recursive request for the same address while `compute` runs
    /// observes [`NodeName::PLACEHOLDER`]; the final value overwrites the
    /// marker.
    pub fn resolve<F>(&mut self, addr: usize, compute: F) -> NodeName
    where
        F: FnOnce(&mut Self) -> NodeName,
    {
        match self.cache.entry(addr) {
            Entry::Occupied(entry) => {
                return match entry.get() {
                    NameState::Computing => NodeName::PLACEHOLDER,
                    NameState::Done(name) => *name,
                };
            }
            Entry::Vacant(entry) => {
                entry.insert(NameState::Computing);
            }
        }
        let name = compute(self);
        self.cache.insert(addr, NameState::Done(name));
        name
    }

    /// Hashes a combinator kind tag together with its structural inputs
    /// (child names, bounds) into a name. The result is never the
    /// placeholder value.
    pub fn hash_shape(kind: &str, parts: &[u64]) -> NodeName {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        parts.hash(&mut hasher);
        let value = hasher.finish();
        if value == NodeName::PLACEHOLDER.0 {
            NodeName(!0)
        } else {
            NodeName(value)
        }
    }
}
