//! Identity of parser activations.
//!
//! A parser node is identified by a structural hash of its shape
//! ([`NodeName`]); an activation of that node is identified by the node name
//! together with the input it runs over and the offset it runs at
//! ([`PosKey`]); a retry of that activation is further distinguished by its
//! reentrant depth ([`PosDepthKey`]). The chain of ancestor activations
//! ([`ParserPath`]) is what cycle detection inspects.

/// Structural hash identifying a parser node's shape.
///
/// Two parser instances with identical shape (combinator kind plus the names
/// of their structural inputs) share a name, which deduplicates memo
/// entries. Self-referential shapes hash to [`NodeName::PLACEHOLDER`] at the
/// point of re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeName(pub u64);

impl NodeName {
    /// The sentinel produced when a node's name is requested while it is
    /// already being computed, i.e. across a self-reference.
    pub const PLACEHOLDER: NodeName = NodeName(0);

    /// Returns `true` if this is the self-reference sentinel.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER
    }
}

/// Identifies one activation: a parser node at a specific position of a
/// specific input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosKey {
    /// The node's structural name.
    pub name: NodeName,
    /// Base address of the input buffer.
    pub base: usize,
    /// Byte offset into the input.
    pub offset: usize,
}

impl PosKey {
    /// Creates a new activation key.
    pub fn new(name: NodeName, base: usize, offset: usize) -> Self {
        Self { name, base, offset }
    }
}

/// A [`PosKey`] plus the reentrant retry depth it was memoized at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosDepthKey {
    pub key: PosKey,
    pub depth: usize,
}

impl PosDepthKey {
    pub fn new(key: PosKey, depth: usize) -> Self {
        Self { key, depth }
    }
}

/// Ordered stack of ancestor activations, root first.
///
/// Every child context receives a cloned path extended with its own key;
/// subscribing to a stream whose owner appears in the subscriber's path is
/// what defines a cyclic subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserPath {
    keys: Vec<PosKey>,
}

impl ParserPath {
    /// Creates an empty path (the ancestry of an external caller).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this path with `key` pushed on top.
    pub fn pushed(&self, key: PosKey) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key);
        Self { keys }
    }

    /// Returns `true` if `key` appears anywhere in the path.
    pub fn contains(&self, key: &PosKey) -> bool {
        self.keys.contains(key)
    }

    /// Iterates the path from the root outward.
    pub fn iter(&self) -> impl Iterator<Item = &PosKey> {
        self.keys.iter()
    }

    /// Number of activations in the path.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The most recent activation, if any.
    pub fn last(&self) -> Option<&PosKey> {
        self.keys.last()
    }
}
