//! Per-parse memoization and recursion-retry bookkeeping.
//!
//! The memoizer is shared by every activation of one top-level parse. It
//! owns one result stream per `(node, position, reentrant depth)` and the
//! retry counters the reentrant driver installs for same-position left
//! recursion. Execution is single-threaded and strictly depth-first, so no
//! locking is involved; mutations happen between stream reads.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace};

use stream_core::{ParseResult, ParserPath, PosDepthKey, PosKey, ResultStream};

use crate::traits::NodeNames;

/// Retry state for one activation key: the depth child lookups descend from
/// and the depth the current round was started at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionRetry {
    pub current: usize,
    pub max: usize,
}

/// Maps activations to their result streams and manages recursion retries.
pub struct Memoizer {
    entries: HashMap<PosDepthKey, Box<dyn Any>>,
    recursion: HashMap<PosKey, RecursionRetry>,
    /// Marks `(child key, retrying ancestor, round)` triples whose stale
    /// entries were already invalidated, so the inherit path clears each key
    /// at most once per round.
    cleared: HashSet<(PosKey, PosKey, usize)>,
    names: NodeNames,
}

impl Memoizer {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recursion: HashMap::new(),
            cleared: HashSet::new(),
            names: NodeNames::new(),
        }
    }

    /// The structural-name cache for this parse.
    pub fn names_mut(&mut self) -> &mut NodeNames {
        &mut self.names
    }

    /// Fetches or creates the stream for `key`, at the reentrant depth
    /// implied by the retry state and `ancestry`.
    ///
    /// Returns the stream and whether it already existed; an existing stream
    /// must not be produced into again, so the caller subscribes instead of
    /// re-invoking the parser.
    ///
    /// `new_max_depth` is set only by the reentrant driver when starting or
    /// restarting a retry round; it reinstalls the retry state at that depth
    /// and invalidates the rounds below it.
    ///
    /// Panics if the entry exists with a different value type: two parser
    /// shapes hashing to the same name with different value types is a
    /// programming error.
    pub fn stream<V: Clone + 'static>(
        &mut self,
        ancestry: &ParserPath,
        key: PosKey,
        new_max_depth: Option<usize>,
    ) -> (Rc<ResultStream<ParseResult<V>>>, bool) {
        let depth = self.resolve_depth(ancestry, key, new_max_depth);
        let depth_key = PosDepthKey::new(key, depth);

        if let Some(entry) = self.entries.get(&depth_key) {
            let stream = entry
                .downcast_ref::<Rc<ResultStream<ParseResult<V>>>>()
                .unwrap_or_else(|| panic!("memoized stream value type mismatch at {:?}", depth_key));
            trace!(?depth_key, "memo hit");
            return (Rc::clone(stream), true);
        }

        let stream = Rc::new(ResultStream::new(key));
        self.entries
            .insert(depth_key, Box::new(Rc::clone(&stream)));
        (stream, false)
    }

    /// Determines the reentrant depth for a lookup of `key`, updating retry
    /// counters on the way.
    fn resolve_depth(
        &mut self,
        ancestry: &ParserPath,
        key: PosKey,
        new_max_depth: Option<usize>,
    ) -> usize {
        // A retry driver (re)starting a round at this key: pin the counters
        // and invalidate everything the previous round cached.
        if let Some(depth) = new_max_depth {
            let previous = self.recursion.insert(
                key,
                RecursionRetry {
                    current: depth,
                    max: depth,
                },
            );
            debug!(?key, depth, ?previous, "retry round installed");
            self.clear_past(key, depth);
            return depth;
        }

        // A re-entry of a key that is currently retrying: descend one rung,
        // so the self-reference reads the results of the shallower round.
        if let Some(retry) = self.recursion.get_mut(&key) {
            retry.current = retry.current.saturating_sub(1);
            return retry.current;
        }

        // Otherwise inherit from the nearest retrying ancestor, invalidating
        // this key's entries from earlier rounds (once per round).
        let mut inherited: Option<(PosKey, RecursionRetry)> = None;
        for ancestor in ancestry.iter() {
            if let Some(retry) = self.recursion.get(ancestor) {
                inherited = Some((*ancestor, *retry));
            }
        }
        match inherited {
            Some((ancestor, retry)) => {
                if self.cleared.insert((key, ancestor, retry.max)) {
                    self.clear_past(key, retry.max);
                }
                retry.current
            }
            None => 0,
        }
    }

    /// Removes the memo entries for `key` at depths `0..=depth`. Streams
    /// still referenced by an in-flight ancestor stay alive through their
    /// reference counts; removal only guarantees the next lookup starts
    /// fresh.
    fn clear_past(&mut self, key: PosKey, depth: usize) {
        let mut removed = 0usize;
        for d in 0..=depth {
            if self.entries.remove(&PosDepthKey::new(key, d)).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            trace!(?key, depth, removed, "invalidated superseded memo entries");
        }
    }

    /// Reports whether a retry is in progress for `key`. Used by the
    /// reentrant driver to recognize nested retries.
    pub fn is_retrying(&self, key: PosKey) -> bool {
        self.recursion.contains_key(&key)
    }

    /// Removes the retry bookkeeping for `key` once its driver completes, so
    /// later lookups of the same key are not skewed by leftover counters.
    pub fn finish_retry(&mut self, key: PosKey) {
        self.recursion.remove(&key);
    }

    /// Replaces the rung entries left behind by a finished retry with the
    /// driver's final stream, memoized at depth 0. Without this, a later
    /// activation of `key` would find the depth-0 rung (the base-case
    /// round) instead of the results the retry actually settled on.
    pub fn settle_retry<V: Clone + 'static>(
        &mut self,
        key: PosKey,
        depth: usize,
        results: Rc<ResultStream<ParseResult<V>>>,
    ) {
        self.clear_past(key, depth);
        self.entries
            .insert(PosDepthKey::new(key, 0), Box::new(results));
        debug!(?key, depth, "retry settled");
    }
}

impl Default for Memoizer {
    fn default() -> Self {
        Self::new()
    }
}
