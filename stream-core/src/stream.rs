//! Lazy multi-subscriber result streams.
//!
//! A stream is an append-only queue owned by one parser activation. Any
//! number of subscribers traverse it independently, each with its own
//! cursor. The engine evaluates depth-first, so by the time a non-cyclic
//! subscriber reads a stream its producer has closed it. The one situation
//! where a subscriber would otherwise chase an open tail, subscribing to a
//! stream whose owning activation is an ancestor of the subscriber, is
//! detected at subscription time and short-circuited with a caller-supplied
//! fallback result.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::key::{ParserPath, PosKey};

/// Append-only multi-subscriber sequence of results.
pub struct ResultStream<R> {
    owner: PosKey,
    inner: RefCell<Inner<R>>,
}

struct Inner<R> {
    items: Vec<R>,
    closed: bool,
}

impl<R: Clone> ResultStream<R> {
    /// Creates an open, empty stream owned by the given activation.
    pub fn new(owner: PosKey) -> Self {
        Self {
            owner,
            inner: RefCell::new(Inner {
                items: Vec::new(),
                closed: false,
            }),
        }
    }

    /// The activation that owns (produces into) this stream.
    pub fn owner(&self) -> PosKey {
        self.owner
    }

    /// Appends an item.
    ///
    /// Panics if the stream is closed; producing into a closed stream is a
    /// programming error.
    pub fn add(&self, item: R) {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            panic!("add on a closed result stream");
        }
        inner.items.push(item);
    }

    /// Closes the stream. Subscribers that have drained it observe
    /// end-of-stream from here on.
    ///
    /// Panics if the stream is already closed.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            panic!("close on a closed result stream");
        }
        inner.closed = true;
    }

    /// Returns `true` once the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Number of items appended so far.
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    /// Returns `true` if no items have been appended.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Clones the items appended so far.
    ///
    /// Producer-side accessor: the owner of a stream (or of one of its
    /// finished children) may read it directly without the ancestry check
    /// that `subscribe` performs.
    pub fn snapshot(&self) -> Vec<R> {
        self.inner.borrow().items.clone()
    }

    /// Subscribes to the stream.
    ///
    /// `ancestry` is the subscribing activation's path. If the stream is
    /// still open and its owner appears in the ancestry, the subscription is
    /// cyclic: the subscriber sits inside its own producer and would
    /// otherwise chase the tail forever, so the iterator yields
    /// `cyclic_fallback` exactly once and then ends, regardless of the
    /// stream's contents. A closed stream is always safe to read, whatever
    /// the ancestry: that is how a deeper recursion retry consumes the
    /// results cached by the previous round. Otherwise the iterator walks
    /// the items in insertion order; re-subscribing after close replays from
    /// the start.
    pub fn subscribe(
        self: &Rc<Self>,
        ancestry: &ParserPath,
        cyclic_fallback: R,
    ) -> Subscription<R> {
        if !self.is_closed() && ancestry.contains(&self.owner) {
            trace!(owner = ?self.owner, "cyclic subscription detected");
            Subscription {
                stream: Rc::clone(self),
                cursor: 0,
                fallback: Some(cyclic_fallback),
                cyclic: true,
            }
        } else {
            Subscription {
                stream: Rc::clone(self),
                cursor: 0,
                fallback: None,
                cyclic: false,
            }
        }
    }
}

/// One subscriber's view of a [`ResultStream`].
///
/// `next` returns `None` either at end-of-stream or when the subscription
/// has caught up with a still-open stream; in the latter case it may be
/// polled again after the producer appends or closes. Engine combinators
/// only read streams their children have already closed, so they never
/// observe the open-tail case.
pub struct Subscription<R> {
    stream: Rc<ResultStream<R>>,
    cursor: usize,
    fallback: Option<R>,
    cyclic: bool,
}

impl<R: Clone> Subscription<R> {
    /// Returns `true` if this subscription was detected as cyclic.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Returns `true` once no further items can ever arrive.
    pub fn is_done(&self) -> bool {
        if self.cyclic {
            self.fallback.is_none()
        } else {
            self.stream.is_closed() && self.cursor >= self.stream.len()
        }
    }
}

impl<R: Clone> Iterator for Subscription<R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        if self.cyclic {
            return self.fallback.take();
        }
        let inner = self.stream.inner.borrow();
        if self.cursor < inner.items.len() {
            let item = inner.items[self.cursor].clone();
            self.cursor += 1;
            Some(item)
        } else {
            None
        }
    }
}
