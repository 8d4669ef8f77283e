//! Same-position left recursion.
//!
//! A grammar that names itself is built in two steps: a [`ForwardRef`] is
//! created first and wired into the graph wherever the rule references
//! itself, then defined to point at the finished rule, conventionally a
//! [`Reentrant`] wrapping the rule body. At parse time the reentrant driver
//! retries the body with increasing depth: at depth 0 the self-reference
//! short-circuits as the empty language (cycle detection), letting
//! non-recursive alternatives match the base case; at each deeper round the
//! self-reference reads the results cached by the previous round, growing
//! the parse one level at a time. The retry is local to this activation, so
//! unrelated failures elsewhere in the parse are never conflated with it.

use std::rc::Rc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use stream_core::{NodeName, ParseResult, ResultStream};

use crate::context::Context;
use crate::traits::{instance_addr, NodeNames, Parser};

/// Write-once indirection slot for self-referential grammars.
///
/// Parsing delegates to the target through a memoized child activation,
/// which is the derivation where cycle detection fires for a left-recursive
/// reference. Using a `ForwardRef` before [`define`](Self::define) is a
/// fatal programming error.
pub struct ForwardRef<V: Clone + 'static> {
    cell: OnceCell<Rc<dyn Parser<Value = V>>>,
}

impl<V: Clone + 'static> ForwardRef<V> {
    /// Creates an undefined reference. The handle is shared: clone it into
    /// the graph, then [`define`](Self::define) it once the target exists.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            cell: OnceCell::new(),
        })
    }

    /// Fills the slot. Panics if called twice.
    pub fn define(&self, target: Rc<dyn Parser<Value = V>>) {
        if self.cell.set(target).is_err() {
            panic!("forward reference defined twice");
        }
    }

    fn target(&self) -> &Rc<dyn Parser<Value = V>> {
        match self.cell.get() {
            Some(target) => target,
            None => panic!("forward reference used before definition"),
        }
    }
}

impl<V: Clone + 'static> Parser for ForwardRef<V> {
    type Value = V;

    fn parse(&self, ctx: &mut Context<V>) {
        let stream = ctx.run_child(&**self.target(), ctx.offset());
        let fallback = ctx.cyclic_fallback();
        for result in ctx.subscribe_to(&stream, fallback) {
            ctx.emit(result);
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            // Inside a cycle the target resolves to the placeholder, which
            // is exactly what makes the shape hash terminate.
            let target = self.target().node_name(names).0;
            NodeNames::hash_shape("forward_ref", &[target])
        })
    }
}

/// The iteratively deepening retry driver for same-position left recursion.
pub struct Reentrant<V: Clone + 'static> {
    inner: Rc<dyn Parser<Value = V>>,
}

impl<V: Clone + 'static> Reentrant<V> {
    pub fn new(inner: Rc<dyn Parser<Value = V>>) -> Self {
        Self { inner }
    }
}

impl<V: Clone + 'static> Parser for Reentrant<V> {
    type Value = V;

    fn parse(&self, ctx: &mut Context<V>) {
        let key = ctx.key();

        // A re-entry while a retry is already running at this key is one
        // rung of the depth ladder: run the body directly into the rung's
        // stream and let the memoized lookups below descend further.
        if ctx.memo_handle().borrow().is_retrying(key) {
            self.inner.parse(ctx);
            return;
        }

        let mut best: Option<(usize, Rc<ResultStream<ParseResult<V>>>)> = None;
        let mut depth = 0usize;
        let final_round = loop {
            let mut round_ctx = ctx.retry_child(depth);
            self.inner.parse(&mut round_ctx);
            let round = Rc::clone(round_ctx.results());

            let round_best = round
                .snapshot()
                .iter()
                .filter(|result| result.is_value())
                .map(|result| result.offset)
                .max();

            match round_best {
                // Keep deepening while each round's best match reaches
                // strictly further than the last; the best offset is bounded
                // by the input length, so the loop terminates.
                Some(offset) if best.as_ref().map_or(true, |(b, _)| offset > *b) => {
                    debug!(depth, offset, "retry round advanced");
                    best = Some((offset, round));
                    depth += 1;
                }
                _ => {
                    debug!(depth, "retry round did not advance; stopping");
                    break round;
                }
            }
        };
        ctx.memo_handle().borrow_mut().finish_retry(key);

        // Forward the last advancing round, or the final round's errors when
        // no round ever produced a value. The driver owns these streams, so
        // it reads them directly rather than through a subscription.
        let chosen = match &best {
            Some((_, stream)) => stream,
            None => &final_round,
        };
        for result in chosen.snapshot() {
            ctx.emit(result);
        }
        ctx.close();

        // Later activations of this key must see what the retry settled on,
        // not the base-case rung the loop left at depth 0.
        ctx.memo_handle()
            .borrow_mut()
            .settle_retry(key, depth, Rc::clone(ctx.results()));
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let inner = self.inner.node_name(names).0;
            NodeNames::hash_shape("reentrant", &[inner])
        })
    }
}
