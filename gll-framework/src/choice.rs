//! Alternation and optionality.

use std::rc::Rc;

use stream_core::{NodeName, Outcome, ParseError, ParseResult};

use crate::context::Context;
use crate::traits::{instance_addr, NodeNames, Parser};

/// Ordered alternation: runs every child at the same offset and emits the
/// value results in child order. Error paths are discarded as soon as any
/// child produced a value; when none did, a single error marks the offset.
pub struct OneOf<V: Clone + 'static> {
    children: Vec<Rc<dyn Parser<Value = V>>>,
}

impl<V: Clone + 'static> OneOf<V> {
    pub fn new(children: Vec<Rc<dyn Parser<Value = V>>>) -> Self {
        Self { children }
    }
}

impl<V: Clone + 'static> Parser for OneOf<V> {
    type Value = V;

    fn parse(&self, ctx: &mut Context<V>) {
        let mut scratch = Vec::new();
        for child in &self.children {
            let stream = ctx.run_child(&**child, ctx.offset());
            scratch.extend(ctx.subscribe_to(&stream, ctx.cyclic_fallback()));
        }

        if scratch.iter().any(ParseResult::is_value) {
            for result in scratch {
                if result.is_value() {
                    ctx.emit(result);
                }
            }
        } else {
            ctx.emit_error(ctx.offset(), ParseError::ExpectedOneOf);
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let parts: Vec<u64> = self
                .children
                .iter()
                .map(|child| child.node_name(names).0)
                .collect();
            NodeNames::hash_shape("one_of", &parts)
        })
    }
}

/// Wraps a child so that failure becomes success: child values become
/// `Some(v)` at the child's offset, child errors become `None` at the
/// original offset. An `Optional` therefore never emits an error, which is
/// also what lets a left-recursive alternative bottom out, since the cyclic
/// fallback error turns into `None` here.
pub struct Optional<V: Clone + 'static> {
    child: Rc<dyn Parser<Value = V>>,
}

impl<V: Clone + 'static> Optional<V> {
    pub fn new(child: Rc<dyn Parser<Value = V>>) -> Self {
        Self { child }
    }
}

impl<V: Clone + 'static> Parser for Optional<V> {
    type Value = Option<V>;

    fn parse(&self, ctx: &mut Context<Option<V>>) {
        let stream = ctx.run_child(&*self.child, ctx.offset());
        let fallback = ParseResult::error(ctx.offset(), ParseError::EmptyLanguage);
        for result in ctx.subscribe_to(&stream, fallback) {
            match result.outcome {
                Outcome::Value(value) => ctx.emit_value(result.offset, Some(value)),
                Outcome::Error(_) => ctx.emit_value(ctx.offset(), None),
            }
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let child = self.child.node_name(names).0;
            NodeNames::hash_shape("optional", &[child])
        })
    }
}
