//! Sequencing combinators, in canonical and ambiguous flavors.

use std::rc::Rc;

use stream_core::{NodeName, Outcome, ParseError, ParseResult};

use crate::ambiguous::AmbiguousValue;
use crate::context::Context;
use crate::traits::{instance_addr, NodeNames, Parser};

/// Runs its children in order, treating each as yielding a single canonical
/// result: the first value of each child stream advances the offset, the
/// first error propagates and stops. Emits one ordered collection of the
/// child values at the final offset.
pub struct Sequence<V: Clone + 'static> {
    children: Vec<Rc<dyn Parser<Value = V>>>,
}

impl<V: Clone + 'static> Sequence<V> {
    pub fn new(children: Vec<Rc<dyn Parser<Value = V>>>) -> Self {
        Self { children }
    }
}

impl<V: Clone + 'static> Parser for Sequence<V> {
    type Value = Vec<V>;

    fn parse(&self, ctx: &mut Context<Vec<V>>) {
        let mut items = Vec::with_capacity(self.children.len());
        let mut offset = ctx.offset();

        for child in &self.children {
            let stream = ctx.run_child(&**child, offset);
            let fallback = ParseResult::error(offset, ParseError::EmptyLanguage);
            match ctx.subscribe_to(&stream, fallback).next() {
                Some(result) => match result.outcome {
                    Outcome::Value(value) => {
                        offset = result.offset;
                        items.push(value);
                    }
                    Outcome::Error(error) => {
                        ctx.emit_error(result.offset, error);
                        ctx.close();
                        return;
                    }
                },
                // A child that produced nothing matches nothing.
                None => {
                    ctx.emit_error(offset, ParseError::EmptyLanguage);
                    ctx.close();
                    return;
                }
            }
        }

        ctx.emit_value(offset, items);
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let parts: Vec<u64> = self
                .children
                .iter()
                .map(|child| child.node_name(names).0)
                .collect();
            NodeNames::hash_shape("sequence", &parts)
        })
    }
}

/// Enumerates every combination of child parse paths.
///
/// The children form a head/rest chain built right-to-left at construction,
/// so every residual sequence is a stable node with its own memo identity.
/// For each head interpretation the rest-chain runs at the head's offset and
/// its stream becomes the `next` of the emitted level; walking the resulting
/// tree enumerates all interpretations of the sequence.
pub struct SequenceAmbiguous<V: Clone + 'static> {
    head: Rc<dyn Parser<Value = V>>,
    rest: Option<Rc<SequenceAmbiguous<V>>>,
}

impl<V: Clone + 'static> SequenceAmbiguous<V> {
    /// Builds the chain for `children`. Panics on an empty child list: a
    /// sequence over nothing has no meaningful interpretation tree.
    pub fn new(mut children: Vec<Rc<dyn Parser<Value = V>>>) -> Rc<Self> {
        assert!(
            !children.is_empty(),
            "SequenceAmbiguous requires at least one child"
        );
        let mut chain: Option<Rc<SequenceAmbiguous<V>>> = None;
        while let Some(head) = children.pop() {
            chain = Some(Rc::new(Self { head, rest: chain }));
        }
        match chain {
            Some(root) => root,
            None => unreachable!("child list checked non-empty"),
        }
    }
}

impl<V: Clone + 'static> Parser for SequenceAmbiguous<V> {
    type Value = AmbiguousValue<V>;

    fn parse(&self, ctx: &mut Context<AmbiguousValue<V>>) {
        let head_stream = ctx.run_child(&*self.head, ctx.offset());
        for result in ctx.subscribe_to(&head_stream, ctx.cyclic_fallback()) {
            match result.outcome {
                Outcome::Error(error) => ctx.emit_error(result.offset, error),
                Outcome::Value(value) => {
                    let node = ParseResult::value(result.offset, value);
                    match &self.rest {
                        Some(rest) => {
                            let next = ctx.run_child(&**rest, result.offset);
                            ctx.emit_value(result.offset, AmbiguousValue::chained(node, next));
                        }
                        None => ctx.emit_value(result.offset, AmbiguousValue::leaf(node)),
                    }
                }
            }
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let head = self.head.node_name(names).0;
            let rest = match &self.rest {
                Some(rest) => rest.node_name(names).0,
                None => 0,
            };
            NodeNames::hash_shape("sequence_ambiguous", &[head, rest])
        })
    }
}
