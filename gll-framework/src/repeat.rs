//! Repetition combinators.
//!
//! Both flavors share the bounds model: `min` matches are required, `max`
//! is an optional upper bound (`None` = unbounded). A repetition step whose
//! child succeeds without consuming input is rejected (the ambiguous flavor
//! aborts that path with an error, the canonical flavor stops collecting),
//! so a zero-consumption child cannot loop the engine forever.

use std::rc::Rc;

use stream_core::{NodeName, Outcome, ParseError, ParseResult};

use crate::ambiguous::AmbiguousValue;
use crate::context::Context;
use crate::traits::{instance_addr, NodeNames, Parser};

fn encode_max(max: Option<usize>) -> u64 {
    match max {
        Some(m) => m as u64,
        None => u64::MAX,
    }
}

/// Canonical repetition: greedily takes the first value of each step,
/// emitting one ordered collection of the matches.
pub struct Repeated<V: Clone + 'static> {
    child: Rc<dyn Parser<Value = V>>,
    min: usize,
    max: Option<usize>,
}

impl<V: Clone + 'static> Repeated<V> {
    pub fn new(child: Rc<dyn Parser<Value = V>>, min: usize, max: Option<usize>) -> Self {
        Self { child, min, max }
    }
}

impl<V: Clone + 'static> Parser for Repeated<V> {
    type Value = Vec<V>;

    fn parse(&self, ctx: &mut Context<Vec<V>>) {
        if self.max == Some(0) {
            ctx.close();
            return;
        }

        let mut items = Vec::new();
        let mut offset = ctx.offset();
        let mut failure: Option<ParseResult<Vec<V>>> = None;

        loop {
            if let Some(max) = self.max {
                if items.len() >= max {
                    break;
                }
            }
            let stream = ctx.run_child(&*self.child, offset);
            let fallback = ParseResult::error(offset, ParseError::EmptyLanguage);
            match ctx.subscribe_to(&stream, fallback).next() {
                Some(result) => match result.outcome {
                    Outcome::Value(value) => {
                        let advanced = result.offset > offset;
                        offset = result.offset;
                        items.push(value);
                        if !advanced {
                            // Non-advancing step: take the match, stop here.
                            break;
                        }
                    }
                    Outcome::Error(error) => {
                        if items.len() < self.min {
                            failure = Some(ParseResult::error(result.offset, error));
                        }
                        break;
                    }
                },
                None => {
                    if items.len() < self.min {
                        failure = Some(ParseResult::error(offset, ParseError::EmptyLanguage));
                    }
                    break;
                }
            }
        }

        match failure {
            Some(error) => ctx.emit(error),
            None => {
                if items.len() >= self.min {
                    ctx.emit_value(offset, items);
                } else {
                    ctx.emit_error(offset, ParseError::ExpectedMore);
                }
            }
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let child = self.child.node_name(names).0;
            NodeNames::hash_shape("repeated", &[child, self.min as u64, encode_max(self.max)])
        })
    }
}

/// Ambiguous repetition: emits one interpretation level per child value,
/// each level's `next` being the (memoized) residual repetition at the
/// child's offset with the bounds decremented.
pub struct RepeatedAmbiguous<V: Clone + 'static> {
    child: Rc<dyn Parser<Value = V>>,
    min: usize,
    max: Option<usize>,
}

impl<V: Clone + 'static> RepeatedAmbiguous<V> {
    pub fn new(child: Rc<dyn Parser<Value = V>>, min: usize, max: Option<usize>) -> Self {
        Self { child, min, max }
    }

    /// The structural name of the level with the given residual bounds.
    /// Levels of different instances with equal shape share memo entries.
    fn level_name(&self, names: &mut NodeNames, min: usize, max: Option<usize>) -> NodeName {
        let child = self.child.node_name(names).0;
        NodeNames::hash_shape("repeated_ambiguous", &[child, min as u64, encode_max(max)])
    }

    fn parse_level(&self, ctx: &mut Context<AmbiguousValue<V>>, min: usize, max: Option<usize>) {
        if max == Some(0) {
            ctx.close();
            return;
        }

        let child_stream = ctx.run_child(&*self.child, ctx.offset());
        let mut values = 0usize;
        let mut furthest = ctx.offset();

        for result in ctx.subscribe_to(&child_stream, ctx.cyclic_fallback()) {
            furthest = furthest.max(result.offset);
            match result.outcome {
                Outcome::Error(error) => {
                    // Below the minimum the error is part of the answer;
                    // at or above it, failing paths are simply not extended.
                    if values < min {
                        ctx.emit_error(result.offset, error);
                    }
                }
                Outcome::Value(value) => {
                    if result.offset == ctx.offset() {
                        ctx.emit_error(result.offset, ParseError::NoProgress);
                        continue;
                    }
                    values += 1;
                    let rem_min = min.saturating_sub(1);
                    let rem_max = max.map(|m| m - 1);
                    let name = self.level_name(
                        ctx.memo_handle().borrow_mut().names_mut(),
                        rem_min,
                        rem_max,
                    );
                    let mut level = ctx.child::<AmbiguousValue<V>>(name, result.offset, None);
                    if !level.existing_results() {
                        self.parse_level(&mut level, rem_min, rem_max);
                    }
                    let node = ParseResult::value(result.offset, value);
                    ctx.emit_value(
                        result.offset,
                        AmbiguousValue::chained(node, Rc::clone(level.results())),
                    );
                }
            }
        }

        if values < min {
            ctx.emit_error(furthest, ParseError::ExpectedMore);
        }
        ctx.close();
    }
}

impl<V: Clone + 'static> Parser for RepeatedAmbiguous<V> {
    type Value = AmbiguousValue<V>;

    fn parse(&self, ctx: &mut Context<AmbiguousValue<V>>) {
        self.parse_level(ctx, self.min, self.max);
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let child = self.child.node_name(names).0;
            NodeNames::hash_shape(
                "repeated_ambiguous",
                &[child, self.min as u64, encode_max(self.max)],
            )
        })
    }
}
