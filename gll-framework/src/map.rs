//! Result transformation.

use std::rc::Rc;

use stream_core::{NodeName, ParseResult};

use crate::context::Context;
use crate::traits::{instance_addr, NodeNames, Parser};

/// The transformation a [`MapTo`] applies to each child result. Returning
/// `None` suppresses the path.
pub type MapFn<V, T> = dyn Fn(ParseResult<V>) -> Option<ParseResult<T>>;

/// Feeds every child result through a mapping function.
///
/// Value paths are replaced by whatever the function returns (or dropped on
/// `None`); error paths are forwarded unchanged, though the function still
/// observes them.
pub struct MapTo<V: Clone + 'static, T: Clone + 'static> {
    child: Rc<dyn Parser<Value = V>>,
    map_fn: Rc<MapFn<V, T>>,
}

impl<V: Clone + 'static, T: Clone + 'static> MapTo<V, T> {
    pub fn new<F>(child: Rc<dyn Parser<Value = V>>, map_fn: F) -> Self
    where
        F: Fn(ParseResult<V>) -> Option<ParseResult<T>> + 'static,
    {
        Self {
            child,
            map_fn: Rc::new(map_fn),
        }
    }
}

impl<V: Clone + 'static, T: Clone + 'static> Parser for MapTo<V, T> {
    type Value = T;

    fn parse(&self, ctx: &mut Context<T>) {
        let stream = ctx.run_child(&*self.child, ctx.offset());
        let fallback = ctx.cyclic_fallback();
        for result in ctx.subscribe_to(&stream, fallback) {
            if result.is_error() {
                let _ = (self.map_fn)(result.clone());
                ctx.emit(result.cast_error());
            } else if let Some(mapped) = (self.map_fn)(result) {
                ctx.emit(mapped);
            }
        }
        ctx.close();
    }

    fn node_name(&self, names: &mut NodeNames) -> NodeName {
        names.resolve(instance_addr(self), |names| {
            let child = self.child.node_name(names).0;
            // Structural hashing cannot see into the function; its address
            // stands in, so clones of one handle share memo entries while
            // distinct functions never do.
            let map_addr = Rc::as_ptr(&self.map_fn) as *const u8 as usize;
            NodeNames::hash_shape("map_to", &[child, map_addr as u64])
        })
    }
}
