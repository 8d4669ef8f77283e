//! GLL Framework
//!
//! A generalized LL parser combinator engine. Grammars are graphs of
//! [`Parser`] nodes; running one produces a stream of results enumerating
//! every interpretation the grammar admits, including those of ambiguous
//! and (same-position) left-recursive grammars. Memoization, cycle
//! detection, and the reentrant retry driver live behind the [`Context`]
//! that every activation carries.

pub mod ambiguous;
pub mod choice;
pub mod context;
pub mod map;
pub mod memo;
pub mod primitive;
pub mod reentrant;
pub mod repeat;
pub mod sequence;
pub mod traits;

pub use stream_core::{
    Input, NodeName, Outcome, ParseError, ParseResult, ParserPath, PosDepthKey, PosKey,
    ResultStream, Subscription,
};

pub use ambiguous::{flatten, AmbiguousValue, Flatten};
pub use choice::{OneOf, Optional};
pub use context::Context;
pub use map::{MapFn, MapTo};
pub use memo::{Memoizer, RecursionRetry};
pub use primitive::{Always, Literal};
pub use reentrant::{ForwardRef, Reentrant};
pub use repeat::{Repeated, RepeatedAmbiguous};
pub use sequence::{Sequence, SequenceAmbiguous};
pub use traits::{heap, NodeNames, Parser};
