//! Stream Core
//!
//! Shared primitives for the GLL engine: the shared input buffer, the
//! data-plane result type, activation identity keys, and the
//! multi-subscriber result streams that carry parse outcomes between
//! combinators.

pub mod input;
pub mod key;
pub mod result;
pub mod stream;

pub use input::Input;
pub use key::{NodeName, ParserPath, PosDepthKey, PosKey};
pub use result::{Outcome, ParseError, ParseResult};
pub use stream::{ResultStream, Subscription};
