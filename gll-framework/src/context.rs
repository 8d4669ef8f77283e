//! Per-activation parse state.
//!
//! A [`Context`] carries everything one parser activation needs: the shared
//! input, the offset it runs at, the stream it produces into, a handle to
//! the parse-wide memoizer, its own activation key, and the path of ancestor
//! activations used for cycle detection. Child contexts are derived through
//! the memoizer, which is where memoization and retry-depth inheritance
//! happen.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use stream_core::{
    Input, NodeName, Outcome, ParseError, ParseResult, ParserPath, PosKey, ResultStream,
    Subscription,
};

use crate::memo::Memoizer;
use crate::traits::Parser;

/// Activation state for one run of one parser node.
pub struct Context<V: Clone + 'static> {
    input: Input,
    offset: usize,
    results: Rc<ResultStream<ParseResult<V>>>,
    existing_results: bool,
    memo: Rc<RefCell<Memoizer>>,
    key: PosKey,
    path: ParserPath,
    payload: Option<Rc<dyn Any>>,
}

impl<V: Clone + 'static> Context<V> {
    /// Creates the top-level context for one parse of `input` by `parser`.
    ///
    /// The parser is needed up front because the root activation key embeds
    /// its structural name. The same parser (or a clone of its handle) is
    /// then run with `parser.parse(&mut ctx)`.
    pub fn new<P>(input: Input, parser: &P) -> Self
    where
        P: Parser<Value = V> + ?Sized,
    {
        Self::with_payload_opt(input, parser, None)
    }

    /// Like [`Context::new`], with a user payload child contexts inherit.
    pub fn with_payload<P>(input: Input, parser: &P, payload: Rc<dyn Any>) -> Self
    where
        P: Parser<Value = V> + ?Sized,
    {
        Self::with_payload_opt(input, parser, Some(payload))
    }

    fn with_payload_opt<P>(input: Input, parser: &P, payload: Option<Rc<dyn Any>>) -> Self
    where
        P: Parser<Value = V> + ?Sized,
    {
        let memo = Rc::new(RefCell::new(Memoizer::new()));
        let name = parser.node_name(memo.borrow_mut().names_mut());
        let key = PosKey::new(name, input.base(), 0);
        let (results, existing_results) =
            memo.borrow_mut().stream::<V>(&ParserPath::new(), key, None);
        Self {
            input,
            offset: 0,
            results,
            existing_results,
            memo,
            key,
            path: ParserPath::new().pushed(key),
            payload,
        }
    }

    /// The shared input buffer.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// The offset this activation runs at.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The unconsumed input from this activation's offset.
    pub fn rest(&self) -> &[u8] {
        self.input.rest(self.offset)
    }

    /// This activation's key.
    pub fn key(&self) -> PosKey {
        self.key
    }

    /// The activation path, root first, ending with this activation.
    pub fn path(&self) -> &ParserPath {
        &self.path
    }

    /// The stream this activation produces into.
    pub fn results(&self) -> &Rc<ResultStream<ParseResult<V>>> {
        &self.results
    }

    /// Whether the memoizer already held results for this activation. When
    /// set, the parser must not be re-invoked; callers subscribe instead.
    pub fn existing_results(&self) -> bool {
        self.existing_results
    }

    /// The user payload, downcast to the caller's type.
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.as_ref().and_then(|p| p.downcast_ref())
    }

    /// Emits a result into this activation's stream.
    pub fn emit(&self, result: ParseResult<V>) {
        self.results.add(result);
    }

    /// Emits a value ending at `offset`.
    pub fn emit_value(&self, offset: usize, value: V) {
        self.emit(ParseResult::value(offset, value));
    }

    /// Emits an error observed at `offset`.
    pub fn emit_error(&self, offset: usize, error: ParseError) {
        self.emit(ParseResult::error(offset, error));
    }

    /// Closes this activation's stream.
    pub fn close(&self) {
        self.results.close();
    }

    /// Computes a parser's structural name through the shared cache.
    pub fn name_of<P>(&self, parser: &P) -> NodeName
    where
        P: Parser + ?Sized,
    {
        parser.node_name(self.memo.borrow_mut().names_mut())
    }

    /// Derives a child activation at `offset` for the node named `name`.
    ///
    /// The child key is pushed onto a cloned path, and the memoizer is asked
    /// for the stream at the appropriate reentrant depth;
    /// `existing_results` on the returned context tells the caller whether
    /// the child parser still needs to run.
    pub fn child<T: Clone + 'static>(
        &self,
        name: NodeName,
        offset: usize,
        new_max_depth: Option<usize>,
    ) -> Context<T> {
        let key = PosKey::new(name, self.input.base(), offset);
        let (results, existing_results) =
            self.memo
                .borrow_mut()
                .stream::<T>(&self.path, key, new_max_depth);
        Context {
            input: self.input.clone(),
            offset,
            results,
            existing_results,
            memo: Rc::clone(&self.memo),
            key,
            path: self.path.pushed(key),
            payload: self.payload.clone(),
        }
    }

    /// Derives the retry child the reentrant driver runs one round in: same
    /// node name, same offset, retry counters pinned at `depth`.
    pub fn retry_child(&self, depth: usize) -> Context<V> {
        self.child(self.key.name, self.offset, Some(depth))
    }

    /// Runs `parser` as a child of this activation at `offset` and returns
    /// its (closed) result stream. If the memoizer already held the stream
    /// the parser is not re-invoked.
    pub fn run_child<T: Clone + 'static>(
        &self,
        parser: &dyn Parser<Value = T>,
        offset: usize,
    ) -> Rc<ResultStream<ParseResult<T>>> {
        let name = self.name_of(parser);
        let mut child = self.child::<T>(name, offset, None);
        if !child.existing_results {
            parser.parse(&mut child);
            debug_assert!(
                child.results.is_closed(),
                "parser returned without closing its stream"
            );
        }
        Rc::clone(&child.results)
    }

    /// Subscribes to a child stream with this activation's path as the
    /// ancestry, injecting `fallback` if the subscription turns out to be
    /// cyclic.
    pub fn subscribe_to<T: Clone + 'static>(
        &self,
        stream: &Rc<ResultStream<ParseResult<T>>>,
        fallback: ParseResult<T>,
    ) -> Subscription<ParseResult<T>> {
        stream.subscribe(&self.path, fallback)
    }

    /// The standard cyclic fallback: an empty-language error at this
    /// activation's offset.
    pub fn cyclic_fallback<T>(&self) -> ParseResult<T> {
        ParseResult::error(self.offset, ParseError::EmptyLanguage)
    }

    /// Subscribes to this context's own results as the external caller: no
    /// ancestry, so the subscription is never cyclic. This is how the
    /// top-level driver reads the outcome of a parse.
    pub fn subscribe(&self) -> Subscription<ParseResult<V>> {
        self.results
            .subscribe(&ParserPath::new(), self.cyclic_fallback())
    }

    /// Convenience for tests and simple callers: the first result of this
    /// context's stream, if any.
    pub fn first_result(&self) -> Option<ParseResult<V>> {
        self.subscribe().next()
    }

    /// Whether the first result is a value.
    pub fn succeeded(&self) -> bool {
        matches!(
            self.first_result(),
            Some(ParseResult {
                outcome: Outcome::Value(_),
                ..
            })
        )
    }

    pub(crate) fn memo_handle(&self) -> &Rc<RefCell<Memoizer>> {
        &self.memo
    }
}
