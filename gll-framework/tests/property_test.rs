use std::rc::Rc;

use proptest::prelude::*;

use gll_framework::{
    flatten, heap, Context, Input, Literal, ParseResult, Parser, ParserPath, Repeated,
    RepeatedAmbiguous,
};

fn run<P>(parser: &P, input: &[u8]) -> Vec<ParseResult<P::Value>>
where
    P: Parser + ?Sized,
{
    let mut ctx = Context::new(Input::from(input), parser);
    parser.parse(&mut ctx);
    ctx.subscribe().collect()
}

proptest! {
    #[test]
    fn prop_literal_matches_iff_prefix(
        needle in "[a-c]{1,4}",
        input in "[a-c]{0,8}",
    ) {
        let literal = Literal::new(needle.as_str());
        let results = run(&literal, input.as_bytes());
        prop_assert_eq!(results.len(), 1);
        if input.as_bytes().starts_with(needle.as_bytes()) {
            prop_assert!(results[0].is_value());
            prop_assert_eq!(results[0].offset, needle.len());
        } else {
            prop_assert!(results[0].is_error());
            prop_assert_eq!(results[0].offset, 0);
        }
    }

    #[test]
    fn prop_repeated_counts_leading_occurrences(n in 0usize..12) {
        let input = format!("{}zz", "ab".repeat(n));
        let repeated = Repeated::new(
            heap(Literal::new("ab")) as Rc<dyn Parser<Value = ()>>,
            0,
            None,
        );
        let results = run(&repeated, input.as_bytes());
        prop_assert_eq!(results.len(), 1);
        prop_assert_eq!(results[0].offset, 2 * n);
        prop_assert_eq!(results[0].as_value().map(Vec::len), Some(n));
    }

    #[test]
    fn prop_flattened_offsets_strictly_increase(n in 1usize..10) {
        let input = format!("{}!", "xy".repeat(n));
        let repeated = RepeatedAmbiguous::new(
            heap(Literal::new("xy")) as Rc<dyn Parser<Value = ()>>,
            0,
            None,
        );
        let mut ctx = Context::new(Input::from(input.as_bytes()), &repeated);
        repeated.parse(&mut ctx);

        let offsets: Vec<_> = flatten(Rc::clone(ctx.results()), &ParserPath::new())
            .take_while(|result| result.is_value())
            .map(|result| result.offset)
            .collect();
        prop_assert_eq!(offsets.len(), n);
        for pair in offsets.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn prop_bounded_repetition_never_exceeds_max(
        n in 0usize..8,
        max in 0usize..8,
    ) {
        let input = "ab".repeat(n);
        let repeated = Repeated::new(
            heap(Literal::new("ab")) as Rc<dyn Parser<Value = ()>>,
            0,
            Some(max),
        );
        let results = run(&repeated, input.as_bytes());
        if max == 0 {
            prop_assert!(results.is_empty());
        } else {
            prop_assert_eq!(results.len(), 1);
            let count = results[0].as_value().map(Vec::len).unwrap_or(0);
            prop_assert_eq!(count, n.min(max));
        }
    }
}
