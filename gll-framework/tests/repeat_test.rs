use std::rc::Rc;

use rstest::rstest;

use gll_framework::{
    flatten, heap, Context, Input, Literal, ParseError, ParseResult, Parser, ParserPath, Repeated,
    RepeatedAmbiguous,
};

fn run<P>(parser: &P, input: &str) -> Vec<ParseResult<P::Value>>
where
    P: Parser + ?Sized,
{
    let mut ctx = Context::new(Input::from(input), parser);
    parser.parse(&mut ctx);
    ctx.subscribe().collect()
}

fn lit(text: &str) -> Rc<dyn Parser<Value = ()>> {
    heap(Literal::new(text))
}

#[rstest]
#[case(0, None, 3, 9)]
#[case(1, None, 3, 9)]
#[case(3, None, 3, 9)]
#[case(0, Some(2), 2, 6)]
#[case(2, Some(2), 2, 6)]
#[case(0, Some(1), 1, 3)]
fn test_repeated_bounds(
    #[case] min: usize,
    #[case] max: Option<usize>,
    #[case] count: usize,
    #[case] offset: usize,
) {
    let repeated = Repeated::new(lit("abc"), min, max);
    let results = run(&repeated, "abcabcabc123abc");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].offset, offset);
    assert_eq!(results[0].as_value().map(Vec::len), Some(count));
}

#[test]
fn test_repeated_below_minimum_forwards_the_child_error() {
    let repeated = Repeated::new(lit("abc"), 4, None);
    let results = run(&repeated, "abcabcabc123abc");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].offset, 9);
    assert_eq!(
        results[0].as_error().map(ToString::to_string),
        Some("expected 'abc'".to_string())
    );
}

#[test]
fn test_repeated_with_no_match_at_all() {
    let repeated = Repeated::new(lit("abc"), 1, None);
    let results = run(&repeated, "xyz");
    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
    assert_eq!(results[0].offset, 0);
}

#[test]
fn test_repeated_max_zero_closes_with_no_results() {
    let repeated = Repeated::new(lit("abc"), 0, Some(0));
    let results = run(&repeated, "abcabc");
    assert!(results.is_empty());
}

#[test]
fn test_repeated_ambiguous_max_zero_closes_with_no_results() {
    let repeated = RepeatedAmbiguous::new(lit("abc"), 0, Some(0));
    let results = run(&repeated, "abcabc");
    assert!(results.is_empty());
}

#[test]
fn test_repeated_of_empty_literal_terminates() {
    // A zero-consumption child must not loop the repetition forever: the
    // match is taken once and collection stops.
    let repeated = Repeated::new(lit(""), 0, None);
    let results = run(&repeated, "abc");
    assert_eq!(results.len(), 1);
    assert!(results[0].is_value());
    assert_eq!(results[0].offset, 0);
    assert_eq!(results[0].as_value().map(Vec::len), Some(1));
}

#[test]
fn test_repeated_ambiguous_rejects_zero_consumption_paths() {
    let repeated = RepeatedAmbiguous::new(lit(""), 0, None);
    let results = run(&repeated, "abc");
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0].as_error(),
        Some(ParseError::NoProgress)
    ));
}

#[test]
fn test_repeated_ambiguous_levels_chain_by_offset() {
    let repeated = RepeatedAmbiguous::new(lit("ab"), 0, None);
    let mut ctx = Context::new(Input::from("ababx"), &repeated);
    repeated.parse(&mut ctx);

    let top = ctx.subscribe().collect::<Vec<_>>();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].offset, 2);

    let offsets: Vec<_> = flatten(Rc::clone(ctx.results()), &ParserPath::new())
        .map(|result| result.offset)
        .collect();
    assert_eq!(offsets, vec![2, 4]);
}

#[test]
fn test_repeated_ambiguous_below_minimum_emits_expected_more() {
    let repeated = RepeatedAmbiguous::new(lit("ab"), 3, None);
    let mut ctx = Context::new(Input::from("ababx"), &repeated);
    repeated.parse(&mut ctx);

    // The level still emits its value (deeper levels carry their own
    // shortfall errors), followed by the expected-more marker at the
    // furthest reached offset.
    let top: Vec<_> = ctx.subscribe().collect();
    assert_eq!(top.len(), 2);
    assert!(top[0].is_value());
    assert_eq!(
        top[1].as_error().map(ToString::to_string),
        Some("expected more".to_string())
    );
    assert_eq!(top[1].offset, 2);

    // Following one interpretation path bottoms out in the child mismatch.
    let flat: Vec<_> = flatten(Rc::clone(ctx.results()), &ParserPath::new()).collect();
    assert_eq!(flat.len(), 3);
    assert_eq!(
        flat[2].as_error().map(ToString::to_string),
        Some("expected 'ab'".to_string())
    );
    assert_eq!(flat[2].offset, 4);
}

#[test]
fn test_repeated_unbounded_stops_when_the_child_stops_advancing() {
    let repeated = Repeated::new(lit("ab"), 0, None);
    let results = run(&repeated, "abababab");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].offset, 8);
    assert_eq!(results[0].as_value().map(Vec::len), Some(4));
}
