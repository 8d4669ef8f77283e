use std::rc::Rc;

use gll_framework::{
    flatten, heap, Context, Input, Literal, OneOf, ParseError, ParseResult, Parser, ParserPath,
    Sequence, SequenceAmbiguous,
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

#[test]
fn test_sequence_collects_children_in_order() {
    let sequence = Sequence::new(vec![lit("ab"), lit("cd"), lit("ef")]);
    let results = run(&sequence, "abcdef");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].offset, 6);
    assert_eq!(results[0].as_value().map(Vec::len), Some(3));
}

#[test]
fn test_sequence_propagates_the_first_error_and_stops() {
    let sequence = Sequence::new(vec![lit("ab"), lit("xx"), lit("ef")]);
    let results = run(&sequence, "abcdef");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].offset, 2);
    assert_eq!(
        results[0].as_error().map(ToString::to_string),
        Some("expected 'xx'".to_string())
    );
}

#[test]
fn test_sequence_advances_through_each_child() {
    let sequence = Sequence::new(vec![lit("a"), lit(""), lit("bc")]);
    let results = run(&sequence, "abcd");
    assert_eq!(results[0].offset, 3);
    assert!(results[0].is_value());
}

#[test]
fn test_sequence_ambiguous_enumerates_every_combination() {
    let first = heap(OneOf::new(vec![lit("ab"), lit("abab")]));
    let sequence = SequenceAmbiguous::new(vec![first, lit("ab")]);
    let results = run(&*sequence, "ababab");

    // Two head interpretations, each with its own continuation stream.
    assert_eq!(results.len(), 2);
    let heads: Vec<_> = results.iter().map(|r| r.offset).collect();
    assert_eq!(heads, vec![2, 4]);

    let level = results[0].as_value().expect("value level");
    assert_eq!(level.node.offset, 2);
    let next = level.next.as_ref().expect("continuation stream");
    let tail = next.snapshot();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].offset, 4);

    let level = results[1].as_value().expect("value level");
    let next = level.next.as_ref().expect("continuation stream");
    let tail = next.snapshot();
    assert_eq!(tail[0].offset, 6);
}

#[test]
fn test_sequence_ambiguous_forwards_head_errors() {
    let sequence = SequenceAmbiguous::new(vec![lit("xx"), lit("ab")]);
    let results = run(&*sequence, "ababab");
    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
    assert_eq!(results[0].offset, 0);
}

#[test]
fn test_flatten_walks_one_interpretation_path() {
    let sequence = SequenceAmbiguous::new(vec![lit("ab"), lit("cd"), lit("ef")]);
    let mut ctx = Context::new(Input::from("abcdef"), &*sequence);
    sequence.parse(&mut ctx);

    let offsets: Vec<_> = flatten(Rc::clone(ctx.results()), &ParserPath::new())
        .map(|result| result.offset)
        .collect();
    assert_eq!(offsets, vec![2, 4, 6]);
}

#[test]
fn test_flatten_ends_on_an_error_level() {
    let sequence = SequenceAmbiguous::new(vec![lit("ab"), lit("xx")]);
    let mut ctx = Context::new(Input::from("abcdef"), &*sequence);
    sequence.parse(&mut ctx);

    let flat: Vec<_> = flatten(Rc::clone(ctx.results()), &ParserPath::new()).collect();
    assert_eq!(flat.len(), 2);
    assert!(flat[0].is_value());
    assert_eq!(flat[0].offset, 2);
    assert!(flat[1].is_error());
    assert_eq!(flat[1].offset, 2);
}

#[test]
fn test_empty_child_stream_is_the_empty_language() {
    struct Silent;
    impl Parser for Silent {
        type Value = ();
        fn parse(&self, ctx: &mut Context<()>) {
            ctx.close();
        }
        fn node_name(&self, names: &mut gll_framework::NodeNames) -> gll_framework::NodeName {
            names.resolve(self as *const Self as usize, |_| {
                gll_framework::NodeNames::hash_shape("silent", &[])
            })
        }
    }

    let sequence = Sequence::new(vec![heap(Silent), lit("ab")]);
    let results = run(&sequence, "ababab");
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0].as_error(),
        Some(ParseError::EmptyLanguage)
    ));
}
