//! A left-recursive calculator: `expr = expr '+' number | number`.
//!
//! Run with an expression as the first argument:
//!
//! ```text
//! cargo run --example calc -- 12+34+5
//! ```
//!
//! Every interpretation the grammar admits is printed; the first one is the
//! full left-associative sum, the rest are the prefix parses the base
//! alternative keeps alive.

use std::rc::Rc;

use gll_framework::{
    heap, Context, ForwardRef, Input, Literal, MapTo, OneOf, Outcome, ParseResult, Parser,
    Reentrant, Repeated, Sequence,
};

fn digit() -> Rc<dyn Parser<Value = i64>> {
    let alternatives = (0..10u8)
        .map(|d| {
            let text = (b'0' + d) as char;
            heap(MapTo::new(
                heap(Literal::new(text.to_string())),
                move |result: ParseResult<()>| {
                    let offset = result.offset;
                    result
                        .into_value()
                        .map(|_| ParseResult::value(offset, i64::from(d)))
                },
            )) as Rc<dyn Parser<Value = i64>>
        })
        .collect();
    heap(OneOf::new(alternatives))
}

fn number() -> Rc<dyn Parser<Value = i64>> {
    heap(MapTo::new(
        heap(Repeated::new(digit(), 1, None)),
        |result: ParseResult<Vec<i64>>| {
            let offset = result.offset;
            result
                .into_value()
                .map(|digits| ParseResult::value(offset, digits.iter().fold(0, |n, d| n * 10 + d)))
        },
    ))
}

fn plus() -> Rc<dyn Parser<Value = i64>> {
    heap(MapTo::new(
        heap(Literal::new("+")),
        |result: ParseResult<()>| {
            let offset = result.offset;
            result.into_value().map(|_| ParseResult::value(offset, 0))
        },
    ))
}

fn expr() -> Rc<dyn Parser<Value = i64>> {
    let number = number();
    let expr_ref = ForwardRef::<i64>::new();
    let add = heap(MapTo::new(
        heap(Sequence::new(vec![
            expr_ref.clone() as Rc<dyn Parser<Value = i64>>,
            plus(),
            Rc::clone(&number),
        ])),
        |result: ParseResult<Vec<i64>>| {
            let offset = result.offset;
            result
                .into_value()
                .map(|parts| ParseResult::value(offset, parts[0] + parts[2]))
        },
    ));
    let body = heap(OneOf::new(vec![add, number]));
    let expr: Rc<dyn Parser<Value = i64>> = heap(Reentrant::new(body));
    expr_ref.define(Rc::clone(&expr));
    expr
}

fn main() {
    let source = std::env::args().nth(1).unwrap_or_else(|| "1+2+3".to_string());
    let grammar = expr();

    let mut ctx = Context::new(Input::from(source.as_str()), &*grammar);
    grammar.parse(&mut ctx);

    println!("input: {source}");
    for result in ctx.subscribe() {
        match result.outcome {
            Outcome::Value(value) => {
                println!("  = {value} (consumed {} bytes)", result.offset)
            }
            Outcome::Error(error) => println!("  error at {}: {error}", result.offset),
        }
    }
}
