use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::rc::Rc;

use gll_framework::{
    flatten, heap, Context, ForwardRef, Input, Literal, MapTo, OneOf, ParseResult, Parser,
    ParserPath, Reentrant, Repeated, RepeatedAmbiguous, Sequence,
};

fn lit_as(text: &str, value: i64) -> Rc<dyn Parser<Value = i64>> {
    heap(MapTo::new(
        heap(Literal::new(text)),
        move |result: ParseResult<()>| {
            let offset = result.offset;
            result.into_value().map(|_| ParseResult::value(offset, value))
        },
    ))
}

fn sum_grammar() -> Rc<dyn Parser<Value = i64>> {
    let one = lit_as("1", 1);
    let expr_ref = ForwardRef::<i64>::new();
    let add = heap(MapTo::new(
        heap(Sequence::new(vec![
            expr_ref.clone() as Rc<dyn Parser<Value = i64>>,
            lit_as("+", 0),
            Rc::clone(&one),
        ])),
        |result: ParseResult<Vec<i64>>| {
            let offset = result.offset;
            result
                .into_value()
                .map(|parts| ParseResult::value(offset, parts[0] + parts[2]))
        },
    ));
    let body = heap(OneOf::new(vec![add, one]));
    let expr: Rc<dyn Parser<Value = i64>> = heap(Reentrant::new(body));
    expr_ref.define(Rc::clone(&expr));
    expr
}

fn bench_repetition(c: &mut Criterion) {
    let input = "abc".repeat(200);
    let mut group = c.benchmark_group("repetition");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("canonical", |b| {
        let repeated = Repeated::new(
            heap(Literal::new("abc")) as Rc<dyn Parser<Value = ()>>,
            0,
            None,
        );
        b.iter(|| {
            let mut ctx = Context::new(Input::from(input.as_str()), &repeated);
            repeated.parse(&mut ctx);
            ctx.first_result()
        });
    });

    group.bench_function("ambiguous_flattened", |b| {
        let repeated = RepeatedAmbiguous::new(
            heap(Literal::new("abc")) as Rc<dyn Parser<Value = ()>>,
            0,
            None,
        );
        b.iter(|| {
            let mut ctx = Context::new(Input::from(input.as_str()), &repeated);
            repeated.parse(&mut ctx);
            flatten(Rc::clone(ctx.results()), &ParserPath::new()).count()
        });
    });

    group.finish();
}

fn bench_left_recursion(c: &mut Criterion) {
    let input = {
        let mut s = String::from("1");
        for _ in 0..40 {
            s.push_str("+1");
        }
        s
    };
    let mut group = c.benchmark_group("left_recursion");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("sum_chain", |b| {
        let expr = sum_grammar();
        b.iter(|| {
            let mut ctx = Context::new(Input::from(input.as_str()), &*expr);
            expr.parse(&mut ctx);
            ctx.first_result()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_repetition, bench_left_recursion);
criterion_main!(benches);
