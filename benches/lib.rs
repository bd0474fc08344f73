//! # repl-breakpoint benchmarks
//!
//! Criterion benchmarks for the input pipeline and the bundled interpreter.
//!
//! ## Groups
//! - `input`: statement classification, line buffering and rendering
//! - `script`: the bundled interpreter
//! - `session`: whole in-memory sessions
//!
//! ## Usage
//! ```bash
//! cargo bench          # everything
//! cargo bench input    # input pipeline only
//! ```

use std::hint::black_box;
use std::io::{self, Cursor};

use criterion::{criterion_group, criterion_main, Criterion};
use repl_breakpoint::repl::{is_returnable_expression, render, LineBuffer};
use repl_breakpoint::{
    Evaluator, Interpreter, ReplOptions, Scope, ScopeSnapshot, Session, StdinSource, Value,
};

// ============================================================================
// Input Benchmarks
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let statements = [
        "1 + 1",
        "$x = 5;",
        "foreach ($items as $item) { echo $item; }",
        "format_name($user)",
        "function sq($x) { return $x * $x; }",
    ];
    c.bench_function("classify_statements", |b| {
        b.iter(|| {
            statements
                .iter()
                .filter(|s| is_returnable_expression(black_box(s)))
                .count()
        })
    });
}

fn bench_buffer_feed(c: &mut Criterion) {
    let lines = [
        "function total($items) {",
        "$sum = 0;",
        "foreach ($items as $item) {",
        "$sum += $item['price'] * ($item['qty'] ?? 1);",
        "}",
        "return $sum;",
        "}",
    ];
    c.bench_function("buffer_multiline_function", |b| {
        b.iter(|| {
            let mut buffer = LineBuffer::new();
            for line in &lines {
                black_box(buffer.feed(black_box(line)));
            }
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let rows: Vec<Value> = (0..50)
        .map(|i| Value::from(vec![Value::from(i), Value::from(format!("row {}", i))]))
        .collect();
    let value = Value::from(rows);
    c.bench_function("render_nested_array", |b| b.iter(|| render(black_box(&value))));
}

// ============================================================================
// Script Benchmarks
// ============================================================================

fn bench_script_fibonacci(c: &mut Criterion) {
    let source = std::fs::read_to_string("benches/scripts/fibonacci.php")
        .expect("Cannot read fibonacci.php");

    c.bench_function("script_fibonacci_iterative", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::with_output(io::sink());
            let mut scope = Scope::new();
            interpreter
                .execute(&source, &mut scope)
                .expect("declaration failed");
            interpreter
                .evaluate("fib(40)", &mut scope)
                .expect("evaluation failed")
        })
    });
}

fn bench_script_array_ops(c: &mut Criterion) {
    let source = std::fs::read_to_string("benches/scripts/array_ops.php")
        .expect("Cannot read array_ops.php");

    c.bench_function("script_array_operations", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::with_output(io::sink());
            let mut scope = Scope::new();
            interpreter
                .execute(&source, &mut scope)
                .expect("execution failed");
            scope
        })
    });
}

// ============================================================================
// Session Benchmarks
// ============================================================================

fn bench_session(c: &mut Criterion) {
    let mut variables = ScopeSnapshot::new();
    variables.insert("a".to_string(), Value::Int(2));
    variables.insert("c".to_string(), Value::from(vec![1, 2, 3]));
    let input = "$a * 21\nfunction sq($x) {\nreturn $x * $x;\n}\nsq($_ANS)\ncount($c)\nreturn\n";

    c.bench_function("session_short_transcript", |b| {
        b.iter(|| {
            let mut session = Session::new(
                Interpreter::with_output(io::sink()),
                StdinSource::new(Cursor::new(input)),
                Vec::new(),
                &variables,
                ReplOptions::new()
                    .quiet(true)
                    .error_handler(|_, _| {})
                    .shutdown_handler(|_| {}),
            );
            session.run().expect("session failed")
        })
    });
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    name = input;
    config = Criterion::default().sample_size(50);
    targets = bench_classify, bench_buffer_feed, bench_render
);

criterion_group!(
    name = script;
    config = Criterion::default().sample_size(20);
    targets = bench_script_fibonacci, bench_script_array_ops
);

criterion_group!(
    name = session;
    config = Criterion::default().sample_size(20);
    targets = bench_session
);

criterion_main!(input, script, session);
