//! End-to-end sessions with the bundled interpreter

use crate::common::{run, run_with, variables};
use repl_breakpoint::{ReplOptions, SessionExit, Value};

#[test]
fn test_expression_is_displayed_and_remembered() {
    let transcript = run("1+1\n$_ANS * 10\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> 2\n> 20\n> ");
    assert_eq!(transcript.last_answer, Value::Int(20));
    assert_eq!(transcript.exit, SessionExit::EndOfInput);
}

#[test]
fn test_statement_with_semicolon_is_not_displayed() {
    let transcript = run("$x = 5;\n$x\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> \n> 5\n> ");
}

#[test]
fn test_injected_variables_are_visible() {
    let snapshot = variables(&[
        ("a", Value::Int(2)),
        ("b", Value::from("hello")),
        ("c", Value::from(vec![1, 2, 3])),
    ]);
    let transcript = run("$a\n$b\n$c\n", &snapshot);
    assert_eq!(transcript.output, "\n> 2\n> \"hello\"\n> [1,2,3]\n> ");
    assert!(transcript.errors.is_empty());
}

#[test]
fn test_reserved_names_are_not_injected() {
    let snapshot = variables(&[("_SERVER", Value::Int(1)), ("ok", Value::Int(2))]);
    let transcript = run("isset($_SERVER)\n$ok\n", &snapshot);
    assert_eq!(transcript.output, "\n> false\n> 2\n> ");
}

#[test]
fn test_multiline_function_then_call() {
    let input = "function sq($x) {\nreturn $x * $x;\n}\nsq(7)\n";
    let transcript = run(input, &variables(&[]));
    let expected = format!("\n> {}{}\n> 49\n> ", " ".repeat(4), " ".repeat(4));
    assert_eq!(transcript.output, expected);
    assert_eq!(transcript.last_answer, Value::Int(49));
}

#[test]
fn test_continuation_marker_joins_lines() {
    let transcript = run("1 + \\\n2\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> \n> 3\n> ");
}

#[test]
fn test_echo_output_interleaves_with_prompts() {
    let transcript = run("echo 'hi';\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> hi\n> ");
}

#[test]
fn test_exit_token_ends_session() {
    let transcript = run("return\n1+1\n", &variables(&[]));
    assert_eq!(transcript.exit, SessionExit::ExitToken);
    assert_eq!(transcript.output, "\n> ");
    assert_eq!(transcript.last_answer, Value::Null);
}

#[test]
fn test_break_with_semicolon_also_exits() {
    let transcript = run("  break;  \n", &variables(&[]));
    assert_eq!(transcript.exit, SessionExit::ExitToken);
}

#[test]
fn test_closing_paren_without_opener_resets() {
    let transcript = run(")\n5\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> Incorrect closing paren. Expected nothing, not )\n> 5\n> ");
}

#[test]
fn test_transient_errors_keep_the_session_alive() {
    let transcript = run("nope()\n1/0\n$missing\n3\n", &variables(&[]));
    assert_eq!(
        transcript.errors,
        vec![
            "Error: Call to undefined function nope()",
            "Error: Division by zero",
            "Warning: Undefined variable $missing",
        ]
    );
    assert_eq!(transcript.last_answer, Value::Int(3));
}

#[test]
fn test_user_error_is_fatal() {
    let transcript = run("trigger_error('stop', E_USER_ERROR);\n1\n", &variables(&[]));
    assert_eq!(transcript.exit, SessionExit::Fatal(transcript.fatal.clone().unwrap()));
    assert_eq!(transcript.fatal.map(|f| (f.code, f.message)), Some((256, "stop".to_string())));
    assert_eq!(transcript.output, "\n> ");
}

#[test]
fn test_banner_names_context() {
    let options = ReplOptions::new().function("handler").line(12);
    let transcript = run_with("", &variables(&[]), options);
    assert!(transcript
        .output
        .starts_with("REPL launched in function handler on line 12\nTo exit"));
}

#[test]
fn test_session_does_not_touch_callers_snapshot() {
    let snapshot = variables(&[("n", Value::Int(1))]);
    run("$n = 99;\n", &snapshot);
    assert_eq!(snapshot.get("n"), Some(&Value::Int(1)));
}
