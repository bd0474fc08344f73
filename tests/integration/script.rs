//! The bundled interpreter driven through whole sessions

use crate::common::{run, variables};
use repl_breakpoint::{SessionExit, Value};

#[test]
fn test_for_loop_accumulates() {
    let input = "$total = 0;\nfor ($i = 1; $i <= 4; $i++) { $total += $i; }\n$total\n";
    let transcript = run(input, &variables(&[]));
    assert_eq!(transcript.output, "\n> \n> \n> 10\n> ");
    assert!(transcript.errors.is_empty());
}

#[test]
fn test_foreach_over_injected_array() {
    let snapshot = variables(&[("c", Value::from(vec![1, 2, 3]))]);
    let input = "$out = '';\nforeach ($c as $n) { $out .= $n; }\n$out\n";
    let transcript = run(input, &snapshot);
    assert_eq!(transcript.last_answer, Value::from("123"));
}

#[test]
fn test_nested_append_creates_arrays() {
    let transcript = run("$m['x'][] = 5;\n$m\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> \n> [x => [5]]\n> ");
}

#[test]
fn test_missing_key_warns_and_yields_null() {
    let snapshot = variables(&[("c", Value::from(vec![1]))]);
    let transcript = run("$c[5]\n", &snapshot);
    assert_eq!(transcript.errors, vec!["Warning: Undefined array key 5"]);
    assert_eq!(transcript.last_answer, Value::Null);
}

#[test]
fn test_interpolation_and_coalesce() {
    let transcript = run("$b = 'world';\n\"hello $b\"\n$unset ?? 'fallback'\n", &variables(&[]));
    assert_eq!(transcript.output, "\n> \n> \"hello world\"\n> \"fallback\"\n> ");
    assert!(transcript.errors.is_empty());
}

#[test]
fn test_recursive_function() {
    let input = "function fib($n) { return $n < 2 ? $n : fib($n - 1) + fib($n - 2); }\nfib(10)\n";
    let transcript = run(input, &variables(&[]));
    assert_eq!(transcript.last_answer, Value::Int(55));
}

#[test]
fn test_redeclared_function_is_rejected() {
    let input = "function f() { return 1; }\nfunction f() { return 2; }\nf()\n";
    let transcript = run(input, &variables(&[]));
    assert_eq!(transcript.errors, vec!["Error: Cannot redeclare f()"]);
    assert_eq!(transcript.last_answer, Value::Int(1));
}

#[test]
fn test_runaway_recursion_ends_the_session() {
    let input = "function down($n) { return down($n + 1); }\ndown(0)\n1\n";
    let transcript = run(input, &variables(&[]));
    let fatal = transcript.fatal.clone().unwrap();
    assert_eq!(fatal.code, 1);
    assert!(fatal.message.starts_with("Maximum function nesting level"));
    assert_eq!(transcript.exit, SessionExit::Fatal(fatal));
}

#[test]
fn test_defined_vars_lists_the_session_scope() {
    let snapshot = variables(&[("a", Value::Int(1))]);
    let transcript = run("get_defined_vars()\n", &snapshot);
    assert_eq!(transcript.output, "\n> [a => 1,_ANS => null]\n> ");
}

#[test]
fn test_syntax_error_is_reported() {
    let transcript = run("1 +* 2\n7\n", &variables(&[]));
    assert_eq!(transcript.errors.len(), 1);
    assert!(transcript.errors[0].starts_with("Error: syntax error"));
    assert_eq!(transcript.last_answer, Value::Int(7));
}

#[test]
fn test_user_warning_goes_to_error_handler() {
    let transcript = run("trigger_error('careful', E_USER_WARNING)\n", &variables(&[]));
    assert_eq!(transcript.errors, vec!["Warning: careful"]);
    assert_eq!(transcript.last_answer, Value::Bool(true));
}

#[test]
fn test_deeply_nested_input_is_rejected() {
    let nots = format!("{}1\n3\n", "!".repeat(1000));
    let transcript = run(&nots, &variables(&[]));
    assert_eq!(transcript.errors, vec!["Error: Maximum nesting level of '128' reached"]);
    assert_eq!(transcript.last_answer, Value::Int(3));

    let parens = format!("{}1{}\n4\n", "(".repeat(300), ")".repeat(300));
    let transcript = run(&parens, &variables(&[]));
    assert_eq!(transcript.errors, vec!["Error: Maximum nesting level of '128' reached"]);
    assert_eq!(transcript.last_answer, Value::Int(4));
}

#[test]
fn test_moderate_nesting_still_evaluates() {
    let transcript = run(&format!("{}1\n", "!".repeat(30)), &variables(&[]));
    assert!(transcript.errors.is_empty());
    assert_eq!(transcript.last_answer, Value::Bool(true));
}

#[test]
fn test_oversized_string_ends_the_session_cleanly() {
    let transcript = run("str_repeat('ab', 9223372036854775807)\n3\n", &variables(&[]));
    let fatal = transcript.fatal.clone().unwrap();
    assert_eq!(fatal.code, 1);
    assert!(fatal.message.starts_with("Allowed memory size of 134217728 bytes exhausted"));
    assert_eq!(transcript.exit, SessionExit::Fatal(fatal));
    assert_eq!(transcript.last_answer, Value::Null);
}

#[test]
fn test_float_results_stay_distinguishable_from_ints() {
    let transcript = run("0.1 + 0.2\n1e20\nPHP_INT_MAX + 1\n", &variables(&[]));
    assert_eq!(
        transcript.output,
        "\n> 0.30000000000000004\n> 1.0E+20\n> 9.223372036854776E+18\n> "
    );
}
