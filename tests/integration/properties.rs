//! Property tests for scope injection, statement classification, the line
//! buffer and the renderer

use proptest::prelude::*;

use repl_breakpoint::repl::lexical::{is_returnable_expression, NON_RETURNABLE_KEYWORDS};
use repl_breakpoint::repl::printer::render;
use repl_breakpoint::repl::{Feed, LineBuffer};
use repl_breakpoint::runtime::scope::RESERVED_NAMES;
use repl_breakpoint::{Scope, ScopeSnapshot, Value};

/// Strategy for generating variable names
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,10}"
}

/// Strategy for generating snapshots that may contain reserved names
fn snapshot_strategy() -> impl Strategy<Value = ScopeSnapshot> {
    let name = prop_oneof![
        3 => name_strategy(),
        1 => prop::sample::select(RESERVED_NAMES.to_vec()).prop_map(String::from),
    ];
    prop::collection::vec((name, any::<i64>()), 0..12).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(name, value)| (name, Value::Int(value)))
            .collect()
    })
}

/// Strategy for generating lines made of brackets and filler
fn bracket_line_strategy() -> impl Strategy<Value = String> {
    "[(){}\\[\\]a ]{0,12}"
}

proptest! {
    #[test]
    fn prop_injection_copies_every_plain_variable(snapshot in snapshot_strategy()) {
        let scope = Scope::inject(&snapshot);
        for (name, value) in &snapshot {
            if RESERVED_NAMES.contains(&name.as_str()) {
                prop_assert!(scope.get(name).is_none());
            } else {
                prop_assert_eq!(scope.get(name), Some(value));
            }
        }
    }

    #[test]
    fn prop_injected_scope_is_independent(snapshot in snapshot_strategy()) {
        let original = snapshot.clone();
        let mut scope = Scope::inject(&snapshot);
        for name in snapshot.keys() {
            scope.set(name.clone(), Value::from("changed"));
        }
        prop_assert_eq!(snapshot, original);
    }

    #[test]
    fn prop_semicolon_statements_are_executed(body in "[a-z0-9$ +()]{0,20}") {
        let with_semicolon = format!("{};", body);
        let with_brace = format!("{}}}", body);
        prop_assert!(!is_returnable_expression(&with_semicolon));
        prop_assert!(!is_returnable_expression(&with_brace));
    }

    #[test]
    fn prop_keyword_statements_are_executed(
        keyword in prop::sample::select(NON_RETURNABLE_KEYWORDS.to_vec()),
        boundary in prop::sample::select(vec!["(", " ", "{"]),
        rest in "[a-z0-9$]{0,10}",
    ) {
        let statement = format!("{}{}{}", keyword, boundary, rest);
        prop_assert!(!is_returnable_expression(&statement));
    }

    #[test]
    fn prop_keyword_prefixes_are_not_keywords(
        keyword in prop::sample::select(NON_RETURNABLE_KEYWORDS.to_vec()),
        rest in "[a-z0-9_]{1,8}",
    ) {
        let statement = format!("{}{}", keyword, rest);
        prop_assert!(is_returnable_expression(&statement));
    }

    #[test]
    fn prop_buffer_depth_tracks_open_brackets(lines in prop::collection::vec(bracket_line_strategy(), 1..8)) {
        let mut buffer = LineBuffer::new();
        for line in &lines {
            match buffer.feed(line) {
                Feed::Mismatch(_) | Feed::Complete(_) => {
                    prop_assert_eq!(buffer.indentation_level(), 0);
                    prop_assert_eq!(buffer.buffered_code(), "");
                }
                Feed::Incomplete => {}
            }
            prop_assert_eq!(buffer.indentation_level(), buffer.paren_stack().len());
        }
    }

    #[test]
    fn prop_balanced_input_completes(depth in 1usize..10) {
        let mut buffer = LineBuffer::new();
        for _ in 0..depth {
            prop_assert_eq!(buffer.feed("("), Feed::Incomplete);
        }
        prop_assert_eq!(buffer.indentation_level(), depth);
        for _ in 1..depth {
            prop_assert_eq!(buffer.feed(")"), Feed::Incomplete);
        }
        let expected = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
        prop_assert_eq!(buffer.feed(")"), Feed::Complete(expected));
    }

    #[test]
    fn prop_lists_render_in_order(items in prop::collection::vec(any::<i64>(), 0..20)) {
        let expected = format!(
            "[{}]",
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
        );
        prop_assert_eq!(render(&Value::from(items)), expected);
    }

    #[test]
    fn prop_rendering_does_not_change_value(items in prop::collection::vec(any::<i64>(), 0..20)) {
        let value = Value::from(items);
        let before = value.clone();
        let first = render(&value);
        prop_assert_eq!(render(&value), first);
        prop_assert_eq!(value, before);
    }
}
