//! Value renderer
//!
//! Turns any [`Value`] into the text shown at the prompt. Rendering never
//! mutates the value. Strings are quoted without escaping, so the output is
//! meant for reading, not for feeding back in.

use crate::runtime::value::{format_float, Value};

/// Render a value for display
pub fn render(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
        Value::Null => "null".to_string(),
        Value::Str(s) => format!("\"{}\"", s),
        Value::Array(array) => {
            let is_list = array.is_list();
            let elements: Vec<String> = array
                .iter()
                .map(|(key, element)| {
                    if is_list {
                        render(element)
                    } else {
                        format!("{} => {}", key, render(element))
                    }
                })
                .collect();
            format!("[{}]", elements.join(","))
        }
        Value::Object(object) => object
            .to_text()
            .unwrap_or_else(|| format!("{} object", object.type_name())),
        other => format!("Something of type {}", other.kind_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::value::{Array, HostObject, Resource};

    #[derive(Debug)]
    struct Point;

    impl HostObject for Point {
        fn type_name(&self) -> &str {
            "Point"
        }
    }

    #[derive(Debug)]
    struct Money(i64);

    impl HostObject for Money {
        fn type_name(&self) -> &str {
            "Money"
        }

        fn to_text(&self) -> Option<String> {
            Some(format!("${}", self.0))
        }
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render(&Value::Int(42)), "42");
        assert_eq!(render(&Value::Int(-7)), "-7");
        assert_eq!(render(&Value::Float(1.5)), "1.5");
        assert_eq!(render(&Value::Float(2.0)), "2");
        assert_eq!(render(&Value::Float(f64::INFINITY)), "INF");
        assert_eq!(render(&Value::Bool(true)), "true");
        assert_eq!(render(&Value::Bool(false)), "false");
        assert_eq!(render(&Value::Null), "null");
    }

    #[test]
    fn test_render_string_does_not_escape() {
        assert_eq!(render(&Value::from("hi")), "\"hi\"");
        assert_eq!(render(&Value::from("say \"x\"")), "\"say \"x\"\"");
    }

    #[test]
    fn test_render_list() {
        assert_eq!(render(&Value::from(vec![1, 2, 3])), "[1,2,3]");
        assert_eq!(render(&Value::Array(Array::new())), "[]");
    }

    #[test]
    fn test_render_keyed_array_keeps_order() {
        let mut array = Array::new();
        array.insert("a", Value::Int(1));
        array.insert("b", Value::Int(2));
        assert_eq!(render(&Value::Array(array)), "[a => 1,b => 2]");

        let mut reversed = Array::new();
        reversed.insert(1i64, Value::from("x"));
        reversed.insert(0i64, Value::from("y"));
        assert_eq!(render(&Value::Array(reversed)), "[1 => \"x\",0 => \"y\"]");
    }

    #[test]
    fn test_render_nested() {
        let value = Value::from(vec![
            Value::Int(1),
            Value::from(vec![Value::Int(2), Value::from("three")]),
        ]);
        assert_eq!(render(&value), "[1,[2,\"three\"]]");
    }

    #[test]
    fn test_render_objects() {
        assert_eq!(render(&Value::object(Point)), "Point object");
        assert_eq!(render(&Value::object(Money(5))), "$5");
    }

    #[test]
    fn test_render_other_kinds() {
        let handle = Value::Resource(Resource::new("stream", 3));
        assert_eq!(render(&handle), "Something of type resource");
    }
}
