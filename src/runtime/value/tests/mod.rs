//! Value and array tests

use crate::runtime::value::{format_float, Array, ArrayKey, Value};

#[test]
fn test_truthiness() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::from("0").is_truthy());
    assert!(!Value::from("").is_truthy());
    assert!(!Value::Array(Array::new()).is_truthy());
    assert!(Value::from("0.0").is_truthy());
    assert!(Value::Float(0.5).is_truthy());
}

#[test]
fn test_kind_names() {
    assert_eq!(Value::Int(1).kind_name(), "integer");
    assert_eq!(Value::Float(1.0).kind_name(), "double");
    assert_eq!(Value::Null.kind_name(), "NULL");
}

#[test]
fn test_numeric_string_keys_are_normalised() {
    assert_eq!(ArrayKey::from_text("5"), ArrayKey::Int(5));
    assert_eq!(ArrayKey::from_text("-3"), ArrayKey::Int(-3));
    assert_eq!(ArrayKey::from_text("05"), ArrayKey::Str("05".into()));
    assert_eq!(ArrayKey::from_text("-0"), ArrayKey::Str("-0".into()));
    assert_eq!(ArrayKey::from_text("a"), ArrayKey::Str("a".into()));
}

#[test]
fn test_push_continues_after_largest_int_key() {
    let mut array = Array::new();
    array.insert(5i64, Value::Int(1));
    array.push(Value::Int(2));
    assert_eq!(array.get(&ArrayKey::Int(6)), Some(&Value::Int(2)));
}

#[test]
fn test_is_list() {
    let list: Array = vec![Value::Int(1), Value::Int(2)].into_iter().collect();
    assert!(list.is_list());

    let mut gapped = Array::new();
    gapped.insert(1i64, Value::Int(1));
    assert!(!gapped.is_list());

    let mut reordered = Array::new();
    reordered.insert(1i64, Value::Int(1));
    reordered.insert(0i64, Value::Int(0));
    assert!(!reordered.is_list());

    assert!(Array::new().is_list());
}

#[test]
fn test_remove_preserves_order() {
    let mut array: Array = vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        .into_iter()
        .collect();
    array.remove(&ArrayKey::Int(0));
    let keys: Vec<_> = array.keys().cloned().collect();
    assert_eq!(keys, vec![ArrayKey::Int(1), ArrayKey::Int(2)]);
}

#[test]
fn test_arrays_are_copied_on_clone() {
    let original = Value::from(vec![1, 2]);
    let mut copy = original.clone();
    if let Value::Array(array) = &mut copy {
        array.push(Value::Int(3));
    }
    assert_eq!(original.as_array().map(Array::len), Some(2));
    assert_eq!(copy.as_array().map(Array::len), Some(3));
}

#[test]
fn test_float_formatting() {
    assert_eq!(format_float(1.5), "1.5");
    assert_eq!(format_float(2.0), "2");
    assert_eq!(format_float(-0.25), "-0.25");
    assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(format_float(0.0001), "0.0001");
    assert_eq!(format_float(123456789012345.0), "123456789012345");
}

#[test]
fn test_large_and_small_floats_use_exponent_form() {
    assert_eq!(format_float(1e15), "1.0E+15");
    assert_eq!(format_float(1e20), "1.0E+20");
    assert_eq!(format_float(-2.5e30), "-2.5E+30");
    assert_eq!(format_float(0.00001), "1.0E-5");
    assert_eq!(format_float(9223372036854775808.0), "9.223372036854776E+18");
    assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
    assert_eq!(format_float(f64::NAN), "NAN");
}
