//! Ordered keyed arrays
//!
//! Keys are either integers or strings. Insertion order is iteration order.
//! String keys that spell a canonical decimal integer are stored as integer
//! keys, so `"5"` and `5` address the same slot.

use std::fmt;

use indexmap::IndexMap;

use super::Value;

/// Array key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    /// Build a key from text, normalising canonical integers
    pub fn from_text(text: &str) -> Self {
        let canonical = !text.is_empty()
            && (text == "0" || !text.starts_with('0'))
            && !text.starts_with("-0")
            && !text.starts_with('+');
        if canonical {
            if let Ok(i) = text.parse::<i64>() {
                return ArrayKey::Int(i);
            }
        }
        ArrayKey::Str(text.to_string())
    }

    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(i) => Value::Int(*i),
            ArrayKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::from_text(s)
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        ArrayKey::from_text(&s)
    }
}

/// Ordered keyed collection with value semantics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    entries: IndexMap<ArrayKey, Value>,
    /// Key used by the next append
    next_index: i64,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(
        &self,
        key: &ArrayKey,
    ) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(
        &self,
        key: &ArrayKey,
    ) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite, keeping the original position of existing keys
    pub fn insert(
        &mut self,
        key: impl Into<ArrayKey>,
        value: Value,
    ) {
        let key = key.into();
        self.bump_next_index(&key);
        self.entries.insert(key, value);
    }

    /// Append with the next integer key
    pub fn push(
        &mut self,
        value: Value,
    ) {
        let key = ArrayKey::Int(self.next_index);
        self.insert(key, value);
    }

    /// Mutable slot for `key`, created as `null` when missing
    pub fn entry(
        &mut self,
        key: ArrayKey,
    ) -> &mut Value {
        self.bump_next_index(&key);
        self.entries.entry(key).or_insert(Value::Null)
    }

    /// Mutable slot for a freshly appended `null` element
    pub fn push_slot(&mut self) -> &mut Value {
        let key = ArrayKey::Int(self.next_index);
        self.entry(key)
    }

    pub fn get_mut(
        &mut self,
        key: &ArrayKey,
    ) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(
        &mut self,
        key: &ArrayKey,
    ) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Whether the keys are exactly `0, 1, 2, ...` in iteration order
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(position, key)| matches!(key, ArrayKey::Int(i) if usize::try_from(*i) == Ok(position)))
    }

    fn bump_next_index(
        &mut self,
        key: &ArrayKey,
    ) {
        if let ArrayKey::Int(i) = key {
            if *i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut array = Array::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl FromIterator<(ArrayKey, Value)> for Array {
    fn from_iter<I: IntoIterator<Item = (ArrayKey, Value)>>(iter: I) -> Self {
        let mut array = Array::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}
