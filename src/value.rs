//! Normalized values and the mappings that hold them

use std::collections::HashMap;

use itertools::Itertools;
use json::number::Number;
use json::JsonValue;

/// A single flattened value. Objects and arrays are always reduced to one
/// of these shapes before being stored.
#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    Text(String),
    Number(Number),
    Boolean(bool),
    /// Text of each array element in order, `None` where an element was
    /// not a string
    TextList(Vec<Option<String>>),
}

/// Immediate children of one object, keyed by child name
pub type FlatMap = HashMap<String, Normalized>;

/// What the result mapping holds for a top-level field
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Value(Normalized),
    /// Flattened children of an object field, or of the first object in an
    /// array field
    Flattened(FlatMap),
}

/// The result mapping from top-level field name to its entry
pub type FieldMap = HashMap<String, Entry>;

impl Normalized {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Normalized::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Normalized::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Normalized::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Option<String>]> {
        match self {
            Normalized::TextList(list) => Some(list),
            _ => None,
        }
    }
}

impl Entry {
    pub fn as_value(&self) -> Option<&Normalized> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Flattened(_) => None,
        }
    }

    pub fn as_flattened(&self) -> Option<&FlatMap> {
        match self {
            Entry::Flattened(map) => Some(map),
            Entry::Value(_) => None,
        }
    }
}

/// Insert unless the key is already present, returning whether it was
pub(crate) fn insert_first<V>(map: &mut HashMap<String, V>, key: &str, value: V) -> bool {
    if map.contains_key(key) {
        return false;
    }

    map.insert(key.to_owned(), value);
    true
}

impl From<&Normalized> for JsonValue {
    fn from(value: &Normalized) -> Self {
        match value {
            Normalized::Text(text) => text.as_str().into(),
            Normalized::Number(number) => JsonValue::Number(*number),
            Normalized::Boolean(value) => JsonValue::Boolean(*value),
            Normalized::TextList(list) => JsonValue::Array(
                list.iter()
                    .map(|item| match item {
                        Some(text) => text.as_str().into(),
                        None => JsonValue::Null,
                    })
                    .collect(),
            ),
        }
    }
}

impl From<&Entry> for JsonValue {
    fn from(entry: &Entry) -> Self {
        match entry {
            Entry::Value(value) => value.into(),
            Entry::Flattened(map) => sorted_object(map),
        }
    }
}

/// Render a mapping as a JSON object with keys in sorted order
pub fn sorted_object<'a, V>(map: &'a HashMap<String, V>) -> JsonValue
where
    JsonValue: From<&'a V>,
{
    let mut object = json::object::Object::new();
    for (key, value) in map.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        object.insert(key, JsonValue::from(value));
    }

    JsonValue::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_keeps_the_first_insert() {
        let mut map = FlatMap::new();

        assert!(insert_first(&mut map, "a", Normalized::Text("x".into())));
        assert!(!insert_first(&mut map, "a", Normalized::Text("y".into())));

        assert_eq!(map["a"], Normalized::Text("x".into()));
    }

    #[test]
    fn it_renders_sorted_json() {
        let mut inner = FlatMap::new();
        inner.insert(
            "y".into(),
            Normalized::TextList(vec![Some("p".into()), None]),
        );
        inner.insert("x".into(), Normalized::Boolean(true));

        let mut fields = FieldMap::new();
        fields.insert("b".into(), Entry::Flattened(inner));
        fields.insert("a".into(), Entry::Value(Normalized::Number(1.into())));

        assert_eq!(
            sorted_object(&fields).dump(),
            r#"{"a":1,"b":{"x":true,"y":["p",null]}}"#
        );
    }

    #[test]
    fn it_exposes_typed_accessors() {
        let entry = Entry::Value(Normalized::Number(Number::from(2.5)));

        assert!(entry.as_flattened().is_none());
        assert_eq!(
            entry.as_value().and_then(Normalized::as_number),
            Some(Number::from(2.5))
        );
        assert!(entry.as_value().and_then(Normalized::as_text).is_none());
    }
}
