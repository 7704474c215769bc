//! Token stream over a byte source
//!
//! Tokenizing is done by [`serde_json`]'s streaming [`Deserializer`]: field
//! names come from `MapAccess::next_key`, elements from
//! `SeqAccess::next_element_seed`, and scalars reach a visitor already
//! decoded. This module only opens the stream and materializes subtrees as
//! [`json::JsonValue`], which is what the flattening code works on.

use std::fmt;
use std::io::{BufReader, Read};

use json::number::Number;
use json::object::Object;
use json::JsonValue;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::de::IoRead;

/// Deserializer reading from `input`. Nothing is read until a value is
/// requested, and reading stops right after that value.
pub fn open<R: Read>(input: R) -> serde_json::Deserializer<IoRead<BufReader<R>>> {
    serde_json::Deserializer::from_reader(BufReader::new(input))
}

/// A scalar value as handed over by the deserializer
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Boolean(bool),
    Null,
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Scalar::Number(number) => Some(*number),
            _ => None,
        }
    }
}

/// A fully materialized subtree. When a name repeats inside an object the
/// first value is kept.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree(pub JsonValue);

impl Tree {
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TreeVisitor).map(Tree)
    }
}

/// Builds a [`JsonValue`] from whatever value the deserializer produces
pub(crate) struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = JsonValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(JsonValue::Boolean(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(JsonValue::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut members = Vec::new();
        while let Some(Tree(member)) = seq.next_element()? {
            members.push(member);
        }
        Ok(JsonValue::Array(members))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Object::new();
        while let Some(name) = map.next_key::<String>()? {
            let Tree(value) = map.next_value()?;
            if object.get(&name).is_none() {
                object.insert(&name, value);
            }
        }
        Ok(JsonValue::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    fn tree(input: &str) -> JsonValue {
        Tree::deserialize(&mut open(input.as_bytes()))
            .unwrap()
            .into_inner()
    }

    #[test]
    fn it_materializes_subtrees() {
        let value = tree(r#"{"x": "foo", "y": ["p", 2, null, true], "z": {"k": -1.5}}"#);

        assert_eq!(
            value,
            json::object! {
                "x": "foo",
                "y": json::array!["p", 2, null, true],
                "z": json::object! { "k": -1.5 }
            }
        );
    }

    #[test]
    fn it_materializes_scalars() {
        assert_eq!(tree(r#""a\nbé""#), JsonValue::from("a\nb\u{e9}"));
        assert_eq!(f64::from(tree("3e2").as_number().unwrap()), 300.0);
        assert_eq!(tree("-7"), JsonValue::from(-7));
        assert_eq!(tree("false"), JsonValue::Boolean(false));
        assert!(tree("null").is_null());
    }

    #[test]
    fn it_keeps_the_first_duplicate_in_trees() {
        let value = tree(r#"{"x": 1, "x": 2, "o": {"y": "a", "y": "b"}}"#);

        assert_eq!(value["x"], 1);
        assert_eq!(value["o"]["y"], "a");
        assert_eq!(value.len(), 2);
    }

    #[test]
    fn it_stops_after_one_value() {
        let mut de = open(r#"{"a": 1} {"b": 2}"#.as_bytes());

        let first = Tree::deserialize(&mut de).unwrap();
        let second = Tree::deserialize(&mut de).unwrap();

        assert_eq!(first.0["a"], 1);
        assert_eq!(second.0["b"], 2);
    }

    #[test]
    fn it_reports_malformed_input() {
        for input in [r#"{"a": }"#, r#"{"a" 1}"#, "[1, 2", "tru", ""] {
            let error: Error = Tree::deserialize(&mut open(input.as_bytes()))
                .unwrap_err()
                .into();

            assert!(error.is_malformed(), "{:?} gave {:?}", input, error);
        }
    }

    #[test]
    fn it_exposes_scalar_accessors() {
        assert_eq!(Scalar::Text("t".into()).as_text(), Some("t"));
        assert_eq!(Scalar::Number(4.into()).as_number(), Some(4.into()));
        assert_eq!(Scalar::Null.as_text(), None);
        assert_eq!(Scalar::Boolean(true).as_number(), None);
    }
}
