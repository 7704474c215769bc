//! Functions for flattening materialized JSON trees into per-field maps

use json::number::Number;
use json::JsonValue;

use crate::config::ClassificationPolicy;
use crate::value::{insert_first, FlatMap, Normalized};

/// The shape of a tree value, as seen by the flattening rules
#[derive(Clone, Copy, Debug)]
pub enum Shape<'a> {
    Object(&'a json::object::Object),
    Array(&'a [JsonValue]),
    Text(&'a str),
    Number(Number),
    Boolean(bool),
    Null,
}

/// Classify a tree value by its shape
pub fn shape(value: &JsonValue) -> Shape<'_> {
    match value {
        JsonValue::Object(object) => Shape::Object(object),
        JsonValue::Array(members) => Shape::Array(members),
        JsonValue::Short(text) => Shape::Text(text.as_str()),
        JsonValue::String(text) => Shape::Text(text),
        JsonValue::Number(number) => Shape::Number(*number),
        JsonValue::Boolean(value) => Shape::Boolean(*value),
        JsonValue::Null => Shape::Null,
    }
}

/// Flatten the immediate children of an object into a new map.
/// Anything other than an object yields an empty map.
pub fn flatten_object(tree: &JsonValue, policy: ClassificationPolicy) -> FlatMap {
    let mut map = FlatMap::new();
    if let Shape::Object(object) = shape(tree) {
        for (name, child) in object.iter() {
            flatten_child(name, child, policy, &mut map);
        }
    }

    map
}

/// Add one child of a flattened object to `map`, keeping any value
/// already stored under `name`
pub fn flatten_child(name: &str, value: &JsonValue, policy: ClassificationPolicy, map: &mut FlatMap) {
    match shape(value) {
        Shape::Object(object) => {
            // Go one level deeper, but the result stays here
            let mut nested = FlatMap::new();
            for (nested_name, nested_value) in object.iter() {
                flatten_leaf(nested_name, nested_value, policy, &mut nested);
            }
            log::trace!(
                "dropping {} flattened children of nested object {:?}",
                nested.len(),
                name
            );
        }
        Shape::Array(members) => {
            insert_first(map, name, Normalized::TextList(text_list(members)));
        }
        scalar => flatten_scalar(name, scalar, policy, map),
    }
}

/// Add a child found below a nested object, where further objects are not
/// flattened any more
fn flatten_leaf(name: &str, value: &JsonValue, policy: ClassificationPolicy, map: &mut FlatMap) {
    match shape(value) {
        Shape::Object(_) => {}
        Shape::Array(members) => {
            insert_first(map, name, Normalized::TextList(text_list(members)));
        }
        scalar => flatten_scalar(name, scalar, policy, map),
    }
}

/// Insert a scalar if the policy captures its kind
fn flatten_scalar(name: &str, scalar: Shape, policy: ClassificationPolicy, map: &mut FlatMap) {
    let normalized = match scalar {
        Shape::Text(text) => Normalized::Text(text.to_owned()),
        Shape::Boolean(value) => Normalized::Boolean(value),
        Shape::Number(number) if policy.keeps_nested_numbers() => Normalized::Number(number),
        Shape::Number(_) | Shape::Null | Shape::Object(_) | Shape::Array(_) => return,
    };

    insert_first(map, name, normalized);
}

/// Text of each array member, with `None` for members that are not strings
fn text_list(members: &[JsonValue]) -> Vec<Option<String>> {
    members
        .iter()
        .map(|member| member.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use json::{array, object};

    fn text(value: &str) -> Normalized {
        Normalized::Text(value.to_owned())
    }

    #[test]
    fn it_flattens_text_and_lists() {
        let obj = object! {x: "foo", y: ["p", "q"]};

        let map = flatten_object(&obj, ClassificationPolicy::Reference);

        assert_eq!(map.len(), 2);
        assert_eq!(map["x"], text("foo"));
        assert_eq!(
            map["y"],
            Normalized::TextList(vec![Some("p".into()), Some("q".into())])
        );
    }

    #[test]
    fn it_leaves_gaps_for_non_text_members() {
        let obj = object! {y: ["p", 1, null, {a: "b"}, ["c"]]};

        let map = flatten_object(&obj, ClassificationPolicy::Uniform);

        assert_eq!(
            map["y"],
            Normalized::TextList(vec![Some("p".into()), None, None, None, None])
        );
    }

    #[test]
    fn it_drops_nested_numbers_by_reference() {
        let obj = object! {n: 3, t: true, z: null};

        let map = flatten_object(&obj, ClassificationPolicy::Reference);

        assert!(!map.contains_key("n"));
        assert!(!map.contains_key("z"));
        assert_eq!(map["t"], Normalized::Boolean(true));
    }

    #[test]
    fn it_keeps_nested_numbers_when_uniform() {
        let obj = object! {n: 3, z: null};

        let map = flatten_object(&obj, ClassificationPolicy::Uniform);

        assert_eq!(map["n"], Normalized::Number(3.into()));
        assert!(!map.contains_key("z"));
    }

    #[test]
    fn it_does_not_propagate_nested_objects() {
        let obj = object! {inner: {k: "v", deeper: {x: "y"}}, x: "t"};

        let map = flatten_object(&obj, ClassificationPolicy::Uniform);

        assert_eq!(map.len(), 1);
        assert_eq!(map["x"], text("t"));
    }

    #[test]
    fn it_keeps_the_first_child() {
        let mut map = FlatMap::new();

        flatten_child("x", &"first".into(), ClassificationPolicy::Reference, &mut map);
        flatten_child("x", &"second".into(), ClassificationPolicy::Reference, &mut map);
        flatten_child("x", &array!["third"], ClassificationPolicy::Reference, &mut map);

        assert_eq!(map["x"], text("first"));
    }

    #[test]
    fn it_ignores_non_objects() {
        assert!(flatten_object(&array![1, 2], ClassificationPolicy::Uniform).is_empty());
        assert!(flatten_object(&"text".into(), ClassificationPolicy::Uniform).is_empty());
    }

    #[test]
    fn it_classifies_shapes() {
        assert!(matches!(shape(&object! {}), Shape::Object(_)));
        assert!(matches!(shape(&array![]), Shape::Array(_)));
        assert!(matches!(shape(&"x".into()), Shape::Text("x")));
        assert!(matches!(shape(&JsonValue::Boolean(false)), Shape::Boolean(false)));
        assert!(matches!(shape(&JsonValue::Null), Shape::Null));
        assert!(matches!(shape(&JsonValue::from(1)), Shape::Number(_)));
    }
}
