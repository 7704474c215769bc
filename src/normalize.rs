//! Streaming traversal of the top-level fields of a JSON object
//!
//! The root object is never materialized. Each field name is pulled from
//! the deserializer and its value is classified on arrival: numbers (and,
//! under [`ClassificationPolicy::Uniform`], other scalars) are stored
//! directly, while objects and arrays of objects are flattened one level
//! into a [`FlatMap`]. Flattened maps are only recorded in diagnostic mode.
//!
//! Inputs whose root is not an object are rejected with
//! [`Error::RootNotObject`].
//!
//! [`ClassificationPolicy::Uniform`]: crate::config::ClassificationPolicy::Uniform

use std::fmt;
use std::io::Read;

use log::{debug, trace, warn};
use serde::de::{
    self, Deserialize, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor,
};

use crate::config::{ClassificationPolicy, Config};
use crate::error::{Error, Result};
use crate::flatten;
use crate::reader::{self, Scalar, Tree, TreeVisitor};
use crate::value::{insert_first, Entry, FieldMap, FlatMap, Normalized};

/// One traversal session. It owns the result mapping until the traversal
/// finishes and hands it over in an [`Outcome`].
#[derive(Debug)]
pub struct Normalizer {
    config: Config,
    fields: FieldMap,
}

/// Result of a traversal. The mapping is kept even when the traversal
/// failed part way through.
#[derive(Debug)]
pub struct Outcome {
    fields: FieldMap,
    failure: Option<Error>,
    close_failure: Option<Error>,
}

/// Fields read before a traversal failed
#[derive(Debug)]
pub struct Partial {
    pub fields: FieldMap,
    pub error: Error,
}

/// Normalize one document with a fresh session
pub fn parse<R: Read>(input: R, config: Config) -> Outcome {
    Normalizer::new(config).parse(input)
}

// A top-level field value once its shape is known
#[derive(Debug)]
enum FieldValue {
    Scalar(Scalar),
    Object(FlatMap),
    /// Map of the first object element, if the array started with one
    Array(Option<FlatMap>),
}

#[derive(Debug)]
enum Element {
    Object(FlatMap),
    Other,
    Skipped,
}

enum Root {
    Object,
    Other(&'static str),
}

impl Normalizer {
    pub fn new(config: Config) -> Self {
        Normalizer {
            config,
            fields: FieldMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parse<R: Read>(self, input: R) -> Outcome {
        let mut deserializer = reader::open(input);
        self.parse_with(&mut deserializer)
    }

    /// Traverse the next value of `deserializer`. Reading stops just past
    /// the closing brace of the root object, so a stream deserializer can
    /// go on with whatever follows.
    pub fn parse_with<'de, D>(mut self, deserializer: D) -> Outcome
    where
        D: Deserializer<'de, Error = serde_json::Error>,
    {
        debug!("starting traversal with {:?}", self.config);
        let failure = match self.traverse(deserializer) {
            Ok(()) => {
                debug!("normalized {} fields", self.fields.len());
                None
            }
            Err(e) => {
                warn!("traversal aborted after {} fields: {}", self.fields.len(), e);
                Some(e)
            }
        };

        Outcome::new(self.fields, failure)
    }

    fn traverse<'de, D>(&mut self, deserializer: D) -> Result<()>
    where
        D: Deserializer<'de, Error = serde_json::Error>,
    {
        match deserializer.deserialize_any(RootVisitor { session: self })? {
            Root::Object => Ok(()),
            Root::Other(found) => Err(Error::RootNotObject { found }),
        }
    }

    fn record(&mut self, name: &str, value: FieldValue) {
        match value {
            FieldValue::Scalar(scalar) => self.scalar_field(name, scalar),
            FieldValue::Object(children) => self.capture(name, children),
            FieldValue::Array(Some(children)) => self.capture(name, children),
            FieldValue::Array(None) => trace!("no leading object element in {:?}", name),
        }
    }

    fn scalar_field(&mut self, name: &str, scalar: Scalar) {
        let keep_text = self.config.policy.keeps_top_level_text();
        let value = match scalar {
            Scalar::Number(number) => Normalized::Number(number),
            Scalar::Text(text) if keep_text => Normalized::Text(text),
            Scalar::Boolean(value) if keep_text => Normalized::Boolean(value),
            Scalar::Text(_) | Scalar::Boolean(_) | Scalar::Null => {
                trace!("skipping scalar field {:?}", name);
                return;
            }
        };

        if !insert_first(&mut self.fields, name, Entry::Value(value)) {
            trace!("keeping first value of {:?}", name);
        }
    }

    fn capture(&mut self, name: &str, children: FlatMap) {
        if !self.config.diagnostic_mode {
            trace!("discarding {} flattened children of {:?}", children.len(), name);
            return;
        }

        if !insert_first(&mut self.fields, name, Entry::Flattened(children)) {
            trace!("keeping first flattened value of {:?}", name);
        }
    }
}

// Fields are recorded as they arrive so a later failure keeps them
struct RootVisitor<'a> {
    session: &'a mut Normalizer,
}

impl<'de, 'a> Visitor<'de> for RootVisitor<'a> {
    type Value = Root;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Root, A::Error>
    where
        A: MapAccess<'de>,
    {
        let session = self.session;
        let policy = session.config.policy;
        while let Some(name) = map.next_key::<String>()? {
            let value = map.next_value_seed(FieldSeed { policy })?;
            session.record(&name, value);
        }
        Ok(Root::Object)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Root, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Root::Other("an array"))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Root, E> {
        Ok(Root::Other("a boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Root, E> {
        Ok(Root::Other("a number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Root, E> {
        Ok(Root::Other("a number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Root, E> {
        Ok(Root::Other("a number"))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Root, E> {
        Ok(Root::Other("a string"))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Root, E> {
        Ok(Root::Other("null"))
    }
}

/// Classifies one top-level field value
#[derive(Clone, Copy)]
struct FieldSeed {
    policy: ClassificationPolicy,
}

impl<'de> DeserializeSeed<'de> for FieldSeed {
    type Value = FieldValue;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<FieldValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for FieldSeed {
    type Value = FieldValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a field value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Boolean(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Number(v.into())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Number(v.into())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Number(v.into())))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Text(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Text(v)))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<FieldValue, E> {
        Ok(FieldValue::Scalar(Scalar::Null))
    }

    // Children are materialized one at a time, never the whole object
    fn visit_map<A>(self, mut map: A) -> std::result::Result<FieldValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut children = FlatMap::new();
        while let Some(child) = map.next_key::<String>()? {
            let Tree(value) = map.next_value()?;
            flatten::flatten_child(&child, &value, self.policy, &mut children);
        }
        Ok(FieldValue::Object(children))
    }

    // Only a leading run of objects is flattened, and only the first of
    // them can be kept. The rest of the array is still read to its close.
    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<FieldValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut first = None;
        let mut leading = true;
        loop {
            let seed = ElementSeed {
                policy: self.policy,
                flatten: leading && first.is_none(),
            };
            match seq.next_element_seed(seed)? {
                None => break,
                Some(Element::Object(children)) => first = Some(children),
                Some(Element::Other) => leading = false,
                Some(Element::Skipped) => {}
            }
        }
        Ok(FieldValue::Array(first))
    }
}

/// Flattens an array element when `flatten` is set, otherwise only skips it
#[derive(Clone, Copy)]
struct ElementSeed {
    policy: ClassificationPolicy,
    flatten: bool,
}

impl<'de> DeserializeSeed<'de> for ElementSeed {
    type Value = Element;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Element, D::Error>
    where
        D: Deserializer<'de>,
    {
        if self.flatten {
            deserializer.deserialize_any(self)
        } else {
            IgnoredAny::deserialize(deserializer)?;
            Ok(Element::Skipped)
        }
    }
}

impl<'de> Visitor<'de> for ElementSeed {
    type Value = Element;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array element")
    }

    fn visit_map<A>(self, map: A) -> std::result::Result<Element, A::Error>
    where
        A: MapAccess<'de>,
    {
        let element = TreeVisitor.visit_map(map)?;
        Ok(Element::Object(flatten::flatten_object(&element, self.policy)))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Element, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Element::Other)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Element, E> {
        Ok(Element::Other)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Element, E> {
        Ok(Element::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Element, E> {
        Ok(Element::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Element, E> {
        Ok(Element::Other)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Element, E> {
        Ok(Element::Other)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Element, E> {
        Ok(Element::Other)
    }
}

impl Outcome {
    pub(crate) fn new(fields: FieldMap, failure: Option<Error>) -> Self {
        Outcome {
            fields,
            failure,
            close_failure: None,
        }
    }

    pub(crate) fn failed(error: Error) -> Self {
        Outcome::new(FieldMap::new(), Some(error))
    }

    pub(crate) fn set_close_failure(&mut self, error: Error) {
        self.close_failure = Some(error);
    }

    /// Whether the whole root object was traversed
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Error raised while releasing the input. It never replaces a
    /// traversal failure and does not affect the fields.
    pub fn close_failure(&self) -> Option<&Error> {
        self.close_failure.as_ref()
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    pub fn into_result(self) -> std::result::Result<FieldMap, Partial> {
        match self.failure {
            None => Ok(self.fields),
            Some(error) => Err(Partial {
                fields: self.fields,
                error,
            }),
        }
    }
}
