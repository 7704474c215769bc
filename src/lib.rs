//! Streaming normalization of the top-level fields of a JSON object
//!
//! ```
//! use jflat::{Config, Entry, Normalized};
//!
//! let input = r#"{"a": 1, "b": {"x": "foo", "y": ["p", "q"]}}"#;
//! let outcome = jflat::parse(input.as_bytes(), Config::new().with_diagnostic_mode(true));
//!
//! assert!(outcome.is_complete());
//! assert_eq!(outcome.len(), 2);
//! match outcome.get("b") {
//!     Some(Entry::Flattened(b)) => assert_eq!(b["x"], Normalized::Text("foo".into())),
//!     other => panic!("unexpected entry {:?}", other),
//! }
//! ```

pub mod config;
pub mod error;
pub mod flatten;
pub mod normalize;
pub mod reader;
pub mod source;
pub mod value;

pub use config::{ClassificationPolicy, Config};
pub use error::{Error, Result};
pub use normalize::{parse, Normalizer, Outcome, Partial};
pub use reader::{open, Scalar, Tree};
pub use source::{parse_path, parse_source, Source};
pub use value::{sorted_object, Entry, FieldMap, FlatMap, Normalized};
