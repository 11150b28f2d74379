//! The script-engine capabilities the generator consumes.
//!
//! Engines answer black-box questions about a live object graph: enumerate own
//! keys, fetch a property, stringify a function. Property values come back
//! already sorted into the closed [`Value`] enum so the classifier can match
//! exhaustively instead of probing predicates.
pub mod boa;
pub mod instrument;
pub mod memory;

use serde::Serialize;

use crate::error::Result;

pub use self::boa::BoaSource;
pub use self::memory::MemoryGraph;

/// Identity of an object within one engine; equal ids mean the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(pub usize);

/// A property value as seen by the classifier.
#[derive(Debug, Clone)]
pub enum Value<O> {
    Function(O),
    String,
    Boolean,
    Number,
    /// `null` / `undefined`
    Nullish,
    Array,
    Object(O),
    /// Anything else the engine can hold (symbols, bigints, ...).
    Opaque,
}

impl<O> Value<O> {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Function(_) => "function",
            Value::String => "string",
            Value::Boolean => "boolean",
            Value::Number => "number",
            Value::Nullish => "nullish",
            Value::Array => "array",
            Value::Object(_) => "object",
            Value::Opaque => "opaque",
        }
    }
}

pub trait ObjectGraph {
    type Object: Clone;

    /// Own enumerable keys, in the object's enumeration order.
    fn own_keys(&mut self, object: &Self::Object) -> Result<Vec<String>>;

    fn property(&mut self, object: &Self::Object, key: &str) -> Result<Value<Self::Object>>;

    /// Source text of a function value (`Function.prototype.toString`).
    fn source_text(&mut self, function: &Self::Object) -> Result<String>;

    /// Parameter names when the engine knows them structurally.
    fn declared_params(&mut self, _function: &Self::Object) -> Option<Vec<String>> {
        None
    }

    fn identity(&mut self, object: &Self::Object) -> ObjectId;
}
