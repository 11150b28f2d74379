//! An object graph held entirely in Rust.
//!
//! Useful for hosts that already have a dynamic model in hand (or JSON data)
//! and for exercising the classifier without an interpreter.

use indexmap::IndexMap;
use serde_json::Value as Json;

use super::{ObjectGraph, ObjectId, Value};
use crate::error::{BindError, Result};

#[derive(Debug, Clone)]
pub enum Prop {
    String(String),
    Boolean(bool),
    Number(f64),
    Null,
    Array(usize),
    Object(ObjectId),
    Function(ObjectId),
    Opaque,
    /// Reading this property fails, like a throwing getter.
    Unreadable(String),
}

#[derive(Debug, Clone, Default)]
struct Node {
    props: IndexMap<String, Prop>,
    function: Option<FunctionNode>,
}

#[derive(Debug, Clone)]
struct FunctionNode {
    source: String,
    params: Option<Vec<String>>,
    prototype: ObjectId,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    nodes: Vec<Node>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&mut self) -> ObjectId {
        self.nodes.push(Node::default());
        ObjectId(self.nodes.len() - 1)
    }

    /// A function value with its own (initially empty) `prototype` object.
    pub fn function(&mut self, source: impl Into<String>) -> ObjectId {
        let prototype = self.object();
        self.nodes.push(Node {
            props: IndexMap::new(),
            function: Some(FunctionNode {
                source: source.into(),
                params: None,
                prototype,
            }),
        });
        ObjectId(self.nodes.len() - 1)
    }

    /// A function whose parameter names are known without parsing its source.
    pub fn function_with_params<I, S>(&mut self, source: impl Into<String>, params: I) -> ObjectId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.function(source);
        if let Some(f) = self.nodes[id.0].function.as_mut() {
            f.params = Some(params.into_iter().map(Into::into).collect());
        }
        id
    }

    pub fn prototype_of(&self, function: ObjectId) -> Option<ObjectId> {
        self.nodes
            .get(function.0)
            .and_then(|n| n.function.as_ref())
            .map(|f| f.prototype)
    }

    /// Point `function.prototype` at another object, e.g. a shared one.
    pub fn set_prototype(&mut self, function: ObjectId, prototype: ObjectId) -> &mut Self {
        if let Some(f) = self.nodes[function.0].function.as_mut() {
            f.prototype = prototype;
        }
        self
    }

    pub fn set(&mut self, object: ObjectId, key: impl Into<String>, prop: Prop) -> &mut Self {
        self.nodes[object.0].props.insert(key.into(), prop);
        self
    }

    /// Build objects mirroring a JSON document; key order is preserved.
    /// Returns the id of the root, which must be a JSON object.
    pub fn from_json(&mut self, json: &Json) -> Option<ObjectId> {
        match self.json_prop(json) {
            Prop::Object(id) => Some(id),
            _ => None,
        }
    }

    fn json_prop(&mut self, json: &Json) -> Prop {
        match json {
            Json::Null => Prop::Null,
            Json::Bool(b) => Prop::Boolean(*b),
            Json::Number(n) => Prop::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Prop::String(s.clone()),
            Json::Array(xs) => Prop::Array(xs.len()),
            Json::Object(map) => {
                let id = self.object();
                for (k, v) in map {
                    let prop = self.json_prop(v);
                    self.set(id, k.clone(), prop);
                }
                Prop::Object(id)
            }
        }
    }

    fn node(&self, id: ObjectId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or_else(|| BindError::Keys {
            object: format!("#{}", id.0),
            reason: "no such object".to_string(),
        })
    }
}

impl ObjectGraph for MemoryGraph {
    type Object = ObjectId;

    fn own_keys(&mut self, object: &ObjectId) -> Result<Vec<String>> {
        Ok(self.node(*object)?.props.keys().cloned().collect())
    }

    fn property(&mut self, object: &ObjectId, key: &str) -> Result<Value<ObjectId>> {
        let node = self.node(*object)?;
        if key == "prototype" {
            if let Some(f) = &node.function {
                return Ok(Value::Object(f.prototype));
            }
        }
        let prop = node.props.get(key).ok_or_else(|| BindError::Property {
            object: format!("#{}", object.0),
            key: key.to_string(),
            reason: "no such property".to_string(),
        })?;
        Ok(match prop {
            Prop::String(_) => Value::String,
            Prop::Boolean(_) => Value::Boolean,
            Prop::Number(_) => Value::Number,
            Prop::Null => Value::Nullish,
            Prop::Array(_) => Value::Array,
            Prop::Object(id) => Value::Object(*id),
            Prop::Function(id) => Value::Function(*id),
            Prop::Opaque => Value::Opaque,
            Prop::Unreadable(reason) => {
                return Err(BindError::Property {
                    object: format!("#{}", object.0),
                    key: key.to_string(),
                    reason: reason.clone(),
                })
            }
        })
    }

    fn source_text(&mut self, function: &ObjectId) -> Result<String> {
        self.node(*function)?
            .function
            .as_ref()
            .map(|f| f.source.clone())
            .ok_or_else(|| BindError::SourceText {
                function: format!("#{}", function.0),
                reason: "not a function".to_string(),
            })
    }

    fn declared_params(&mut self, function: &ObjectId) -> Option<Vec<String>> {
        self.nodes
            .get(function.0)?
            .function
            .as_ref()?
            .params
            .clone()
    }

    fn identity(&mut self, object: &ObjectId) -> ObjectId {
        *object
    }
}
