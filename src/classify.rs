//! Object-graph walk: dynamic properties in, binding elements out.
//!
//! Each visited object becomes one [`Struct`]. Constructors and instance
//! methods are appended to the binding the moment they are seen; a struct is
//! appended after all of its keys (and any nested objects they lead to) have
//! been walked. The graph is flattened into top-level elements; nesting never
//! survives into the output.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::engine::{ObjectGraph, ObjectId, Value};
use crate::error::Result;
use crate::ir::{Binding, Element, GoType, Method, Struct, Variable};
use crate::sanitize::{capitalize, starts_uppercase};
use crate::signature::extract_params;

/// The slot JS puts on every prototype. Constructors are synthesized from the
/// owning function instead.
pub const CONSTRUCTOR_SLOT: &str = "constructor";

/// What one property turns into.
#[derive(Debug, Clone)]
pub enum PropertyKind<O> {
    /// Function under an upper-case key: a type with its own prototype.
    Constructor(O),
    /// The `constructor` back-reference; skipped.
    ConstructorSlot,
    /// Function under a lower-case key: bound to the struct being built.
    Method(O),
    Field(GoType),
    /// Plain nested object: walked as its own struct.
    Namespace(O),
}

/// Single decision point for a `(key, value)` pair.
pub fn classify_property<O>(key: &str, value: Value<O>) -> PropertyKind<O> {
    match value {
        Value::Function(f) if starts_uppercase(key) => PropertyKind::Constructor(f),
        Value::Function(_) if key == CONSTRUCTOR_SLOT => PropertyKind::ConstructorSlot,
        Value::Function(f) => PropertyKind::Method(f),
        Value::String => PropertyKind::Field(GoType::String),
        Value::Boolean => PropertyKind::Field(GoType::Bool),
        Value::Number => PropertyKind::Field(GoType::Float64),
        Value::Nullish => PropertyKind::Field(GoType::Any),
        Value::Array => PropertyKind::Field(GoType::AnySlice),
        Value::Object(o) => PropertyKind::Namespace(o),
        Value::Opaque => PropertyKind::Field(GoType::Any),
    }
}

pub struct Classifier<'g, G: ObjectGraph> {
    graph: &'g mut G,
    /// Every object descended into so far. A revisit stops the descent, which
    /// keeps self-referential graphs finite.
    visited: HashSet<ObjectId>,
    /// Key each constructor function was first bound under.
    constructors: HashMap<ObjectId, String>,
}

impl<'g, G: ObjectGraph> Classifier<'g, G> {
    pub fn new(graph: &'g mut G) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
            constructors: HashMap::new(),
        }
    }

    /// Walk one named export into `binding`. May be called once per export;
    /// the cycle guard spans all calls on this classifier.
    pub fn classify(&mut self, binding: &mut Binding, name: &str, object: &G::Object) -> Result<()> {
        self.visit(binding, name, name, object)?;
        info!(
            export = name,
            elements = binding.elements().len(),
            "classified export"
        );
        Ok(())
    }

    fn enter(&mut self, object: &G::Object) -> bool {
        let id = self.graph.identity(object);
        self.visited.insert(id)
    }

    fn visit(&mut self, binding: &mut Binding, name: &str, path: &str, object: &G::Object) -> Result<()> {
        if !self.enter(object) {
            warn!(path, "object already visited; not descending again");
            return Ok(());
        }

        let struct_name = capitalize(name);
        let mut node = Struct::new(struct_name.as_str());

        let keys = self.graph.own_keys(object).map_err(|e| e.at(path))?;
        for key in keys {
            let value = self.graph.property(object, &key).map_err(|e| e.at(path))?;
            debug!(path, key = %key, kind = value.kind(), "property");
            let child_path = format!("{path}.{key}");

            match classify_property(&key, value) {
                PropertyKind::Constructor(function) => {
                    self.constructor(binding, &key, &child_path, &function)?;
                }
                PropertyKind::ConstructorSlot => {}
                PropertyKind::Method(function) => {
                    let params = extract_params(self.graph, &function).map_err(|e| e.at(&child_path))?;
                    // Nothing short of calling the function reveals its result.
                    let method = Method::instance(key, struct_name.as_str(), params, Some(GoType::Any));
                    node.methods.push(method.clone());
                    binding.add_element(Element::Method(method));
                }
                PropertyKind::Field(ty) => node.fields.push(Variable::new(key, ty)),
                PropertyKind::Namespace(child) => {
                    self.visit(binding, &key, &child_path, &child)?;
                }
            }
        }

        debug!(
            path,
            fields = node.fields.len(),
            methods = node.methods.len(),
            "struct {}",
            node.name
        );
        binding.add_element(Element::Struct(node));
        Ok(())
    }

    fn constructor(&mut self, binding: &mut Binding, key: &str, path: &str, function: &G::Object) -> Result<()> {
        let id = self.graph.identity(function);
        if !self.visited.insert(id) {
            // An alias such as `lib.Vec = lib.Vector` gets no second `New` function.
            let bound_as = self.constructors.get(&id).map_or("<unknown>", String::as_str);
            debug!(path, alias = key, bound_as, "constructor already bound; skipping alias");
            return Ok(());
        }
        self.constructors.insert(id, key.to_string());

        let params = extract_params(self.graph, function).map_err(|e| e.at(path))?;
        binding.add_element(Element::Method(Method::constructor(key, params)));

        let proto_path = format!("{path}.prototype");
        let proto = match self.graph.property(function, "prototype").map_err(|e| e.at(path))? {
            Value::Object(proto) => Some(proto),
            other => {
                debug!(path = %proto_path, kind = other.kind(), "prototype is not an object");
                None
            }
        };

        match proto {
            Some(proto) if !self.is_visited(&proto) => self.visit(binding, key, &proto_path, &proto),
            _ => {
                // Shared or missing prototype: still give `New<key>` a type to return.
                debug!(path = %proto_path, "prototype not walked; emitting empty struct");
                binding.add_element(Element::Struct(Struct::new(key)));
                Ok(())
            }
        }
    }

    fn is_visited(&mut self, object: &G::Object) -> bool {
        let id = self.graph.identity(object);
        self.visited.contains(&id)
    }
}
