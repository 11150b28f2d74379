//! JavaScript evaluation through the `boa_engine` interpreter.

use std::collections::HashMap;
use std::path::Path;

use boa_engine::builtins::typed_array::TypedArray;
use boa_engine::{Context, JsObject, JsString, JsValue, Source};
use tracing::debug;

use super::instrument::{self, SIGNATURES, TAG_HELPERS};
use super::{ObjectGraph, ObjectId, Value};
use crate::error::{BindError, Result};

/// Evaluated before any library so browser/worker-style code that reads
/// `self` can load.
const PRELUDE: &str = "var self = {};";

pub struct BoaSource {
    context: Context,
    /// Objects handed an [`ObjectId`]; `JsObject` hashes by pointer.
    ids: HashMap<JsObject, ObjectId>,
    /// Parameter names by tag, across every script run so far.
    signatures: Vec<Vec<String>>,
    /// The `WeakMap` tagged functions are recorded in, and its `get`.
    tags: JsObject,
    tags_get: JsObject,
}

impl BoaSource {
    pub fn new() -> Result<Self> {
        let mut context = Context::default();
        context
            .eval(Source::from_bytes(TAG_HELPERS))
            .map_err(|err| BindError::Evaluate(err.to_string()))?;
        let (tags, tags_get) = signature_map(&mut context)?;

        let mut source = Self {
            context,
            ids: HashMap::new(),
            signatures: Vec::new(),
            tags,
            tags_get,
        };
        source.run(PRELUDE)?;
        Ok(source)
    }

    /// Evaluate `code` with its functions tagged, so their parameter names
    /// survive into [`ObjectGraph::declared_params`].
    pub fn run(&mut self, code: &str) -> Result<()> {
        let instrumented = instrument::instrument(code, self.signatures.len());
        self.signatures.extend(instrumented.signatures);
        self.context
            .eval(Source::from_bytes(&instrumented.code))
            .map(|_| ())
            .map_err(|err| BindError::Evaluate(err.to_string()))
    }

    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        let code = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = code.len(), "evaluating script");
        self.run(&code)
    }

    /// A top-level binding created by the evaluated scripts.
    pub fn lookup(&mut self, name: &str) -> Result<JsObject> {
        let global = self.context.global_object();
        let value = global
            .get(JsString::from(name), &mut self.context)
            .map_err(|err| BindError::Lookup {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        if value.is_undefined() {
            return Err(BindError::Lookup {
                name: name.to_string(),
                reason: "not defined".to_string(),
            });
        }
        value.as_object().cloned().ok_or_else(|| BindError::Lookup {
            name: name.to_string(),
            reason: format!("is {}, not an object", classify_value(&value).kind()),
        })
    }

    fn object_keys(&mut self, object: &JsObject) -> std::result::Result<Vec<String>, String> {
        let ctx = &mut self.context;
        let object_ctor = ctx
            .global_object()
            .get(JsString::from("Object"), ctx)
            .map_err(|e| e.to_string())?;
        let keys_fn = object_ctor
            .as_object()
            .ok_or("global `Object` is missing")?
            .get(JsString::from("keys"), ctx)
            .map_err(|e| e.to_string())?;
        let keys_fn = keys_fn.as_callable().ok_or("`Object.keys` is not callable")?;

        let array = keys_fn
            .call(&JsValue::undefined(), &[JsValue::from(object.clone())], ctx)
            .map_err(|e| e.to_string())?;
        let array = array.as_object().ok_or("`Object.keys` returned a non-object")?;

        let len = array
            .get(JsString::from("length"), ctx)
            .and_then(|len| len.to_u32(ctx))
            .map_err(|e| e.to_string())?;

        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            let key = array
                .get(i, ctx)
                .and_then(|k| k.to_string(ctx))
                .map_err(|e| e.to_string())?;
            keys.push(key.to_std_string_escaped());
        }
        Ok(keys)
    }
}

fn signature_map(context: &mut Context) -> Result<(JsObject, JsObject)> {
    let missing = |what: &str| BindError::Evaluate(format!("tagging helpers are missing {what}"));
    let tags = context
        .global_object()
        .get(JsString::from(SIGNATURES), context)
        .map_err(|err| BindError::Evaluate(err.to_string()))?;
    let tags = tags.as_object().cloned().ok_or_else(|| missing(SIGNATURES))?;
    let get = tags
        .get(JsString::from("get"), context)
        .map_err(|err| BindError::Evaluate(err.to_string()))?;
    let get = get.as_callable().cloned().ok_or_else(|| missing("WeakMap.prototype.get"))?;
    Ok((tags, get))
}

fn classify_value(value: &JsValue) -> Value<JsObject> {
    if let Some(function) = value.as_callable() {
        return Value::Function(function.clone());
    }
    if value.is_string() {
        Value::String
    } else if value.is_boolean() {
        Value::Boolean
    } else if value.is_number() {
        Value::Number
    } else if value.is_null() || value.is_undefined() {
        Value::Nullish
    } else if let Some(object) = value.as_object() {
        // Typed arrays are array-like for binding purposes.
        if object.is_array() || object.is::<TypedArray>() {
            Value::Array
        } else {
            Value::Object(object.clone())
        }
    } else {
        Value::Opaque
    }
}

impl ObjectGraph for BoaSource {
    type Object = JsObject;

    fn own_keys(&mut self, object: &JsObject) -> Result<Vec<String>> {
        self.object_keys(object).map_err(|reason| BindError::Keys {
            object: "<object>".to_string(),
            reason,
        })
    }

    fn property(&mut self, object: &JsObject, key: &str) -> Result<Value<JsObject>> {
        let value = object
            .get(JsString::from(key), &mut self.context)
            .map_err(|err| BindError::Property {
                object: "<object>".to_string(),
                key: key.to_string(),
                reason: err.to_string(),
            })?;
        Ok(classify_value(&value))
    }

    fn source_text(&mut self, function: &JsObject) -> Result<String> {
        JsValue::from(function.clone())
            .to_string(&mut self.context)
            .map(|s| s.to_std_string_escaped())
            .map_err(|err| BindError::SourceText {
                function: "<function>".to_string(),
                reason: err.to_string(),
            })
    }

    /// Parameter names recorded when the function's script was instrumented.
    /// Functions created outside instrumented code (`new Function`, `eval`,
    /// builtins) have none.
    fn declared_params(&mut self, function: &JsObject) -> Option<Vec<String>> {
        let tag = self
            .tags_get
            .call(
                &JsValue::from(self.tags.clone()),
                &[JsValue::from(function.clone())],
                &mut self.context,
            )
            .ok()?;
        let tag = tag.as_number()?;
        self.signatures.get(tag as usize).cloned()
    }

    fn identity(&mut self, object: &JsObject) -> ObjectId {
        let next = ObjectId(self.ids.len());
        *self.ids.entry(object.clone()).or_insert(next)
    }
}
