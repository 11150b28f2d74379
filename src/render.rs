//! Go declaration text for each binding element.
//!
//! Output targets GopherJS: structs embed `*js.Object` and tag every field
//! with its original JS key, methods forward to `(*js.Object).Call`.

use crate::error::{BindError, Result};
use crate::ir::{Element, GoType, Interface, Method, Struct};
use crate::sanitize;

pub const CONSTRUCTOR_PREFIX: &str = "New";

impl Element {
    pub fn text(&self) -> Result<Vec<String>> {
        match self {
            Element::Interface(i) => Ok(interface_text(i)),
            Element::Struct(s) => Ok(struct_text(s)),
            Element::Method(m) => method_text(m),
        }
    }
}

pub fn struct_text(s: &Struct) -> Vec<String> {
    let mut lines = Vec::with_capacity(s.fields.len() + 3);
    lines.push(format!("type {} struct {{", s.name));
    lines.push("\t*js.Object".to_string());
    for field in &s.fields {
        lines.push(format!(
            "\t{} {} `js:\"{}\"`",
            sanitize::exported(&field.name),
            field.ty,
            field.name,
        ));
    }
    lines.push("}".to_string());
    lines
}

pub fn interface_text(i: &Interface) -> Vec<String> {
    let mut lines = vec![format!("type {} interface {{", i.name)];
    for method in &i.methods {
        lines.push(format!(
            "\t{}({}){}",
            method.exported_name(),
            method.params.sanitized().list_types(),
            return_suffix(method.ret),
        ));
    }
    lines.push("}".to_string());
    lines
}

pub fn method_text(m: &Method) -> Result<Vec<String>> {
    if m.constructor {
        return Ok(constructor_text(m));
    }

    let params = m.params.sanitized();
    let (header, target) = match &m.owner {
        Some(owner) => (format!("func (self *{owner}) "), "self"),
        None => ("func ".to_string(), "js.Global"),
    };

    let mut lines = vec![format!(
        "{header}{}({}){} {{",
        m.exported_name(),
        params.list(),
        return_suffix(m.ret),
    )];

    let invocation = call_expr(target, "Call", &m.name, &params.list_names());
    match m.ret {
        None => lines.push(format!("\t{invocation}")),
        Some(ty) => {
            let cast = cast_object(&invocation, ty).ok_or_else(|| BindError::UnsupportedReturn {
                method: m.name.clone(),
                found: ty,
            })?;
            lines.push(format!("\treturn {cast}"));
        }
    }
    lines.push("}".to_string());
    Ok(lines)
}

fn constructor_text(m: &Method) -> Vec<String> {
    let params = m.params.sanitized();
    let construct = format!(
        "{}.New({})",
        call_expr("js.Global", "Get", &m.name, ""),
        params.list_names()
    );
    vec![
        format!(
            "func {CONSTRUCTOR_PREFIX}{}({}) *{} {{",
            m.name,
            params.list(),
            m.name
        ),
        format!("\treturn &{}{{Object: {construct}}}", m.name),
        "}".to_string(),
    ]
}

/// `target.op("key", args)`; the key is the original dynamic name.
fn call_expr(target: &str, op: &str, key: &str, args: &str) -> String {
    let key = go_string(key);
    if args.is_empty() {
        format!("{target}.{op}({key})")
    } else {
        format!("{target}.{op}({key}, {args})")
    }
}

/// JSON string escapes are a subset of Go's interpreted string literals.
fn go_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Convert a `*js.Object` expression into `ty`, when GopherJS can.
pub fn cast_object(obj: &str, ty: GoType) -> Option<String> {
    let accessor = match ty {
        GoType::String => ".String()",
        GoType::Float64 => ".Float()",
        GoType::Int => ".Int()",
        GoType::Any => ".Interface()",
        GoType::Bool | GoType::AnySlice => return None,
    };
    Some(format!("{obj}{accessor}"))
}

fn return_suffix(ret: Option<GoType>) -> String {
    ret.map(|ty| format!(" {ty}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{VarList, Variable};

    fn params(names: &[&str]) -> VarList {
        names.iter().copied().map(Variable::any).collect()
    }

    #[test]
    fn struct_fields_keep_the_original_key() {
        let mut s = Struct::new("Lib");
        s.fields.push(Variable::new("class", GoType::String));
        s.fields.push(Variable::new("count", GoType::Float64));
        s.fields.push(Variable::new("items", GoType::AnySlice));
        assert_eq!(
            struct_text(&s),
            [
                "type Lib struct {",
                "\t*js.Object",
                "\tClass_ string `js:\"class\"`",
                "\tCount float64 `js:\"count\"`",
                "\tItems []interface{} `js:\"items\"`",
                "}",
            ]
        );
    }

    #[test]
    fn constructor_builds_a_new_instance() {
        let m = Method::constructor("Foo", params(&["x", "type"]));
        assert_eq!(
            method_text(&m).unwrap(),
            [
                "func NewFoo(x interface{}, type_ interface{}) *Foo {",
                "\treturn &Foo{Object: js.Global.Get(\"Foo\").New(x, type_)}",
                "}",
            ]
        );
    }

    #[test]
    fn constructor_without_params() {
        let m = Method::constructor("Empty", VarList::new());
        assert_eq!(
            method_text(&m).unwrap()[..2],
            [
                "func NewEmpty() *Empty {",
                "\treturn &Empty{Object: js.Global.Get(\"Empty\").New()}",
            ]
        );
    }

    #[test]
    fn instance_method_calls_by_original_name() {
        let m = Method::instance("draw", "Canvas", params(&["ctx", "range"]), Some(GoType::Any));
        assert_eq!(
            method_text(&m).unwrap(),
            [
                "func (self *Canvas) Draw(ctx interface{}, range_ interface{}) interface{} {",
                "\treturn self.Call(\"draw\", ctx, range_).Interface()",
                "}",
            ]
        );
    }

    #[test]
    fn string_return_uses_string_accessor() {
        let m = Method::instance("name", "User", VarList::new(), Some(GoType::String));
        let lines = method_text(&m).unwrap();
        assert_eq!(lines[0], "func (self *User) Name() string {");
        assert_eq!(lines[1], "\treturn self.Call(\"name\").String()");
    }

    #[test]
    fn numeric_returns_use_numeric_accessors() {
        let f = Method::instance("len", "V", VarList::new(), Some(GoType::Float64));
        let i = Method::instance("idx", "V", VarList::new(), Some(GoType::Int));
        assert!(method_text(&f).unwrap()[1].ends_with(".Float()"));
        assert!(method_text(&i).unwrap()[1].ends_with(".Int()"));
    }

    #[test]
    fn no_return_is_a_bare_call() {
        let m = Method::instance("reset", "Game", VarList::new(), None);
        assert_eq!(
            method_text(&m).unwrap(),
            ["func (self *Game) Reset() {", "\tself.Call(\"reset\")", "}"]
        );
    }

    #[test]
    fn unsupported_return_is_an_error() {
        let m = Method::instance("ok", "Game", VarList::new(), Some(GoType::Bool));
        match method_text(&m) {
            Err(BindError::UnsupportedReturn { method, found }) => {
                assert_eq!(method, "ok");
                assert_eq!(found, GoType::Bool);
            }
            other => panic!("expected UnsupportedReturn, got {other:?}"),
        }
    }

    #[test]
    fn free_function_calls_the_global() {
        let m = Method {
            name: "parse".to_string(),
            owner: None,
            constructor: false,
            params: params(&["text"]),
            ret: Some(GoType::Any),
        };
        assert_eq!(
            method_text(&m).unwrap(),
            [
                "func Parse(text interface{}) interface{} {",
                "\treturn js.Global.Call(\"parse\", text).Interface()",
                "}",
            ]
        );
    }

    #[test]
    fn interface_lists_types_only() {
        let i = Interface {
            name: "Shape".to_string(),
            methods: vec![
                Method::instance("area", "Shape", VarList::new(), Some(GoType::Float64)),
                Method::instance("scale", "Shape", params(&["type"]), None),
            ],
        };
        assert_eq!(
            interface_text(&i),
            [
                "type Shape interface {",
                "\tArea() float64",
                "\tScale(interface{})",
                "}",
            ]
        );
    }

    #[test]
    fn odd_keys_are_quoted_for_go() {
        let m = Method::instance("say\"hi", "X", VarList::new(), None);
        assert_eq!(method_text(&m).unwrap()[1], "\tself.Call(\"say\\\"hi\")");
    }

    #[test]
    fn element_text_dispatches() {
        let e = Element::Struct(Struct::new("X"));
        assert_eq!(e.text().unwrap(), ["type X struct {", "\t*js.Object", "}"]);
    }
}
