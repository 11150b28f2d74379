// Strongly-typed model of the generated binding. No engine values here.

use std::fmt;

use serde::Serialize;

use crate::sanitize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoType {
    String,
    Bool,
    Float64,
    Int,      // declarable return type only; never inferred from a value
    Any,      // interface{}
    AnySlice, // []interface{}, no element inference
}

impl GoType {
    pub fn as_go(self) -> &'static str {
        match self {
            GoType::String => "string",
            GoType::Bool => "bool",
            GoType::Float64 => "float64",
            GoType::Int => "int",
            GoType::Any => "interface{}",
            GoType::AnySlice => "[]interface{}",
        }
    }
}

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_go())
    }
}

/// A name/type pair: a method parameter or a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: GoType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: GoType) -> Self {
        Self { name: name.into(), ty }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, GoType::Any)
    }

    /// Escape a reserved word; see [`sanitize::sanitize_ident`].
    pub fn sanitized(&self) -> Variable {
        Variable {
            name: sanitize::sanitize_ident(&self.name),
            ty: self.ty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VarList(pub Vec<Variable>);

impl VarList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.0.iter()
    }

    /// New list, same order, every name escaped.
    pub fn sanitized(&self) -> VarList {
        VarList(self.0.iter().map(Variable::sanitized).collect())
    }

    /// `a interface{}, b string`
    pub fn list(&self) -> String {
        self.0
            .iter()
            .map(|v| format!("{} {}", v.name, v.ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `a, b`
    pub fn list_names(&self) -> String {
        self.0
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `interface{}, string`
    pub fn list_types(&self) -> String {
        self.0
            .iter()
            .map(|v| v.ty.as_go())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Vec<Variable>> for VarList {
    fn from(vars: Vec<Variable>) -> Self {
        VarList(vars)
    }
}

impl FromIterator<Variable> for VarList {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        VarList(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    /// The original dynamic key; runtime calls must use it verbatim.
    pub name: String,
    /// Name of the owning struct. `None` for constructors and free functions.
    pub owner: Option<String>,
    /// Decided once at discovery time, never re-derived from `name`.
    pub constructor: bool,
    pub params: VarList,
    #[serde(rename = "return")]
    pub ret: Option<GoType>,
}

impl Method {
    pub fn constructor(name: impl Into<String>, params: VarList) -> Self {
        Self {
            name: name.into(),
            owner: None,
            constructor: true,
            params,
            ret: None, // synthesized as `*Name` at render time
        }
    }

    pub fn instance(
        name: impl Into<String>,
        owner: impl Into<String>,
        params: VarList,
        ret: Option<GoType>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: Some(owner.into()),
            constructor: false,
            params,
            ret,
        }
    }

    /// Identifier used on the Go side. Capitalized names never collide
    /// with a keyword, so no escaping is needed.
    pub fn exported_name(&self) -> String {
        sanitize::capitalize(&self.name)
    }
}

/// One dynamic-object node: library root, sub-namespace, or prototype.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Struct {
    pub name: String,
    pub methods: Vec<Method>,
    pub fields: Vec<Variable>,
}

impl Struct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Structural contract. The classifier never produces one; hosts may.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub name: String,
    pub methods: Vec<Method>,
}

impl Interface {
    /// The contract `s` satisfies: its instance methods, in struct order.
    pub fn from_struct(name: impl Into<String>, s: &Struct) -> Self {
        Self {
            name: name.into(),
            methods: s.methods.iter().filter(|m| !m.constructor).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Interface(Interface),
    Struct(Struct),
    Method(Method),
}

impl Element {
    pub fn name(&self) -> &str {
        match self {
            Element::Interface(i) => &i.name,
            Element::Struct(s) => &s.name,
            Element::Method(m) => &m.name,
        }
    }
}

/// The named output unit. Append-only; element order is discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    pub name: String,
    elems: Vec<Element>,
}

impl Binding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elems: Vec::new(),
        }
    }

    pub fn add_element(&mut self, elem: Element) {
        self.elems.push(elem);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elems
    }

    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.elems.iter().filter_map(|e| match e {
            Element::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.elems.iter().filter_map(|e| match e {
            Element::Method(m) => Some(m),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> VarList {
        VarList::from(vec![
            Variable::any("a"),
            Variable::new("type", GoType::String),
            Variable::new("n", GoType::Float64),
        ])
    }

    #[test]
    fn list_renderings_keep_order() {
        let vl = params();
        assert_eq!(vl.list(), "a interface{}, type string, n float64");
        assert_eq!(vl.list_names(), "a, type, n");
        assert_eq!(vl.list_types(), "interface{}, string, float64");
    }

    #[test]
    fn empty_list_renders_empty() {
        let vl = VarList::new();
        assert_eq!(vl.list(), "");
        assert_eq!(vl.list_names(), "");
        assert_eq!(vl.list_types(), "");
    }

    #[test]
    fn sanitized_list_is_a_copy() {
        let vl = params();
        let clean = vl.sanitized();
        assert_eq!(clean.list_names(), "a, type_, n");
        assert_eq!(vl.list_names(), "a, type, n");
        assert_eq!(clean.sanitized(), clean);
    }

    #[test]
    fn interface_from_struct_keeps_method_order() {
        let mut s = Struct::new("Circle");
        s.methods.push(Method::instance("area", "Circle", VarList::new(), Some(GoType::Float64)));
        s.methods.push(Method::instance("grow", "Circle", params(), None));
        let i = Interface::from_struct("Shape", &s);
        assert_eq!(i.name, "Shape");
        let names: Vec<_> = i.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["area", "grow"]);
    }

    #[test]
    fn binding_is_append_only_in_discovery_order() {
        let mut b = Binding::new("lib");
        b.add_element(Element::Struct(Struct::new("B")));
        b.add_element(Element::Method(Method::constructor("A", VarList::new())));
        b.add_element(Element::Struct(Struct::new("A")));
        let names: Vec<_> = b.elements().iter().map(Element::name).collect();
        assert_eq!(names, ["B", "A", "A"]);
        assert_eq!(b.structs().count(), 2);
        assert_eq!(b.methods().count(), 1);
    }
}
