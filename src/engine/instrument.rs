//! Script rewriting that lets the interpreter report parameter names.
//!
//! The interpreter keeps no source text for compiled functions, so
//! `Function.prototype.toString` never shows a parameter list. Before a script
//! runs it is parsed with tree-sitter, and every function it defines is routed
//! through [`TAG_FN`] together with the index of its parameter list. The
//! engine later reads that index back out of a `WeakMap`.
//!
//! Tagging forms:
//! - function, generator, arrow and class *expressions* are wrapped in place:
//!   `(__jsbind_tag(<expr>, N))`
//! - function declarations are registered at the top of their block, after
//!   any directive prologue, where hoisting has already bound them
//! - class declarations are registered right after the declaration
//! - object literals with method shorthand are wrapped in
//!   `(__jsbind_methods({...}, {"m": N}))`

use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

pub const TAG_FN: &str = "__jsbind_tag";
pub const TAG_METHODS_FN: &str = "__jsbind_methods";
/// Global `WeakMap` from function object to tag.
pub const SIGNATURES: &str = "__jsbind_signatures";

/// Evaluated once per engine, before any instrumented script.
pub const TAG_HELPERS: &str = r#"
var __jsbind_signatures = new WeakMap();
function __jsbind_tag(f, tag) {
    if (typeof f === "function") __jsbind_signatures.set(f, tag);
    return f;
}
function __jsbind_methods(o, tags) {
    var keys = Object.keys(tags);
    for (var i = 0; i < keys.length; i++) __jsbind_tag(o[keys[i]], tags[keys[i]]);
    return o;
}
"#;

/// A rewritten script and the parameter lists its tags refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instrumented {
    pub code: String,
    /// Parameter names for tags `first_tag..first_tag + len`.
    pub signatures: Vec<Vec<String>>,
}

impl Instrumented {
    fn untouched(code: &str) -> Self {
        Self {
            code: code.to_string(),
            signatures: Vec::new(),
        }
    }
}

/// Rewrite `code` so each function it defines is tagged, numbering tags from
/// `first_tag`. Scripts tree-sitter cannot parse cleanly are returned as-is
/// and the interpreter gets to report the problem.
pub fn instrument(code: &str, first_tag: usize) -> Instrumented {
    let mut parser = Parser::new();
    if let Err(err) = parser.set_language(&tree_sitter_javascript::LANGUAGE.into()) {
        warn!(error = %err, "javascript grammar unavailable; parameter names will be lost");
        return Instrumented::untouched(code);
    }
    let Some(tree) = parser.parse(code, None) else {
        warn!("tree-sitter gave up on the script; parameter names will be lost");
        return Instrumented::untouched(code);
    };
    let root = tree.root_node();
    if root.has_error() {
        debug!("script has syntax errors; evaluating it unmodified");
        return Instrumented::untouched(code);
    }

    let mut rewriter = Rewriter::new(code, first_tag);
    rewriter.walk(root);
    let instrumented = rewriter.finish();
    debug!(
        functions = instrumented.signatures.len(),
        bytes = instrumented.code.len(),
        "instrumented script"
    );
    instrumented
}

// ————————————————————————————————————————————————————————————————————————————
// REWRITER
// ————————————————————————————————————————————————————————————————————————————

/// Ordering of insertions that share an offset: closers before statements
/// before openers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EditKind {
    Close,
    Statement,
    Open,
}

#[derive(Debug)]
struct Edit {
    at: usize,
    kind: EditKind,
    /// Tie-break within one kind: inner closers first, outer openers first,
    /// statements in discovery order.
    rank: usize,
    text: String,
}

struct Rewriter<'s> {
    source: &'s str,
    first_tag: usize,
    signatures: Vec<Vec<String>>,
    edits: Vec<Edit>,
}

impl<'s> Rewriter<'s> {
    fn new(source: &'s str, first_tag: usize) -> Self {
        Self {
            source,
            first_tag,
            signatures: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// Pre-order walk, so tags follow source order.
    fn walk(&mut self, root: Node<'_>) {
        let mut cursor = root.walk();
        loop {
            self.visit(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        // Keyword tokens share kind names with the nodes they start.
        if !node.is_named() {
            return;
        }
        match node.kind() {
            "function_expression" | "generator_function" | "arrow_function" => {
                let tag = self.tag(self.function_params(node));
                self.wrap(node, TAG_FN, tag.to_string());
            }
            "class" => {
                let tag = self.tag(self.constructor_params(node));
                self.wrap(node, TAG_FN, tag.to_string());
            }
            "function_declaration" | "generator_function_declaration" => {
                let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
                    return;
                };
                match self.registration_point(node) {
                    Some(at) => {
                        let tag = self.tag(self.function_params(node));
                        self.register(at, name, tag);
                    }
                    None => debug!(function = name, "declaration outside a block; not tagged"),
                }
            }
            "class_declaration" => {
                let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
                    return;
                };
                if self.registration_point(node).is_some() {
                    let tag = self.tag(self.constructor_params(node));
                    self.register(node.end_byte(), name, tag);
                }
            }
            "object" => self.object_methods(node),
            _ => {}
        }
    }

    fn object_methods(&mut self, object: Node<'_>) {
        let mut entries = Vec::new();
        let mut cursor = object.walk();
        for member in object.named_children(&mut cursor) {
            if member.kind() != "method_definition" || is_accessor(member) {
                continue;
            }
            let Some(name) = member.child_by_field_name("name") else {
                continue;
            };
            if name.kind() != "property_identifier" {
                continue;
            }
            let key = self.text(name);
            let tag = self.tag(self.function_params(member));
            entries.push(format!("{}: {tag}", quoted(key)));
        }
        if !entries.is_empty() {
            self.wrap(object, TAG_METHODS_FN, format!("{{{}}}", entries.join(", ")));
        }
    }

    fn tag(&mut self, params: Vec<String>) -> usize {
        self.signatures.push(params);
        self.first_tag + self.signatures.len() - 1
    }

    fn wrap(&mut self, node: Node<'_>, helper: &str, argument: String) {
        self.edits.push(Edit {
            at: node.start_byte(),
            kind: EditKind::Open,
            rank: usize::MAX - node.end_byte(),
            text: format!("({helper}("),
        });
        self.edits.push(Edit {
            at: node.end_byte(),
            kind: EditKind::Close,
            rank: usize::MAX - node.start_byte(),
            text: format!(", {argument}))"),
        });
    }

    fn register(&mut self, at: usize, name: &str, tag: usize) {
        let rank = self.edits.len();
        self.edits.push(Edit {
            at,
            kind: EditKind::Statement,
            rank,
            text: format!(";{TAG_FN}({name}, {tag});"),
        });
    }

    /// Where a declaration's registration statement goes: the start of its
    /// block (after the directive prologue), or just before it in a `case`.
    fn registration_point(&self, declaration: Node<'_>) -> Option<usize> {
        let parent = declaration.parent()?;
        match parent.kind() {
            "program" => Some(self.prologue_end(parent, parent.start_byte())),
            "statement_block" | "class_static_block" => {
                Some(self.prologue_end(parent, parent.start_byte() + 1))
            }
            "switch_case" | "switch_default" => Some(declaration.start_byte()),
            _ => None,
        }
    }

    fn prologue_end(&self, block: Node<'_>, start: usize) -> usize {
        let mut at = start;
        let mut last = None;
        let mut cursor = block.walk();
        for child in block.named_children(&mut cursor) {
            let skip = match child.kind() {
                "comment" | "hash_bang_line" => true,
                "expression_statement" => is_directive(child),
                _ => false,
            };
            if !skip {
                break;
            }
            at = child.end_byte();
            last = Some(child);
        }
        // Line comments run to the newline; insert on the next line.
        let ends_in_line_comment = last
            .map(|n| self.text(n))
            .is_some_and(|text| text.starts_with("//") || text.starts_with("#!"));
        if ends_in_line_comment {
            at = self.source[at..]
                .find('\n')
                .map_or(self.source.len(), |i| at + i + 1);
        }
        at
    }

    fn function_params(&self, function: Node<'_>) -> Vec<String> {
        if let Some(single) = function.child_by_field_name("parameter") {
            return vec![self.text(single).to_string()];
        }
        function
            .child_by_field_name("parameters")
            .map(|list| self.formal_params(list))
            .unwrap_or_default()
    }

    fn constructor_params(&self, class: Node<'_>) -> Vec<String> {
        let Some(body) = class.child_by_field_name("body") else {
            return Vec::new();
        };
        let mut cursor = body.walk();
        let constructor = body.named_children(&mut cursor).find(|member| {
            member.kind() == "method_definition"
                && member
                    .child_by_field_name("name")
                    .is_some_and(|name| self.text(name) == "constructor")
        });
        constructor
            .map(|c| self.function_params(c))
            .unwrap_or_default()
    }

    /// Identifier parameters keep their name; destructuring patterns become
    /// `argN` by position.
    fn formal_params(&self, list: Node<'_>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            let position = names.len();
            let name = match param.kind() {
                "comment" => continue,
                "identifier" => Some(param),
                "assignment_pattern" => param
                    .child_by_field_name("left")
                    .filter(|left| left.kind() == "identifier"),
                "rest_pattern" => param
                    .named_child(0)
                    .filter(|inner| inner.kind() == "identifier"),
                _ => None,
            };
            names.push(match name {
                Some(ident) => self.text(ident).to_string(),
                None => format!("arg{position}"),
            });
        }
        names
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn finish(mut self) -> Instrumented {
        self.edits.sort_by_key(|edit| (edit.at, edit.kind, edit.rank));

        let extra: usize = self.edits.iter().map(|e| e.text.len()).sum();
        let mut code = String::with_capacity(self.source.len() + extra);
        let mut copied = 0;
        for edit in &self.edits {
            code.push_str(&self.source[copied..edit.at]);
            code.push_str(&edit.text);
            copied = edit.at;
        }
        code.push_str(&self.source[copied..]);

        Instrumented {
            code,
            signatures: self.signatures,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn is_directive(statement: Node<'_>) -> bool {
    statement.named_child(0).is_some_and(|c| c.kind() == "string")
}

/// `get x() {}` / `set x(v) {}`; a method merely *named* `get` has no
/// separate keyword token.
fn is_accessor(method: Node<'_>) -> bool {
    let mut cursor = method.walk();
    let accessor = method
        .children(&mut cursor)
        .any(|c| !c.is_named() && matches!(c.kind(), "get" | "set"));
    accessor
}

fn quoted(key: &str) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| format!("\"{key}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str) -> Instrumented {
        instrument(code, 0)
    }

    #[test]
    fn function_expressions_are_wrapped_in_place() {
        let out = run("var lib = { Point: function (x, y) {} };");
        assert_eq!(
            out.code,
            "var lib = { Point: (__jsbind_tag(function (x, y) {}, 0)) };"
        );
        assert_eq!(out.signatures, [vec!["x", "y"]]);
    }

    #[test]
    fn comments_in_the_parameter_list_are_not_parameters() {
        let out = run("var m = function (a, /* c,d */ b) {};");
        assert_eq!(out.signatures, [vec!["a", "b"]]);
    }

    #[test]
    fn nested_functions_close_innermost_first() {
        let out = run("var f = function (a) { return function (b) {}; };");
        assert_eq!(
            out.code,
            "var f = (__jsbind_tag(function (a) { return (__jsbind_tag(function (b) {}, 1)); }, 0));"
        );
        assert_eq!(out.signatures, [vec!["a"], vec!["b"]]);
    }

    #[test]
    fn curried_arrows_share_an_end_offset() {
        let out = run("var add = a => b => a + b;");
        assert_eq!(
            out.code,
            "var add = (__jsbind_tag(a => (__jsbind_tag(b => a + b, 1)), 0));"
        );
        assert_eq!(out.signatures, [vec!["a"], vec!["b"]]);
    }

    #[test]
    fn declarations_register_after_the_directive_prologue() {
        let out = run("'use strict';\nreturnsLater();\nfunction Foo(x) {}");
        assert!(out.code.starts_with("'use strict';;__jsbind_tag(Foo, 0);\nreturnsLater();"));
        assert!(out.code.ends_with("function Foo(x) {}"));
    }

    #[test]
    fn declarations_after_return_are_still_registered() {
        let out = run("var lib = (function () { return { Foo: Foo }; function Foo(a, b) {} })();");
        assert!(out.code.contains("function () {;__jsbind_tag(Foo, 1); return"));
        assert_eq!(out.signatures[1], ["a", "b"]);
    }

    #[test]
    fn line_comment_prologue_moves_registration_to_the_next_line() {
        let out = run("// header\nfunction f(q) {}");
        assert_eq!(out.code, "// header\n;__jsbind_tag(f, 0);function f(q) {}");
    }

    #[test]
    fn defaults_rest_and_patterns() {
        let out = run("var f = function (a = 1, { b, c }, [d], ...rest) {};");
        assert_eq!(out.signatures, [vec!["a", "arg1", "arg2", "rest"]]);
    }

    #[test]
    fn method_shorthand_is_tagged_through_its_object() {
        let out = run("var lib = { area(w, h) { return w * h; }, get size() { return 1; }, n: 1 };");
        assert!(out.code.starts_with("var lib = (__jsbind_methods({ area(w, h)"));
        assert!(out.code.ends_with(", {\"area\": 0}));"));
        assert_eq!(out.signatures, [vec!["w", "h"]]);
    }

    #[test]
    fn classes_carry_their_constructor_parameters() {
        let out = run("class Shape { constructor(kind, size) {} area() {} }");
        assert_eq!(
            out.code,
            "class Shape { constructor(kind, size) {} area() {} };__jsbind_tag(Shape, 0);"
        );
        assert_eq!(out.signatures, [vec!["kind", "size"]]);
    }

    #[test]
    fn tags_continue_from_the_first_tag() {
        let out = instrument("var f = function (z) {};", 7);
        assert!(out.code.contains(", 7))"));
        assert_eq!(out.signatures, [vec!["z"]]);
    }

    #[test]
    fn unparseable_scripts_are_left_alone() {
        let out = run("var = ;");
        assert_eq!(out.code, "var = ;");
        assert!(out.signatures.is_empty());
    }
}
