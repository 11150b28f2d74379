//! Identifier hygiene for emitted Go code.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Appended to any identifier that collides with a reserved word.
pub const ESCAPE_SUFFIX: char = '_';

/// Go keywords, plus the JavaScript words GopherJS would otherwise mangle
/// when it compiles the binding back to JS.
static RESERVED_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Go
        "break", "default", "func", "interface", "select",
        "case", "defer", "go", "map", "struct",
        "chan", "else", "goto", "package", "switch",
        "const", "fallthrough", "if", "range", "type",
        "continue", "for", "import", "return", "var",
        // JavaScript
        "class", "delete", "do", "enum", "export",
        "extends", "function", "in", "instanceof", "let",
        "new", "super", "this", "throw", "typeof",
        "void", "while", "with", "yield",
    ]
    .into_iter()
    .collect()
});

pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(name)
}

/// Idempotent: an escaped name is never itself a keyword.
pub fn sanitize_ident(name: &str) -> String {
    if is_reserved(name) {
        format!("{name}{ESCAPE_SUFFIX}")
    } else {
        name.to_string()
    }
}

/// Upper-case the first character (Go's exported-identifier rule).
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Whether a dynamic key reads as a type constructor (`Foo`, not `foo`).
pub fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

/// Sanitize, then capitalize: `class` becomes `Class_`.
pub fn exported(name: &str) -> String {
    capitalize(&sanitize_ident(name))
}
