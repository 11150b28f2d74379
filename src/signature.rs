//! Parameter recovery from a function's source text.
//!
//! Engines that can report parameter names structurally do so through
//! [`ObjectGraph::declared_params`](crate::engine::ObjectGraph::declared_params)
//! (the Boa engine does, for every function its instrumented scripts define)
//! and the text scan is skipped. Otherwise the names come from
//! `Function.prototype.toString`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::engine::ObjectGraph;
use crate::ir::{VarList, Variable};

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").expect("comment pattern"));
static PARENS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\b[^(]*\(([^)]*)\)").expect("parens pattern"));
static SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").expect("split pattern"));

/// Parameters of `function`, every one typed `interface{}`.
pub fn extract_params<G: ObjectGraph>(graph: &mut G, function: &G::Object) -> Result<VarList> {
    if let Some(names) = graph.declared_params(function) {
        return Ok(names.into_iter().map(Variable::any).collect());
    }
    let source = graph.source_text(function)?;
    Ok(parse_params(&source))
}

/// Text-only extraction. Sources without a `function (...)` header (arrow
/// functions, method shorthand) yield an empty list rather than an error.
pub fn parse_params(source: &str) -> VarList {
    let stripped = COMMENT_RE.replace_all(source, "");

    let Some(caps) = PARENS_RE.captures(&stripped) else {
        debug!(source = %first_line(source), "no function header; assuming no parameters");
        return VarList::new();
    };

    let header = caps[1].trim();
    if header.is_empty() {
        return VarList::new();
    }

    SPLIT_RE
        .split(header)
        .filter(|name| !name.is_empty())
        .map(Variable::any)
        .collect()
}

fn first_line(source: &str) -> &str {
    source.lines().next().unwrap_or_default()
}
