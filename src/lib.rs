//! Typed GopherJS bindings from a live JavaScript object graph.
//!
//! Pipeline: evaluate the library in an embedded engine, walk the exported
//! object ([`classify`]), render every discovered element as Go
//! ([`render`]), and write the file ([`export`]).
pub mod classify;
pub mod engine;
pub mod error;
pub mod export;
pub mod ir;
pub mod render;
pub mod sanitize;
pub mod signature;

pub use classify::Classifier;
pub use engine::{BoaSource, MemoryGraph, ObjectGraph};
pub use error::{BindError, Result};
pub use ir::{Binding, Element, GoType, Interface, Method, Struct, VarList, Variable};

/// Bind the global `object` of an evaluated script as package `package`.
/// The root struct takes the package's (capitalized) name.
pub fn bind_global(source: &mut BoaSource, object: &str, package: &str) -> Result<Binding> {
    let root = source.lookup(object)?;
    let mut binding = Binding::new(package);
    Classifier::new(source).classify(&mut binding, package, &root)?;
    Ok(binding)
}
