use thiserror::Error;

use crate::ir::GoType;

pub type Result<T> = std::result::Result<T, BindError>;

/// Every error is terminal for the run; nothing here is retried.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    #[error("global `{name}` is not usable as a library object: {reason}")]
    Lookup { name: String, reason: String },

    #[error("failed to enumerate keys of `{object}`: {reason}")]
    Keys { object: String, reason: String },

    #[error("failed to read property `{key}` of `{object}`: {reason}")]
    Property {
        object: String,
        key: String,
        reason: String,
    },

    #[error("failed to read source text of `{function}`: {reason}")]
    SourceText { function: String, reason: String },

    /// Mirrors the only return conversions GopherJS offers on `*js.Object`.
    #[error(
        "method `{method}` may only return float64, int, string, or interface{{}}, not {found}"
    )]
    UnsupportedReturn { method: String, found: GoType },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BindError {
    /// Name the object an engine-access failure happened on. Engines only see
    /// handles; the classifier knows the path.
    pub fn at(self, object: &str) -> Self {
        match self {
            BindError::Keys { reason, .. } => BindError::Keys {
                object: object.to_string(),
                reason,
            },
            BindError::Property { key, reason, .. } => BindError::Property {
                object: object.to_string(),
                key,
                reason,
            },
            BindError::SourceText { reason, .. } => BindError::SourceText {
                function: object.to_string(),
                reason,
            },
            other => other,
        }
    }
}
