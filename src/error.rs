use thiserror::Error;

use crate::types::{EntryKind, StateMutability};

/// Errors produced while parsing declarations, ingesting structured ABIs,
/// resolving value shapes or binding values against them.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("unrecognized declaration: {0}")]
    UnrecognizedDeclaration(String),

    #[error("ambiguous state mutability in `{clause}`: found {found:?}")]
    AmbiguousMutability {
        clause: String,
        found: Vec<String>,
    },

    /// A mutability keyword the entry kind cannot carry, e.g. a `view`
    /// constructor or any keyword after an event or error.
    #[error("{kind} cannot be `{mutability}`")]
    InvalidMutability {
        kind: EntryKind,
        mutability: StateMutability,
    },

    #[error("invalid parameter `{0}`")]
    InvalidParameter(String),

    #[error("inline tuple parameters are not supported in human-readable form: `{0}`")]
    InlineTupleUnsupported(String),

    #[error("parameter `{parameter}` is marked indexed outside of an event ({kind})")]
    IndexedOutsideEvent { kind: EntryKind, parameter: String },

    #[error("unknown ABI type `{0}`")]
    UnknownAbiType(String),

    #[error("invalid array suffix in `{0}`")]
    InvalidArraySuffix(String),

    #[error("tuple type `{0}` has no components")]
    MissingTupleComponents(String),

    #[error("`{name}` matches {count} function overloads")]
    AmbiguousOverload { name: String, count: usize },

    #[error("duplicate {kind} name `{name}`")]
    DuplicateEventOrErrorName { kind: EntryKind, name: String },

    /// More than one constructor, fallback or receive entry.
    #[error("more than one {0}")]
    DuplicateEntry(EntryKind),

    #[error("duplicate field `{field}` in `{ty}`")]
    DuplicateFieldName { ty: String, field: String },

    #[error("no {kind} named `{name}`")]
    EntryNotFound { kind: EntryKind, name: String },

    #[error("ABI entry {index} does not conform to the schema: {reason}")]
    SchemaViolation { index: usize, reason: String },

    #[error("expected {expected}, found {found}")]
    ValueMismatch { expected: String, found: String },

    #[error("invalid JSON ABI: {0}")]
    Json(#[from] serde_json::Error),
}

impl AbiError {
    pub(crate) fn mismatch(expected: impl ToString, found: &serde_json::Value) -> Self {
        AbiError::ValueMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AbiError>;
