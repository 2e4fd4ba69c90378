use std::path::PathBuf;

use thiserror::Error;

use crate::tree::NodeId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no entry at {0}")]
    NotFound(String),

    #[error("{path} is not a {expected}")]
    WrongKind { path: String, expected: &'static str },

    #[error("an entry already exists at {0}")]
    AlreadyExists(String),

    #[error("attribute `{key}` not found on {path}")]
    AttributeNotFound { path: String, key: String },

    #[error("attribute `{key}` already exists on {path}")]
    AttributeExists { path: String, key: String },

    #[error("attribute `{key}` holds dimension-scale metadata and cannot be written directly")]
    StructuralWrite { key: String },

    #[error("invalid path {0}")]
    InvalidPath(String),

    #[error("dimension {dim} is out of range for {path}")]
    DimensionOutOfRange { path: String, dim: usize },

    #[error("scale {scale} does not match the extent of dimension {dim} of {dataset}")]
    ExtentMismatch {
        dataset: String,
        scale: String,
        dim: usize,
    },

    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The backing store could not be traversed. Fatal for the session.
#[derive(Debug, Error)]
#[error("failed to load hierarchy: {0}")]
pub struct LoadError(#[from] pub StoreError);

/// A rejected edit. The tree and the store are left untouched.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("name must not be blank")]
    EmptyName,

    #[error("name `{0}` must not contain '/'")]
    InvalidName(String),

    #[error("a sibling named `{0}` already exists")]
    NameConflict(String),

    #[error("`{0}` is reserved for internal metadata")]
    ReservedKey(String),

    #[error("shape {axis:?} of the axis does not match shape {target:?}")]
    ShapeMismatch { target: Vec<usize>, axis: Vec<usize> },

    #[error("value `{value}` was rejected for attribute `{key}`: {source}")]
    Coercion {
        key: String,
        value: String,
        #[source]
        source: StoreError,
    },

    #[error("{path} is not a {expected}")]
    WrongKind { path: String, expected: &'static str },

    #[error("the root group cannot be renamed")]
    RootImmutable,

    #[error("a dataset cannot be its own axis")]
    SameDataset,

    #[error("node {0:?} does not exist in the current tree")]
    UnknownNode(NodeId),

    #[error("cannot open a view of a rank {0} dataset")]
    Unplottable(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum CorrelateError {
    #[error("attribute `{key}` of {dataset} is not numeric: `{value}`")]
    Conversion {
        dataset: String,
        key: String,
        value: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
