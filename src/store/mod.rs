//! Backing store for the hierarchy.
//!
//! A [`Store`] is the array container the viewer edits: groups, datasets,
//! scalar attributes and dimension-scale links between datasets. The
//! in-memory [`MemoryStore`] holds a whole document; [`JsonFileStore`]
//! persists one to disk after every write.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

mod demo;
mod file;
mod memory;
mod scales;

pub use demo::demo_document;
pub use file::JsonFileStore;
pub use memory::{Attribute, Child, Document, Entry, MemoryStore};

/// Marks a group or dataset as junk. Written as integer `1`.
pub const JUNK_KEY: &str = "_h5view_junk";

/// Attribute keys that carry dimension-scale linkage.
pub const SCALE_KEYS: [&str; 5] = [
    "CLASS",
    "NAME",
    "DIMENSION_LIST",
    "REFERENCE_LIST",
    "DIMENSION_LABELS",
];

pub fn is_scale_key(key: &str) -> bool {
    SCALE_KEYS.contains(&key)
}

/// Keys that never show up as user attributes.
pub fn is_reserved_key(key: &str) -> bool {
    key == JUNK_KEY || is_scale_key(key)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    /// Integer first, then finite float, otherwise the raw text.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>()
            && value.is_finite()
        {
            return Self::Float(value);
        }
        Self::Str(raw.to_owned())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Str(text) => text.trim().parse::<f64>().ok().filter(|value| value.is_finite()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Str(text) => f.write_str(text),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Group,
    Dataset { shape: Vec<usize> },
}

/// Row-major numeric array read from a dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayData {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl ArrayData {
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, StoreError> {
        let expected = shape.iter().product::<usize>();
        if expected != values.len() {
            return Err(StoreError::Corrupt(format!(
                "shape {shape:?} needs {expected} values, got {}",
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Dataset `scale` supplies coordinates for dimension `dim` of the owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimScale {
    pub dim: usize,
    pub scale_path: String,
    pub label: String,
}

pub trait Store {
    /// Human readable location, used in titles and logs.
    fn location(&self) -> String;

    fn entry(&self, path: &str) -> Result<EntryKind, StoreError>;

    /// Names of the child entries of a group, in store order.
    fn children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// All attributes of an entry, reserved keys included.
    fn attributes(&self, path: &str) -> Result<Vec<(String, AttrValue)>, StoreError>;

    fn read_array(&self, path: &str) -> Result<ArrayData, StoreError>;

    fn create_group(&mut self, path: &str) -> Result<(), StoreError>;

    fn create_dataset(&mut self, path: &str, data: ArrayData) -> Result<(), StoreError>;

    /// Moves an entry and its subtree. Scale links into the subtree follow it.
    fn rename_entry(&mut self, from: &str, to: &str) -> Result<(), StoreError>;

    fn write_attribute(&mut self, path: &str, key: &str, value: AttrValue)
    -> Result<(), StoreError>;

    fn rename_attribute(&mut self, path: &str, from: &str, to: &str) -> Result<(), StoreError>;

    fn delete_attribute(&mut self, path: &str, key: &str) -> Result<(), StoreError>;

    fn attach_scale(
        &mut self,
        dataset: &str,
        scale: &str,
        dim: usize,
        label: &str,
    ) -> Result<(), StoreError>;

    fn scales(&self, dataset: &str) -> Result<Vec<DimScale>, StoreError>;

    /// Drops in-memory state and rereads the underlying container.
    fn reload(&mut self) -> Result<(), StoreError>;

    /// Whether someone else has modified the container since the last read or write.
    fn changed_on_disk(&self) -> bool {
        false
    }
}

pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Splits `/a/b/c` into (`/a/b`, `c`).
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    let (parent, name) = path.rsplit_once('/')?;
    if name.is_empty() {
        return None;
    }
    Some((if parent.is_empty() { "/" } else { parent }, name))
}

pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
