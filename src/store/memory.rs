use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

use super::scales::{
    CLASS, DIMENSION_LABELS, DIMENSION_LIST, DIMENSION_SCALE, NAME, REFERENCE_LIST, format_pairs,
    parse_pairs, rewrite_prefix, upsert_pair,
};
use super::{
    ArrayData, AttrValue, DimScale, EntryKind, Store, is_scale_key, path_segments, split_path,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: AttrValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    pub entry: Entry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Group {
        #[serde(default)]
        attrs: Vec<Attribute>,
        #[serde(default)]
        children: Vec<Child>,
    },
    Dataset {
        #[serde(default)]
        attrs: Vec<Attribute>,
        shape: Vec<usize>,
        data: Vec<f64>,
    },
}

impl Entry {
    pub fn group() -> Self {
        Self::Group {
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn dataset(array: ArrayData) -> Self {
        Self::Dataset {
            attrs: Vec::new(),
            shape: array.shape,
            data: array.values,
        }
    }

    pub fn attrs(&self) -> &[Attribute] {
        match self {
            Self::Group { attrs, .. } | Self::Dataset { attrs, .. } => attrs,
        }
    }

    fn attrs_mut(&mut self) -> &mut Vec<Attribute> {
        match self {
            Self::Group { attrs, .. } | Self::Dataset { attrs, .. } => attrs,
        }
    }

    pub fn children(&self) -> Option<&[Child]> {
        match self {
            Self::Group { children, .. } => Some(children),
            Self::Dataset { .. } => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Child>> {
        match self {
            Self::Group { children, .. } => Some(children),
            Self::Dataset { .. } => None,
        }
    }

    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Self::Group { .. } => None,
            Self::Dataset { shape, .. } => Some(shape),
        }
    }

    fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs()
            .iter()
            .find(|attribute| attribute.key == key)
            .map(|attribute| &attribute.value)
    }

    fn set_attr(&mut self, key: &str, value: AttrValue) {
        let attrs = self.attrs_mut();
        if let Some(existing) = attrs.iter_mut().find(|attribute| attribute.key == key) {
            existing.value = value;
        } else {
            attrs.push(Attribute {
                key: key.to_owned(),
                value,
            });
        }
    }

    fn remove_attr(&mut self, key: &str) {
        self.attrs_mut().retain(|attribute| attribute.key != key);
    }

    fn pairs(&self, key: &str) -> Vec<(usize, String)> {
        self.attr(key)
            .and_then(AttrValue::as_str)
            .map(parse_pairs)
            .unwrap_or_default()
    }

    fn set_pairs(&mut self, key: &str, pairs: &[(usize, String)]) {
        if pairs.is_empty() {
            self.remove_attr(key);
        } else {
            self.set_attr(key, AttrValue::Str(format_pairs(pairs)));
        }
    }

    fn rewrite_scale_refs(&mut self, from: &str, to: &str) {
        for key in [DIMENSION_LIST, REFERENCE_LIST] {
            let mut pairs = self.pairs(key);
            let mut touched = false;
            for (_, path) in &mut pairs {
                if let Some(moved) = rewrite_prefix(path, from, to) {
                    *path = moved;
                    touched = true;
                }
            }
            if touched {
                self.set_pairs(key, &pairs);
            }
        }

        if let Some(children) = self.children_mut() {
            for child in children {
                child.entry.rewrite_scale_refs(from, to);
            }
        }
    }

    fn validate(&self, path: &str) -> Result<(), StoreError> {
        let mut keys = HashSet::new();
        for attribute in self.attrs() {
            if !keys.insert(attribute.key.as_str()) {
                return Err(StoreError::Corrupt(format!(
                    "duplicate attribute `{}` on {path}",
                    attribute.key
                )));
            }
        }

        match self {
            Self::Dataset { shape, data, .. } => {
                if shape.contains(&0) {
                    return Err(StoreError::Corrupt(format!(
                        "dataset {path} has an empty dimension in {shape:?}"
                    )));
                }
                let expected = shape.iter().product::<usize>();
                if expected != data.len() {
                    return Err(StoreError::Corrupt(format!(
                        "dataset {path} has shape {shape:?} but {} values",
                        data.len()
                    )));
                }
                Ok(())
            }
            Self::Group { children, .. } => {
                let mut names = HashSet::new();
                for child in children {
                    if child.name.trim().is_empty() || child.name.contains('/') {
                        return Err(StoreError::Corrupt(format!(
                            "invalid entry name `{}` under {path}",
                            child.name
                        )));
                    }
                    if !names.insert(child.name.as_str()) {
                        return Err(StoreError::Corrupt(format!(
                            "duplicate entry `{}` under {path}",
                            child.name
                        )));
                    }
                    child.entry.validate(&super::join_path(path, &child.name))?;
                }
                Ok(())
            }
        }
    }
}

/// A whole hierarchy: the root group and everything below it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: Entry,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            root: Entry::group(),
        }
    }
}

impl Document {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.root.children().is_none() {
            return Err(StoreError::Corrupt("root entry must be a group".to_owned()));
        }
        self.root.validate("/")
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    doc: Document,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        doc.validate()?;
        Ok(Self { doc })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn lookup(&self, path: &str) -> Result<&Entry, StoreError> {
        let mut entry = &self.doc.root;
        for segment in path_segments(path) {
            entry = entry
                .children()
                .and_then(|children| children.iter().find(|child| child.name == segment))
                .map(|child| &child.entry)
                .ok_or_else(|| StoreError::NotFound(path.to_owned()))?;
        }
        Ok(entry)
    }

    fn lookup_mut(&mut self, path: &str) -> Result<&mut Entry, StoreError> {
        let mut entry = &mut self.doc.root;
        for segment in path_segments(path) {
            entry = entry
                .children_mut()
                .and_then(|children| children.iter_mut().find(|child| child.name == segment))
                .map(|child| &mut child.entry)
                .ok_or_else(|| StoreError::NotFound(path.to_owned()))?;
        }
        Ok(entry)
    }

    fn dataset_shape(&self, path: &str) -> Result<&[usize], StoreError> {
        self.lookup(path)?
            .shape()
            .ok_or_else(|| StoreError::WrongKind {
                path: path.to_owned(),
                expected: "dataset",
            })
    }

    fn insert_child(&mut self, path: &str, entry: Entry) -> Result<(), StoreError> {
        let (parent, name) =
            split_path(path).ok_or_else(|| StoreError::InvalidPath(path.to_owned()))?;
        if name.trim().is_empty() {
            return Err(StoreError::InvalidPath(path.to_owned()));
        }
        entry.validate(path)?;
        if self.lookup(path).is_ok() {
            return Err(StoreError::AlreadyExists(path.to_owned()));
        }

        let children = self
            .lookup_mut(parent)?
            .children_mut()
            .ok_or_else(|| StoreError::WrongKind {
                path: parent.to_owned(),
                expected: "group",
            })?;
        children.push(Child {
            name: name.to_owned(),
            entry,
        });
        Ok(())
    }
}

impl Store for MemoryStore {
    fn location(&self) -> String {
        "memory".to_owned()
    }

    fn entry(&self, path: &str) -> Result<EntryKind, StoreError> {
        Ok(match self.lookup(path)? {
            Entry::Group { .. } => EntryKind::Group,
            Entry::Dataset { shape, .. } => EntryKind::Dataset {
                shape: shape.clone(),
            },
        })
    }

    fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let children = self
            .lookup(path)?
            .children()
            .ok_or_else(|| StoreError::WrongKind {
                path: path.to_owned(),
                expected: "group",
            })?;
        Ok(children.iter().map(|child| child.name.clone()).collect())
    }

    fn attributes(&self, path: &str) -> Result<Vec<(String, AttrValue)>, StoreError> {
        Ok(self
            .lookup(path)?
            .attrs()
            .iter()
            .map(|attribute| (attribute.key.clone(), attribute.value.clone()))
            .collect())
    }

    fn read_array(&self, path: &str) -> Result<ArrayData, StoreError> {
        match self.lookup(path)? {
            Entry::Dataset { shape, data, .. } => ArrayData::new(shape.clone(), data.clone()),
            Entry::Group { .. } => Err(StoreError::WrongKind {
                path: path.to_owned(),
                expected: "dataset",
            }),
        }
    }

    fn create_group(&mut self, path: &str) -> Result<(), StoreError> {
        self.insert_child(path, Entry::group())
    }

    fn create_dataset(&mut self, path: &str, data: ArrayData) -> Result<(), StoreError> {
        self.insert_child(path, Entry::dataset(data))
    }

    fn rename_entry(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        let (from_parent, from_name) =
            split_path(from).ok_or_else(|| StoreError::InvalidPath(from.to_owned()))?;
        let (to_parent, to_name) =
            split_path(to).ok_or_else(|| StoreError::InvalidPath(to.to_owned()))?;
        if from == to {
            return Ok(());
        }
        if to_name.trim().is_empty() || to.starts_with(&format!("{from}/")) {
            return Err(StoreError::InvalidPath(to.to_owned()));
        }
        self.lookup(from)?;
        if self.lookup(to).is_ok() {
            return Err(StoreError::AlreadyExists(to.to_owned()));
        }
        if self.lookup(to_parent)?.children().is_none() {
            return Err(StoreError::WrongKind {
                path: to_parent.to_owned(),
                expected: "group",
            });
        }

        let source = self
            .lookup_mut(from_parent)?
            .children_mut()
            .ok_or_else(|| StoreError::NotFound(from.to_owned()))?;
        let position = source
            .iter()
            .position(|child| child.name == from_name)
            .ok_or_else(|| StoreError::NotFound(from.to_owned()))?;
        let mut child = source.remove(position);
        child.name = to_name.to_owned();

        if from_parent == to_parent {
            source.insert(position, child);
        } else if let Some(target) = self.lookup_mut(to_parent)?.children_mut() {
            target.push(child);
        }

        self.doc.root.rewrite_scale_refs(from, to);
        Ok(())
    }

    fn write_attribute(
        &mut self,
        path: &str,
        key: &str,
        value: AttrValue,
    ) -> Result<(), StoreError> {
        if is_scale_key(key) {
            return Err(StoreError::StructuralWrite {
                key: key.to_owned(),
            });
        }
        self.lookup_mut(path)?.set_attr(key, value);
        Ok(())
    }

    fn rename_attribute(&mut self, path: &str, from: &str, to: &str) -> Result<(), StoreError> {
        for key in [from, to] {
            if is_scale_key(key) {
                return Err(StoreError::StructuralWrite {
                    key: key.to_owned(),
                });
            }
        }
        if from == to {
            return Ok(());
        }

        let entry = self.lookup_mut(path)?;
        if entry.attr(to).is_some() {
            return Err(StoreError::AttributeExists {
                path: path.to_owned(),
                key: to.to_owned(),
            });
        }
        let attribute = entry
            .attrs_mut()
            .iter_mut()
            .find(|attribute| attribute.key == from)
            .ok_or_else(|| StoreError::AttributeNotFound {
                path: path.to_owned(),
                key: from.to_owned(),
            })?;
        attribute.key = to.to_owned();
        Ok(())
    }

    fn delete_attribute(&mut self, path: &str, key: &str) -> Result<(), StoreError> {
        if is_scale_key(key) {
            return Err(StoreError::StructuralWrite {
                key: key.to_owned(),
            });
        }
        let entry = self.lookup_mut(path)?;
        if entry.attr(key).is_none() {
            return Err(StoreError::AttributeNotFound {
                path: path.to_owned(),
                key: key.to_owned(),
            });
        }
        entry.remove_attr(key);
        Ok(())
    }

    fn attach_scale(
        &mut self,
        dataset: &str,
        scale: &str,
        dim: usize,
        label: &str,
    ) -> Result<(), StoreError> {
        if dataset == scale {
            return Err(StoreError::InvalidPath(scale.to_owned()));
        }
        let extent = *self
            .dataset_shape(dataset)?
            .get(dim)
            .ok_or_else(|| StoreError::DimensionOutOfRange {
                path: dataset.to_owned(),
                dim,
            })?;
        let scale_shape = self.dataset_shape(scale)?;
        let scale_extent = if scale_shape.len() == 1 {
            scale_shape.first()
        } else {
            scale_shape.get(dim)
        };
        if scale_extent != Some(&extent) {
            return Err(StoreError::ExtentMismatch {
                dataset: dataset.to_owned(),
                scale: scale.to_owned(),
                dim,
            });
        }

        let owner = self.lookup_mut(dataset)?;
        let mut links = owner.pairs(DIMENSION_LIST);
        let previous = links
            .iter()
            .find(|(existing, _)| *existing == dim)
            .map(|(_, path)| path.clone());
        upsert_pair(&mut links, dim, scale);
        owner.set_pairs(DIMENSION_LIST, &links);
        let mut labels = owner.pairs(DIMENSION_LABELS);
        upsert_pair(&mut labels, dim, label);
        owner.set_pairs(DIMENSION_LABELS, &labels);

        if let Some(previous) = previous.filter(|previous| previous != scale)
            && let Ok(old_scale) = self.lookup_mut(&previous)
        {
            let mut refs = old_scale.pairs(REFERENCE_LIST);
            refs.retain(|(existing, path)| !(*existing == dim && path == dataset));
            old_scale.set_pairs(REFERENCE_LIST, &refs);
        }

        let scale_entry = self.lookup_mut(scale)?;
        scale_entry.set_attr(CLASS, AttrValue::Str(DIMENSION_SCALE.to_owned()));
        scale_entry.set_attr(NAME, AttrValue::Str(label.to_owned()));
        let mut refs = scale_entry.pairs(REFERENCE_LIST);
        if !refs
            .iter()
            .any(|(existing, path)| *existing == dim && path == dataset)
        {
            refs.push((dim, dataset.to_owned()));
        }
        scale_entry.set_pairs(REFERENCE_LIST, &refs);
        Ok(())
    }

    fn scales(&self, dataset: &str) -> Result<Vec<DimScale>, StoreError> {
        let owner = self.lookup(dataset)?;
        if owner.shape().is_none() {
            return Err(StoreError::WrongKind {
                path: dataset.to_owned(),
                expected: "dataset",
            });
        }

        let labels = owner.pairs(DIMENSION_LABELS);
        Ok(owner
            .pairs(DIMENSION_LIST)
            .into_iter()
            .map(|(dim, scale_path)| {
                let label = labels
                    .iter()
                    .find(|(label_dim, _)| *label_dim == dim)
                    .map(|(_, label)| label.clone())
                    .or_else(|| {
                        self.lookup(&scale_path)
                            .ok()
                            .and_then(|scale| scale.attr(NAME))
                            .map(ToString::to_string)
                    })
                    .unwrap_or_default();
                DimScale {
                    dim,
                    scale_path,
                    label,
                }
            })
            .collect())
    }

    fn reload(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create_group("/g").unwrap();
        store
            .create_dataset("/g/data", ArrayData::new(vec![3], vec![1.0, 2.0, 3.0]).unwrap())
            .unwrap();
        store
            .create_dataset("/g/axis", ArrayData::new(vec![3], vec![0.1, 0.2, 0.3]).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn rename_keeps_sibling_position() {
        let mut store = sample();
        store.rename_entry("/g/data", "/g/renamed").unwrap();
        assert_eq!(store.children("/g").unwrap(), vec!["renamed", "axis"]);
        assert!(matches!(store.entry("/g/data"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn rename_onto_existing_entry_fails() {
        let mut store = sample();
        let error = store.rename_entry("/g/data", "/g/axis").unwrap_err();
        assert!(matches!(error, StoreError::AlreadyExists(_)));
        assert_eq!(store.children("/g").unwrap(), vec!["data", "axis"]);
    }

    #[test]
    fn rename_into_own_subtree_fails() {
        let mut store = sample();
        let error = store.rename_entry("/g", "/g/inner").unwrap_err();
        assert!(matches!(error, StoreError::InvalidPath(_)));
    }

    #[test]
    fn scale_links_follow_renamed_entries() {
        let mut store = sample();
        store.attach_scale("/g/data", "/g/axis", 0, "time").unwrap();
        store.rename_entry("/g", "/moved").unwrap();

        let scales = store.scales("/moved/data").unwrap();
        assert_eq!(
            scales,
            vec![DimScale {
                dim: 0,
                scale_path: "/moved/axis".to_owned(),
                label: "time".to_owned(),
            }]
        );
    }

    #[test]
    fn structural_keys_reject_plain_writes() {
        let mut store = sample();
        let error = store
            .write_attribute("/g/data", "DIMENSION_LIST", AttrValue::Int(1))
            .unwrap_err();
        assert!(matches!(error, StoreError::StructuralWrite { .. }));
    }

    #[test]
    fn attach_scale_checks_extent() {
        let mut store = sample();
        store
            .create_dataset("/g/short", ArrayData::new(vec![2], vec![0.0, 1.0]).unwrap())
            .unwrap();
        let error = store.attach_scale("/g/data", "/g/short", 0, "x").unwrap_err();
        assert!(matches!(error, StoreError::ExtentMismatch { .. }));
        assert!(store.scales("/g/data").unwrap().is_empty());
    }

    #[test]
    fn reattaching_a_dimension_drops_the_old_back_reference() {
        let mut store = sample();
        store
            .create_dataset("/g/other", ArrayData::new(vec![3], vec![5.0, 6.0, 7.0]).unwrap())
            .unwrap();
        store.attach_scale("/g/data", "/g/axis", 0, "a").unwrap();
        store.attach_scale("/g/data", "/g/other", 0, "b").unwrap();

        let axis_attrs = store.attributes("/g/axis").unwrap();
        assert!(!axis_attrs.iter().any(|(key, _)| key == REFERENCE_LIST));
        assert_eq!(store.scales("/g/data").unwrap()[0].scale_path, "/g/other");
    }

    #[test]
    fn document_validation_rejects_bad_shapes() {
        let doc = Document {
            root: Entry::Group {
                attrs: Vec::new(),
                children: vec![Child {
                    name: "d".to_owned(),
                    entry: Entry::Dataset {
                        attrs: Vec::new(),
                        shape: vec![2, 2],
                        data: vec![1.0],
                    },
                }],
            },
        };
        assert!(matches!(
            MemoryStore::from_document(doc),
            Err(StoreError::Corrupt(_))
        ));
    }
}
