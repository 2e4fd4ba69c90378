//! Scatter data relating two numeric attributes across datasets.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::CorrelateError;
use crate::store::{ArrayData, Store};
use crate::tree::{EntityTree, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedPoint {
    pub dataset: NodeId,
    pub x: f64,
    pub y: f64,
    /// Array of the dataset's dimension-0 axis, when one is attached.
    pub x_series: Option<ArrayData>,
    pub y_series: ArrayData,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Correlation {
    /// No dataset carries both keys.
    NoSharedProperties,
    Points(Vec<CorrelatedPoint>),
}

impl Correlation {
    pub fn points(&self) -> &[CorrelatedPoint] {
        match self {
            Self::NoSharedProperties => &[],
            Self::Points(points) => points,
        }
    }
}

/// Numeric attribute keys found on datasets, with how many datasets carry each.
///
/// Derived from one tree on demand, so it never outlives a reload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyIndex {
    counts: BTreeMap<String, usize>,
}

impl PropertyIndex {
    pub fn build(tree: &EntityTree) -> Self {
        let mut counts = BTreeMap::new();
        for id in tree.find_all(|node| node.is_dataset()) {
            for attr in tree.attribute_children(id) {
                let Some(node) = tree.get(attr) else {
                    continue;
                };
                if node.attribute_value().and_then(|value| value.as_f64()).is_some() {
                    *counts.entry(node.name.clone()).or_insert(0) += 1;
                }
            }
        }
        Self { counts }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

pub fn correlate<S: Store + ?Sized>(
    tree: &EntityTree,
    store: &S,
    key1: &str,
    key2: &str,
) -> Result<Correlation, CorrelateError> {
    let mut points = Vec::new();

    for id in tree.find_all(|node| node.is_dataset()) {
        let (Some(x_attr), Some(y_attr)) = (tree.attribute_of(id, key1), tree.attribute_of(id, key2))
        else {
            continue;
        };
        let x = numeric(tree, id, x_attr, key1)?;
        let y = numeric(tree, id, y_attr, key2)?;

        let path = tree.path_of(id).unwrap_or_default();
        let y_series = store.read_array(path)?;
        let x_series = match tree
            .get(id)
            .and_then(|node| node.dataset())
            .and_then(|dataset| dataset.axis(0))
            .and_then(|link| tree.path_of(link.dataset))
        {
            Some(axis_path) => Some(store.read_array(axis_path)?),
            None => None,
        };

        points.push(CorrelatedPoint {
            dataset: id,
            x,
            y,
            x_series,
            y_series,
        });
    }

    if points.is_empty() {
        debug!(key1, key2, "no dataset carries both properties");
        return Ok(Correlation::NoSharedProperties);
    }

    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    debug!(key1, key2, points = points.len(), "correlated properties");
    Ok(Correlation::Points(points))
}

fn numeric(
    tree: &EntityTree,
    dataset: NodeId,
    attr: NodeId,
    key: &str,
) -> Result<f64, CorrelateError> {
    let value = tree.get(attr).and_then(|node| node.attribute_value());
    value
        .and_then(|value| value.as_f64())
        .ok_or_else(|| CorrelateError::Conversion {
            dataset: tree.path_of(dataset).unwrap_or_default().to_owned(),
            key: key.to_owned(),
            value: value.map(ToString::to_string).unwrap_or_default(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttrValue, MemoryStore};
    use crate::tree::build;

    fn dataset(store: &mut MemoryStore, path: &str, x: AttrValue, y: AttrValue) {
        store
            .create_dataset(path, ArrayData::new(vec![2], vec![1.0, 2.0]).unwrap())
            .unwrap();
        store.write_attribute(path, "prop x", x).unwrap();
        store.write_attribute(path, "prop y", y).unwrap();
    }

    #[test]
    fn points_are_sorted_by_x() {
        let mut store = MemoryStore::new();
        dataset(&mut store, "/D1", AttrValue::Int(3), AttrValue::Int(7));
        dataset(&mut store, "/D2", AttrValue::Int(2), AttrValue::Int(4));
        let tree = build(&store).unwrap();

        let correlation = correlate(&tree, &store, "prop x", "prop y").unwrap();
        let pairs = correlation
            .points()
            .iter()
            .map(|point| (point.x, point.y))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![(2.0, 4.0), (3.0, 7.0)]);
        assert!(correlation.points().iter().all(|point| point.x_series.is_none()));
    }

    #[test]
    fn ties_keep_encounter_order() {
        let mut store = MemoryStore::new();
        dataset(&mut store, "/first", AttrValue::Int(1), AttrValue::Int(10));
        dataset(&mut store, "/second", AttrValue::Float(1.0), AttrValue::Int(20));
        let tree = build(&store).unwrap();

        let correlation = correlate(&tree, &store, "prop x", "prop y").unwrap();
        let ys = correlation.points().iter().map(|point| point.y).collect::<Vec<_>>();
        assert_eq!(ys, vec![10.0, 20.0]);
    }

    #[test]
    fn missing_keys_are_not_an_error() {
        let mut store = MemoryStore::new();
        dataset(&mut store, "/D1", AttrValue::Int(3), AttrValue::Int(7));
        let tree = build(&store).unwrap();
        assert_eq!(
            correlate(&tree, &store, "prop x", "absent").unwrap(),
            Correlation::NoSharedProperties
        );
    }

    #[test]
    fn non_numeric_value_fails_conversion() {
        let mut store = MemoryStore::new();
        dataset(&mut store, "/D1", AttrValue::Str("wide".into()), AttrValue::Int(7));
        let tree = build(&store).unwrap();
        let error = correlate(&tree, &store, "prop x", "prop y").unwrap_err();
        assert!(matches!(error, CorrelateError::Conversion { ref key, .. } if key == "prop x"));
    }

    #[test]
    fn property_index_counts_numeric_keys_only() {
        let mut store = MemoryStore::new();
        dataset(&mut store, "/D1", AttrValue::Int(3), AttrValue::Str("n/a".into()));
        dataset(&mut store, "/D2", AttrValue::Float(2.5), AttrValue::Int(4));
        let index = PropertyIndex::build(&build(&store).unwrap());
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["prop x", "prop y"]);
        assert_eq!(index.count("prop x"), 2);
        assert_eq!(index.count("prop y"), 1);
    }
}
