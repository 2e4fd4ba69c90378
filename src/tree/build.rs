use tracing::debug;

use crate::error::{LoadError, StoreError};
use crate::store::{AttrValue, EntryKind, JUNK_KEY, Store, is_reserved_key, join_path};

use super::{AxisLink, DatasetNode, EntityTree, Node, NodeId, NodeKind};

/// Wraps every entry of `store` in one traversal.
///
/// Attribute rows come before child entries. Reserved keys are hidden; the
/// junk marker becomes the node's flag. Dimension scales are resolved once
/// all datasets exist; a scale that points nowhere is dropped.
pub fn build<S: Store + ?Sized>(store: &S) -> Result<EntityTree, LoadError> {
    let mut tree = EntityTree::with_root();
    let root = tree.root();
    wrap_entry(store, &mut tree, root)?;
    resolve_axes(store, &mut tree)?;
    debug!(location = %store.location(), nodes = tree.len(), "built entity tree");
    Ok(tree)
}

fn is_marked(value: &AttrValue) -> bool {
    match value {
        AttrValue::Int(flag) => *flag != 0,
        AttrValue::Float(flag) => *flag != 0.0,
        AttrValue::Str(text) => !matches!(text.trim(), "" | "0" | "false" | "False"),
    }
}

fn wrap_entry<S: Store + ?Sized>(
    store: &S,
    tree: &mut EntityTree,
    id: NodeId,
) -> Result<(), StoreError> {
    let (path, is_dataset) = match tree.get(id) {
        Some(node) => (node.path.clone(), node.is_dataset()),
        None => return Ok(()),
    };

    for (key, value) in store.attributes(&path)? {
        if key == JUNK_KEY {
            if let Some(node) = tree.node_mut(id) {
                node.junk = is_marked(&value);
            }
            continue;
        }
        if is_reserved_key(&key) {
            continue;
        }
        tree.push(id, &key, NodeKind::Attribute(value));
    }

    if is_dataset {
        return Ok(());
    }

    for name in store.children(&path)? {
        let kind = match store.entry(&join_path(&path, &name))? {
            EntryKind::Group => NodeKind::Group,
            EntryKind::Dataset { shape } => NodeKind::Dataset(DatasetNode {
                shape,
                plot: None,
                axes: Vec::new(),
            }),
        };
        let child = tree.push(id, &name, kind);
        wrap_entry(store, tree, child)?;
    }
    Ok(())
}

fn resolve_axes<S: Store + ?Sized>(store: &S, tree: &mut EntityTree) -> Result<(), StoreError> {
    for id in tree.find_all(|node| node.is_dataset()) {
        let path = tree.path_of(id).unwrap_or_default().to_owned();
        let mut axes = Vec::new();
        for scale in store.scales(&path)? {
            match tree.find_by_path(&scale.scale_path) {
                Some(dataset) if tree.get(dataset).is_some_and(|node| node.is_dataset()) => {
                    axes.push(AxisLink {
                        dim: scale.dim,
                        label: scale.label,
                        dataset,
                    });
                }
                _ => debug!(%path, scale = %scale.scale_path, "ignoring dangling dimension scale"),
            }
        }

        if let Some(Node {
            kind: NodeKind::Dataset(dataset),
            ..
        }) = tree.node_mut(id)
        {
            dataset.axes = axes;
        }
    }
    Ok(())
}
