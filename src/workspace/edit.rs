use tracing::{info, warn};

use crate::error::EditError;
use crate::store::{AttrValue, JUNK_KEY, Store, is_reserved_key, join_path};
use crate::tree::{AxisLink, NodeId, NodeKind};

use super::{ChangeEvent, Workspace};

fn validate_name(name: &str) -> Result<(), EditError> {
    if name.trim().is_empty() {
        return Err(EditError::EmptyName);
    }
    if name.contains('/') {
        return Err(EditError::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl<S: Store> Workspace<S> {
    /// Renames a group or dataset in place. Attribute nodes are rekeyed.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<(), EditError> {
        if self.node(id)?.is_attribute() {
            return self.rename_attribute_key(id, new_name);
        }
        self.try_rename(id, new_name)
            .inspect_err(|error| warn!(node = id.index(), %error, "rename rejected"))
    }

    fn try_rename(&mut self, id: NodeId, new_name: &str) -> Result<(), EditError> {
        if id == self.tree.root() {
            return Err(EditError::RootImmutable);
        }
        let node = self.node(id)?;
        if node.name == new_name {
            return Ok(());
        }
        validate_name(new_name)?;
        if self.tree.sibling_names(id).contains(&new_name) {
            return Err(EditError::NameConflict(new_name.to_owned()));
        }

        let old_path = node.path.clone();
        let parent_path = self
            .tree
            .parent_of(id)
            .and_then(|parent| self.tree.path_of(parent))
            .unwrap_or("/");
        let new_path = join_path(parent_path, new_name);

        self.store.rename_entry(&old_path, &new_path)?;
        self.tree.set_name(id, new_name);
        info!(from = %old_path, to = %new_path, "renamed entry");
        self.commit(ChangeEvent::Renamed { node: id, old_path });
        Ok(())
    }

    pub fn rename_attribute_key(&mut self, id: NodeId, new_key: &str) -> Result<(), EditError> {
        self.try_rename_attribute_key(id, new_key)
            .inspect_err(|error| warn!(node = id.index(), %error, "attribute rename rejected"))
    }

    fn try_rename_attribute_key(&mut self, id: NodeId, new_key: &str) -> Result<(), EditError> {
        let (owner, old_key) = self.attribute_owner(id)?;
        if old_key == new_key {
            return Ok(());
        }
        validate_name(new_key)?;
        if is_reserved_key(new_key) {
            return Err(EditError::ReservedKey(new_key.to_owned()));
        }
        if self.tree.sibling_names(id).contains(&new_key) {
            return Err(EditError::NameConflict(new_key.to_owned()));
        }

        self.store.rename_attribute(&owner, &old_key, new_key)?;
        self.tree.set_name(id, new_key);
        info!(entry = %owner, from = %old_key, to = %new_key, "renamed attribute");
        self.commit(ChangeEvent::AttributeRenamed { node: id, old_key });
        Ok(())
    }

    /// Stores `raw` as an integer, a float or text, whichever parses first.
    pub fn set_attribute_value(&mut self, id: NodeId, raw: &str) -> Result<(), EditError> {
        self.try_set_attribute_value(id, raw)
            .inspect_err(|error| warn!(node = id.index(), %error, "attribute write rejected"))
    }

    fn try_set_attribute_value(&mut self, id: NodeId, raw: &str) -> Result<(), EditError> {
        let (owner, key) = self.attribute_owner(id)?;
        let value = AttrValue::coerce(raw);

        self.store
            .write_attribute(&owner, &key, value.clone())
            .map_err(|source| EditError::Coercion {
                key: key.clone(),
                value: raw.to_owned(),
                source,
            })?;
        info!(entry = %owner, %key, kind = value.type_label(), "wrote attribute");
        if let Some(node) = self.tree.node_mut(id) {
            node.kind = NodeKind::Attribute(value);
        }
        self.commit(ChangeEvent::AttributeValueChanged { node: id });
        Ok(())
    }

    pub fn mark_junk(&mut self, ids: &[NodeId]) -> Result<(), EditError> {
        self.try_set_junk(ids, true)
            .inspect_err(|error| warn!(%error, "junk marking rejected"))
    }

    pub fn unmark_junk(&mut self, ids: &[NodeId]) -> Result<(), EditError> {
        self.try_set_junk(ids, false)
            .inspect_err(|error| warn!(%error, "junk unmarking rejected"))
    }

    fn try_set_junk(&mut self, ids: &[NodeId], junk: bool) -> Result<(), EditError> {
        let mut pending = Vec::new();
        for &id in ids {
            let node = self.node(id)?;
            if node.is_attribute() {
                return Err(EditError::WrongKind {
                    path: node.path.clone(),
                    expected: "group or dataset",
                });
            }
            if node.junk != junk && !pending.iter().any(|(pending_id, _)| *pending_id == id) {
                pending.push((id, node.path.clone()));
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        for (index, (_, path)) in pending.iter().enumerate() {
            let written = if junk {
                self.store.write_attribute(path, JUNK_KEY, AttrValue::Int(1))
            } else {
                self.store.delete_attribute(path, JUNK_KEY)
            };
            if let Err(error) = written {
                let mut stranded = Vec::new();
                for (undo_id, undo) in pending[..index].iter().rev() {
                    let restored = if junk {
                        self.store.delete_attribute(undo, JUNK_KEY)
                    } else {
                        self.store.write_attribute(undo, JUNK_KEY, AttrValue::Int(1))
                    };
                    if let Err(undo_error) = restored {
                        warn!(path = %undo, error = %undo_error, "failed to roll back junk marker");
                        stranded.push((*undo_id, undo.clone()));
                    }
                }
                if !stranded.is_empty() {
                    self.resync_junk(&stranded);
                }
                return Err(error.into());
            }
        }

        let nodes = pending.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        for id in &nodes {
            if let Some(node) = self.tree.node_mut(*id) {
                node.junk = junk;
            }
        }
        info!(count = nodes.len(), junk, "updated junk markers");
        self.commit(ChangeEvent::JunkChanged { nodes, junk });
        Ok(())
    }

    /// Makes the junk flags of `nodes` agree with the markers the store holds.
    fn resync_junk(&mut self, nodes: &[(NodeId, String)]) {
        for (id, path) in nodes {
            let marked = self
                .store
                .attributes(path)
                .map(|attrs| attrs.iter().any(|(key, _)| key == JUNK_KEY))
                .unwrap_or(false);
            if let Some(node) = self.tree.node_mut(*id) {
                node.junk = marked;
            }
        }
        self.filter.refresh(&self.tree);
    }

    /// Links dimension 0 of `target` to `axis`. Whole shapes must match.
    pub fn attach_axis(
        &mut self,
        target: NodeId,
        axis: NodeId,
        label: &str,
    ) -> Result<(), EditError> {
        self.try_attach_axis(target, axis, label)
            .inspect_err(|error| warn!(%error, "axis attach rejected"))
    }

    fn try_attach_axis(&mut self, target: NodeId, axis: NodeId, label: &str) -> Result<(), EditError> {
        let target_shape = self.dataset_shape(target)?;
        let axis_shape = self.dataset_shape(axis)?;
        if target == axis {
            return Err(EditError::SameDataset);
        }
        if target_shape != axis_shape {
            return Err(EditError::ShapeMismatch {
                target: target_shape,
                axis: axis_shape,
            });
        }

        let target_path = self.node(target)?.path.clone();
        let axis_path = self.node(axis)?.path.clone();
        self.store.attach_scale(&target_path, &axis_path, 0, label)?;

        if let Some(NodeKind::Dataset(dataset)) =
            self.tree.node_mut(target).map(|node| &mut node.kind)
        {
            dataset.axes.retain(|link| link.dim != 0);
            dataset.axes.insert(
                0,
                AxisLink {
                    dim: 0,
                    label: label.to_owned(),
                    dataset: axis,
                },
            );
        }
        info!(dataset = %target_path, axis = %axis_path, %label, "attached axis");
        self.commit(ChangeEvent::AxisAttached { target, axis });
        Ok(())
    }

    fn dataset_shape(&self, id: NodeId) -> Result<Vec<usize>, EditError> {
        let node = self.node(id)?;
        node.dataset()
            .map(|dataset| dataset.shape.clone())
            .ok_or_else(|| EditError::WrongKind {
                path: node.path.clone(),
                expected: "dataset",
            })
    }

    /// Store path of the entry owning attribute `id`, and the attribute key.
    fn attribute_owner(&self, id: NodeId) -> Result<(String, String), EditError> {
        let node = self.node(id)?;
        if !node.is_attribute() {
            return Err(EditError::WrongKind {
                path: node.path.clone(),
                expected: "attribute",
            });
        }
        let owner = node
            .parent
            .and_then(|parent| self.tree.path_of(parent))
            .unwrap_or("/")
            .to_owned();
        Ok((owner, node.name.clone()))
    }
}
