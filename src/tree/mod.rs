//! In-memory mirror of the backing store.
//!
//! Nodes live in an arena owned by [`EntityTree`]; children are listed by id
//! and parents are plain id back-references, so the tree can be walked in
//! both directions without shared ownership. The root is the invisible
//! anchor at `/`: it never matches a query and is never shown as a row.

mod build;
mod node;

pub use build::build;
pub use node::{AxisLink, DatasetNode, Node, NodeId, NodeKind, PlotHandle};

use crate::store::join_path;

#[derive(Clone, Debug)]
pub struct EntityTree {
    nodes: Vec<Node>,
}

impl EntityTree {
    pub(crate) fn with_root() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                path: "/".to_owned(),
                parent: None,
                children: Vec::new(),
                junk: false,
                kind: NodeKind::Group,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Pre-order walk below `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.get(id) else {
            return out;
        };

        let mut stack = node.children.iter().rev().copied().collect::<Vec<_>>();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Every node except the root, pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.descendants(self.root())
            .into_iter()
            .map(|id| (id, &self.nodes[id.0]))
    }

    pub fn find_all(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| predicate(node))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|node| node.path.as_str())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Parents of `id` from the nearest up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_of(id), |current| self.parent_of(*current))
    }

    pub fn is_junk(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| node.junk)
            || self.ancestors(id).any(|ancestor| self.nodes[ancestor.0].junk)
    }

    /// Group or dataset at `path`. Attribute rows are not addressable this way.
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        if path == "/" {
            return Some(self.root());
        }
        self.iter()
            .find(|(_, node)| !node.is_attribute() && node.path == path)
            .map(|(id, _)| id)
    }

    pub fn attribute_of(&self, owner: NodeId, key: &str) -> Option<NodeId> {
        self.attribute_children(owner)
            .find(|id| self.nodes[id.0].name == key)
    }

    pub fn attribute_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(id, true)
    }

    pub fn entry_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(id, false)
    }

    fn children_where(&self, id: NodeId, attributes: bool) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |child| self.nodes[child.0].is_attribute() == attributes)
    }

    /// Names of the other nodes of the same variant under the same parent:
    /// sibling entries for groups and datasets, sibling keys for attributes.
    pub fn sibling_names(&self, id: NodeId) -> Vec<&str> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let Some(parent) = node.parent else {
            return Vec::new();
        };
        self.children_where(parent, node.is_attribute())
            .filter(|sibling| *sibling != id)
            .map(|sibling| self.nodes[sibling.0].name.as_str())
            .collect()
    }

    pub(crate) fn push(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let path = join_path(&self.nodes[parent.0].path, name);
        self.nodes.push(Node {
            name: name.to_owned(),
            path,
            parent: Some(parent),
            children: Vec::new(),
            junk: false,
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Renames `id` and recomputes the paths of its whole subtree.
    pub(crate) fn set_name(&mut self, id: NodeId, name: &str) {
        let parent_path = self
            .parent_of(id)
            .map(|parent| self.nodes[parent.0].path.clone())
            .unwrap_or_else(|| "/".to_owned());
        let node = &mut self.nodes[id.0];
        node.name = name.to_owned();
        node.path = join_path(&parent_path, name);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let base = self.nodes[current.0].path.clone();
            for child in self.nodes[current.0].children.clone() {
                let child_node = &mut self.nodes[child.0];
                child_node.path = join_path(&base, &child_node.name);
                stack.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AttrValue;

    fn sample() -> (EntityTree, NodeId, NodeId, NodeId) {
        let mut tree = EntityTree::with_root();
        let root = tree.root();
        let group = tree.push(root, "g", NodeKind::Group);
        let attr = tree.push(group, "k", NodeKind::Attribute(AttrValue::Int(1)));
        let dataset = tree.push(
            group,
            "d",
            NodeKind::Dataset(DatasetNode {
                shape: vec![2],
                plot: None,
                axes: Vec::new(),
            }),
        );
        (tree, group, attr, dataset)
    }

    #[test]
    fn paths_concatenate_ancestor_names() {
        let (tree, group, attr, dataset) = sample();
        assert_eq!(tree.path_of(group), Some("/g"));
        assert_eq!(tree.path_of(attr), Some("/g/k"));
        assert_eq!(tree.path_of(dataset), Some("/g/d"));
        assert_eq!(tree.parent_of(dataset), Some(group));
        assert_eq!(tree.parent_of(tree.root()), None);
    }

    #[test]
    fn set_name_repaths_descendants() {
        let (mut tree, group, attr, dataset) = sample();
        tree.set_name(group, "renamed");
        assert_eq!(tree.path_of(attr), Some("/renamed/k"));
        assert_eq!(tree.path_of(dataset), Some("/renamed/d"));
        assert_eq!(tree.find_by_path("/renamed/d"), Some(dataset));
        assert_eq!(tree.find_by_path("/g/d"), None);
    }

    #[test]
    fn find_all_is_pre_order_without_root() {
        let (tree, group, attr, dataset) = sample();
        assert_eq!(tree.find_all(|_| true), vec![group, attr, dataset]);
        assert_eq!(tree.find_all(Node::is_dataset), vec![dataset]);
    }

    #[test]
    fn junk_is_inherited() {
        let (mut tree, group, attr, dataset) = sample();
        assert!(!tree.is_junk(dataset));
        tree.node_mut(group).unwrap().junk = true;
        assert!(tree.is_junk(group));
        assert!(tree.is_junk(attr));
        assert!(tree.is_junk(dataset));
        assert!(!tree.is_junk(tree.root()));
    }

    #[test]
    fn sibling_names_are_scoped_by_variant() {
        let (tree, group, attr, dataset) = sample();
        assert!(tree.sibling_names(attr).is_empty());
        assert!(tree.sibling_names(dataset).is_empty());
        assert!(tree.sibling_names(group).is_empty());
        assert_eq!(tree.attribute_of(group, "k"), Some(attr));
    }
}
