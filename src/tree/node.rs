use crate::store::AttrValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifier of an open dataset view, handed out by the workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlotHandle(pub(crate) u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisLink {
    pub dim: usize,
    pub label: String,
    pub dataset: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatasetNode {
    pub shape: Vec<usize>,
    pub plot: Option<PlotHandle>,
    pub axes: Vec<AxisLink>,
}

impl DatasetNode {
    pub fn axis(&self, dim: usize) -> Option<&AxisLink> {
        self.axes.iter().find(|link| link.dim == dim)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Dataset(DatasetNode),
    Attribute(AttrValue),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Entry name, or the key for attribute nodes.
    pub name: String,
    pub path: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub junk: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, NodeKind::Attribute(_))
    }

    pub fn is_dataset(&self) -> bool {
        matches!(self.kind, NodeKind::Dataset(_))
    }

    pub fn dataset(&self) -> Option<&DatasetNode> {
        match &self.kind {
            NodeKind::Dataset(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn attribute_value(&self) -> Option<&AttrValue> {
        match &self.kind {
            NodeKind::Attribute(value) => Some(value),
            _ => None,
        }
    }
}
