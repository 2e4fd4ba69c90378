use tracing::{debug, info};

use crate::error::EditError;
use crate::store::{ArrayData, Store};
use crate::tree::{NodeId, NodeKind, PlotHandle};

use super::{ChangeEvent, Workspace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotKind {
    Line,
    Image,
    Movie,
}

impl PlotKind {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Line),
            2 => Some(Self::Image),
            3 => Some(Self::Movie),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Image => "image",
            Self::Movie => "movie",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisSeries {
    pub label: String,
    pub data: ArrayData,
}

/// Everything a plot surface needs to show one dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewRequest {
    pub handle: PlotHandle,
    pub node: NodeId,
    pub title: String,
    pub kind: PlotKind,
    pub data: ArrayData,
    pub axis: Option<AxisSeries>,
}

impl<S: Store> Workspace<S> {
    /// Returns `None` when the dataset already has an open view.
    pub fn open_view(&mut self, id: NodeId) -> Result<Option<ViewRequest>, EditError> {
        let node = self.node(id)?;
        let Some(dataset) = node.dataset() else {
            return Err(EditError::WrongKind {
                path: node.path.clone(),
                expected: "dataset",
            });
        };
        if dataset.plot.is_some() {
            return Ok(None);
        }
        let kind = PlotKind::for_rank(dataset.shape.len())
            .ok_or(EditError::Unplottable(dataset.shape.len()))?;

        let path = node.path.clone();
        let title = node.name.clone();
        let axis_link = dataset.axis(0).cloned();
        let data = self.store.read_array(&path)?;

        let axis = axis_link.and_then(|link| {
            let axis_path = self.tree.path_of(link.dataset)?;
            match self.store.read_array(axis_path) {
                Ok(data) => Some(AxisSeries {
                    label: link.label,
                    data,
                }),
                Err(error) => {
                    debug!(%path, %axis_path, %error, "axis data unavailable");
                    None
                }
            }
        });

        let handle = PlotHandle(self.next_handle);
        self.next_handle += 1;
        if let Some(NodeKind::Dataset(dataset)) = self.tree.node_mut(id).map(|node| &mut node.kind)
        {
            dataset.plot = Some(handle);
        }
        info!(%path, kind = kind.label(), "opened view");
        self.commit(ChangeEvent::ViewOpened { node: id, handle });

        Ok(Some(ViewRequest {
            handle,
            node: id,
            title,
            kind,
            data,
            axis,
        }))
    }

    /// Forgets `handle`. Handles from before a reload are ignored.
    pub fn close_view(&mut self, handle: PlotHandle) -> bool {
        let owner = self
            .tree
            .find_all(|node| node.dataset().is_some_and(|dataset| dataset.plot == Some(handle)));
        let Some(&id) = owner.first() else {
            return false;
        };

        if let Some(NodeKind::Dataset(dataset)) = self.tree.node_mut(id).map(|node| &mut node.kind)
        {
            dataset.plot = None;
        }
        self.commit(ChangeEvent::ViewClosed { node: id, handle });
        true
    }

    pub fn open_views(&self) -> Vec<(NodeId, PlotHandle)> {
        self.tree
            .iter()
            .filter_map(|(id, node)| Some((id, node.dataset()?.plot?)))
            .collect()
    }
}
