//! An open data file: store, entity tree and match state kept in step.
//!
//! All edits go through [`Workspace`]. An edit validates against the tree,
//! writes the store, updates the tree, recomputes the match set and only
//! then tells subscribers. A rejected edit changes nothing and notifies no
//! one.

use tracing::info;

use crate::correlate::{Correlation, PropertyIndex, correlate};
use crate::error::{CorrelateError, EditError, LoadError};
use crate::filter::MatchEngine;
use crate::store::Store;
use crate::tree::{EntityTree, Node, NodeId, PlotHandle, build};

mod edit;
mod views;

pub use views::{AxisSeries, PlotKind, ViewRequest};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    Renamed { node: NodeId, old_path: String },
    AttributeRenamed { node: NodeId, old_key: String },
    AttributeValueChanged { node: NodeId },
    JunkChanged { nodes: Vec<NodeId>, junk: bool },
    AxisAttached { target: NodeId, axis: NodeId },
    ViewOpened { node: NodeId, handle: PlotHandle },
    ViewClosed { node: NodeId, handle: PlotHandle },
    Reloaded,
}

type Subscriber = Box<dyn FnMut(&ChangeEvent)>;

pub struct Workspace<S: Store> {
    store: S,
    tree: EntityTree,
    filter: MatchEngine,
    subscribers: Vec<Subscriber>,
    next_handle: u64,
}

impl<S: Store> Workspace<S> {
    pub fn open(store: S) -> Result<Self, LoadError> {
        let tree = build(&store)?;
        let filter = MatchEngine::new(&tree);
        info!(location = %store.location(), nodes = tree.len(), "opened workspace");
        Ok(Self {
            store,
            tree,
            filter,
            subscribers: Vec::new(),
            next_handle: 1,
        })
    }

    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn filter(&self) -> &MatchEngine {
        &self.filter
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&ChangeEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn set_query(&mut self, query: &str) {
        if query != self.filter.query() {
            self.filter.set_query(&self.tree, query);
        }
    }

    pub fn set_attrs_visible(&mut self, visible: bool) {
        self.filter.set_attrs_visible(visible);
    }

    pub fn set_junk_visible(&mut self, visible: bool) {
        self.filter.set_junk_visible(visible);
    }

    pub fn accepts(&self, id: NodeId) -> bool {
        self.filter.accepts(&self.tree, id)
    }

    /// Rereads the store and rebuilds the tree, keeping the current query.
    /// On failure the previous tree stays in place.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.store.reload()?;
        let tree = build(&self.store)?;
        self.tree = tree;
        info!(location = %self.store.location(), nodes = self.tree.len(), "reloaded workspace");
        self.commit(ChangeEvent::Reloaded);
        Ok(())
    }

    /// Reloads when the store reports an outside modification.
    pub fn reload_if_changed(&mut self) -> Result<bool, LoadError> {
        if !self.store.changed_on_disk() {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    pub fn property_index(&self) -> PropertyIndex {
        PropertyIndex::build(&self.tree)
    }

    pub fn correlate(&self, key1: &str, key2: &str) -> Result<Correlation, CorrelateError> {
        correlate(&self.tree, &self.store, key1, key2)
    }

    fn node(&self, id: NodeId) -> Result<&Node, EditError> {
        self.tree.get(id).ok_or(EditError::UnknownNode(id))
    }

    fn commit(&mut self, event: ChangeEvent) {
        self.filter.refresh(&self.tree);
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }
}
