//! Search and visibility filtering over an [`EntityTree`].
//!
//! A query is split on whitespace. Each term selects the nodes whose full
//! path contains it (case-sensitive). The match set is the intersection over
//! all terms, then closed upward so every ancestor of a match stays visible.

use std::collections::HashSet;

use tracing::debug;

use crate::tree::{EntityTree, NodeId};

pub fn match_terms(tree: &EntityTree, terms: &[&str]) -> HashSet<NodeId> {
    tree.iter()
        .filter(|(_, node)| terms.iter().all(|term| node.path.contains(term)))
        .map(|(id, _)| id)
        .collect()
}

/// Adds every ancestor of every member, the root excepted.
pub fn close_ancestors(tree: &EntityTree, matches: &HashSet<NodeId>) -> HashSet<NodeId> {
    let root = tree.root();
    let mut closed = matches.clone();
    closed.remove(&root);

    for &id in matches {
        for ancestor in tree.ancestors(id) {
            if ancestor == root || !closed.insert(ancestor) {
                break;
            }
        }
    }
    closed
}

#[derive(Clone, Debug)]
pub struct MatchEngine {
    query: String,
    attrs_visible: bool,
    junk_visible: bool,
    matching_items: HashSet<NodeId>,
}

impl MatchEngine {
    pub fn new(tree: &EntityTree) -> Self {
        let mut engine = Self {
            query: String::new(),
            attrs_visible: true,
            junk_visible: false,
            matching_items: HashSet::new(),
        };
        engine.refresh(tree);
        engine
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn attrs_visible(&self) -> bool {
        self.attrs_visible
    }

    pub fn junk_visible(&self) -> bool {
        self.junk_visible
    }

    /// Closed match set of the current query.
    pub fn matching_items(&self) -> &HashSet<NodeId> {
        &self.matching_items
    }

    pub fn set_query(&mut self, tree: &EntityTree, query: &str) {
        self.query = query.to_owned();
        self.refresh(tree);
    }

    pub fn set_attrs_visible(&mut self, visible: bool) {
        self.attrs_visible = visible;
    }

    pub fn set_junk_visible(&mut self, visible: bool) {
        self.junk_visible = visible;
    }

    /// Re-runs the current query, e.g. after the tree was edited or rebuilt.
    pub fn refresh(&mut self, tree: &EntityTree) {
        let terms = self.query.split_whitespace().collect::<Vec<_>>();
        let matches = match_terms(tree, &terms);
        self.matching_items = close_ancestors(tree, &matches);
        debug!(
            query = %self.query,
            matched = matches.len(),
            visible = self.matching_items.len(),
            "recomputed match set"
        );
    }

    pub fn accepts(&self, tree: &EntityTree, id: NodeId) -> bool {
        let Some(node) = tree.get(id) else {
            return false;
        };
        if node.is_attribute() && !self.attrs_visible {
            return false;
        }
        if !self.junk_visible && tree.is_junk(id) {
            return false;
        }
        self.matching_items.contains(&id)
    }
}
