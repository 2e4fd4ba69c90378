//! Row model for tree widgets.
//!
//! Flattens the filtered tree into the rows a UI draws, with the label,
//! the second column and the background highlight for each row.

use std::collections::HashSet;

use crate::filter::MatchEngine;
use crate::tree::{EntityTree, NodeId, NodeKind};
use crate::util::format_shape;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    None,
    OpenView,
    Attribute,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: NodeId,
    pub depth: usize,
    pub label: String,
    /// Shape for datasets, value for attributes, empty for groups.
    pub detail: String,
    pub highlight: Highlight,
    pub junk: bool,
    pub has_children: bool,
    pub expanded: bool,
}

pub fn row_for(tree: &EntityTree, id: NodeId) -> Option<(String, String, Highlight)> {
    let node = tree.get(id)?;
    Some(match &node.kind {
        NodeKind::Group => (node.name.clone(), String::new(), Highlight::None),
        NodeKind::Dataset(dataset) => {
            let highlight = if dataset.plot.is_some() {
                Highlight::OpenView
            } else {
                Highlight::None
            };
            (node.name.clone(), format_shape(&dataset.shape), highlight)
        }
        NodeKind::Attribute(value) => (node.name.clone(), value.to_string(), Highlight::Attribute),
    })
}

/// Accepted rows in display order. Children of collapsed nodes are skipped.
pub fn visible_rows(
    tree: &EntityTree,
    filter: &MatchEngine,
    expanded: &HashSet<NodeId>,
) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut stack = accepted_children(tree, filter, tree.root())
        .into_iter()
        .rev()
        .map(|id| (id, 0usize))
        .collect::<Vec<_>>();

    while let Some((id, depth)) = stack.pop() {
        let Some((label, detail, highlight)) = row_for(tree, id) else {
            continue;
        };
        let children = accepted_children(tree, filter, id);
        let is_expanded = expanded.contains(&id);

        rows.push(VisibleRow {
            id,
            depth,
            label,
            detail,
            highlight,
            junk: tree.is_junk(id),
            has_children: !children.is_empty(),
            expanded: is_expanded,
        });

        if is_expanded {
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
    }
    rows
}

/// Every node that has children, for an "expand all" action.
pub fn expandable_nodes(tree: &EntityTree) -> HashSet<NodeId> {
    tree.find_all(|node| !node.children.is_empty())
        .into_iter()
        .collect()
}

fn accepted_children(tree: &EntityTree, filter: &MatchEngine, id: NodeId) -> Vec<NodeId> {
    tree.get(id)
        .map(|node| {
            node.children
                .iter()
                .copied()
                .filter(|child| filter.accepts(tree, *child))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArrayData, AttrValue, MemoryStore, Store};
    use crate::tree::build;

    fn tree() -> EntityTree {
        let mut store = MemoryStore::new();
        store.create_group("/g").unwrap();
        store.write_attribute("/g", "unit", AttrValue::Str("m".into())).unwrap();
        store
            .create_dataset("/g/d", ArrayData::new(vec![2, 3], vec![0.0; 6]).unwrap())
            .unwrap();
        store.create_group("/h").unwrap();
        build(&store).unwrap()
    }

    #[test]
    fn collapsed_nodes_hide_children() {
        let tree = tree();
        let filter = MatchEngine::new(&tree);
        let rows = visible_rows(&tree, &filter, &HashSet::new());
        let labels = rows.iter().map(|row| row.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["g", "h"]);
        assert!(rows[0].has_children);
        assert!(!rows[1].has_children);
    }

    #[test]
    fn expanded_rows_carry_depth_detail_and_highlight() {
        let tree = tree();
        let filter = MatchEngine::new(&tree);
        let rows = visible_rows(&tree, &filter, &expandable_nodes(&tree));
        let summary = rows
            .iter()
            .map(|row| (row.label.as_str(), row.depth, row.detail.as_str(), row.highlight))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("g", 0, "", Highlight::None),
                ("unit", 1, "m", Highlight::Attribute),
                ("d", 1, "(2, 3)", Highlight::None),
                ("h", 0, "", Highlight::None),
            ]
        );
    }

    #[test]
    fn filtered_out_children_do_not_count() {
        let tree = tree();
        let mut filter = MatchEngine::new(&tree);
        filter.set_query(&tree, "h");
        let rows = visible_rows(&tree, &filter, &expandable_nodes(&tree));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "h");
    }
}
