use crate::tree::{EntityTree, NodeId};

/// Datasets other than `target` whose shape equals the target's exactly.
pub fn find_axis_candidates(tree: &EntityTree, target: NodeId) -> Vec<NodeId> {
    let Some(shape) = tree
        .get(target)
        .and_then(|node| node.dataset())
        .map(|dataset| dataset.shape.as_slice())
    else {
        return Vec::new();
    };

    tree.iter()
        .filter(|(id, node)| {
            *id != target
                && node
                    .dataset()
                    .is_some_and(|dataset| dataset.shape.as_slice() == shape)
        })
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArrayData, MemoryStore, Store};
    use crate::tree::build;

    fn array(shape: Vec<usize>) -> ArrayData {
        let len = shape.iter().product();
        ArrayData::new(shape, vec![0.0; len]).unwrap()
    }

    #[test]
    fn only_identical_shapes_qualify() {
        let mut store = MemoryStore::new();
        store.create_dataset("/target", array(vec![4, 3])).unwrap();
        store.create_dataset("/same", array(vec![4, 3])).unwrap();
        store.create_dataset("/transposed", array(vec![3, 4])).unwrap();
        store.create_dataset("/prefix", array(vec![4])).unwrap();
        store.create_group("/g").unwrap();
        store.create_dataset("/g/nested", array(vec![4, 3])).unwrap();
        let tree = build(&store).unwrap();

        let target = tree.find_by_path("/target").unwrap();
        let paths = find_axis_candidates(&tree, target)
            .into_iter()
            .filter_map(|id| tree.path_of(id))
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["/same", "/g/nested"]);
    }

    #[test]
    fn groups_have_no_candidates() {
        let mut store = MemoryStore::new();
        store.create_group("/g").unwrap();
        let tree = build(&store).unwrap();
        assert!(find_axis_candidates(&tree, tree.find_by_path("/g").unwrap()).is_empty());
    }
}
