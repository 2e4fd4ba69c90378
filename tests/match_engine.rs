mod common;

use std::collections::HashSet;

use h5view::{
    EntityTree, MatchEngine, MemoryStore, NodeId, Store, Workspace, close_ancestors, match_terms,
};
use proptest::prelude::*;

fn tree_from(entries: &[(usize, u8, bool)]) -> EntityTree {
    let mut store = MemoryStore::new();
    let mut groups = vec!["/".to_owned()];
    for (index, (parent, letter, is_group)) in entries.iter().enumerate() {
        let parent = &groups[parent % groups.len()];
        let name = format!("{}{index}", ["a", "b", "ab", "x"][usize::from(*letter) % 4]);
        let path = if parent == "/" {
            format!("/{name}")
        } else {
            format!("{parent}/{name}")
        };
        if *is_group {
            store.create_group(&path).unwrap();
            groups.push(path);
        } else {
            store.create_dataset(&path, common::array(&[2])).unwrap();
        }
    }
    h5view::tree::build(&store).unwrap()
}

fn entries() -> impl Strategy<Value = Vec<(usize, u8, bool)>> {
    prop::collection::vec((0usize..16, 0u8..4, any::<bool>()), 0..24)
}

fn ids(tree: &EntityTree, paths: &[&str]) -> HashSet<NodeId> {
    paths
        .iter()
        .map(|path| tree.find_by_path(path).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn find_all_agrees_with_a_full_walk(entries in entries(), letter in 0u8..4) {
        let tree = tree_from(&entries);
        let needle = ["a", "b", "ab", "x"][usize::from(letter)];
        let found = tree.find_all(|node| node.name.starts_with(needle)).into_iter().collect::<HashSet<_>>();
        let walked = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.get(*id).is_some_and(|node| node.name.starts_with(needle)))
            .collect::<HashSet<_>>();
        prop_assert_eq!(found, walked);
    }

    #[test]
    fn ancestor_closure_is_a_fixed_point(entries in entries(), letter in 0u8..4) {
        let tree = tree_from(&entries);
        let term = ["a", "b", "ab", "x"][usize::from(letter)];
        let closed = close_ancestors(&tree, &match_terms(&tree, &[term]));
        prop_assert_eq!(close_ancestors(&tree, &closed), closed.clone());
        prop_assert!(!closed.contains(&tree.root()));
    }

    #[test]
    fn terms_intersect(entries in entries()) {
        let tree = tree_from(&entries);
        let both = match_terms(&tree, &["a", "b"]);
        let a = match_terms(&tree, &["a"]);
        let b = match_terms(&tree, &["b"]);
        prop_assert_eq!(both, a.intersection(&b).copied().collect::<HashSet<_>>());
    }

    #[test]
    fn empty_query_matches_every_node(entries in entries(), blanks in "[ \t]{0,3}") {
        let tree = tree_from(&entries);
        let mut engine = MatchEngine::new(&tree);
        engine.set_query(&tree, &blanks);
        let everything = tree.iter().map(|(id, _)| id).collect::<HashSet<_>>();
        prop_assert_eq!(engine.matching_items(), &everything);
    }
}

#[test]
fn query_terms_are_anded_not_ored() {
    let mut store = MemoryStore::new();
    for group in ["/a", "/b", "/ab"] {
        store.create_group(group).unwrap();
    }
    store.create_group("/a/x").unwrap();
    store.create_group("/b/y").unwrap();
    store.create_group("/ab/z").unwrap();
    let mut workspace = Workspace::open(store).unwrap();

    workspace.set_query("a b");
    let tree = workspace.tree();
    assert_eq!(
        workspace.filter().matching_items(),
        &ids(tree, &["/ab", "/ab/z"])
    );
    assert!(!workspace.accepts(tree.find_by_path("/a/x").unwrap()));
    assert!(!workspace.accepts(tree.find_by_path("/b/y").unwrap()));
}

#[test]
fn matching_is_case_sensitive() {
    let workspace = {
        let mut workspace = common::sample_workspace();
        workspace.set_query("simple");
        workspace
    };
    assert!(workspace.filter().matching_items().is_empty());
}

#[test]
fn attribute_rows_follow_the_toggle() {
    let mut workspace = common::sample_workspace();
    workspace.set_query("words");
    let owner = common::id(&workspace, "/A");
    let attr = workspace.tree().attribute_of(owner, "words").unwrap();

    assert!(workspace.accepts(attr));
    assert!(workspace.accepts(owner));
    workspace.set_attrs_visible(false);
    assert!(!workspace.accepts(attr));
    assert!(workspace.accepts(owner));
}

#[test]
fn edits_refresh_the_match_set() {
    let mut workspace = common::sample_workspace();
    workspace.set_query("Renamed");
    assert!(workspace.filter().matching_items().is_empty());

    let target = common::id(&workspace, "/ab/z");
    workspace.rename(target, "Renamed").unwrap();
    assert!(workspace.accepts(target));
    assert!(workspace.store().entry("/ab/Renamed").is_ok());
}
