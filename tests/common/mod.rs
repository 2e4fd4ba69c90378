#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use h5view::{ArrayData, AttrValue, ChangeEvent, MemoryStore, NodeId, Store, Workspace};

pub fn array(shape: &[usize]) -> ArrayData {
    let len = shape.iter().product::<usize>();
    ArrayData::new(shape.to_vec(), (0..len).map(|value| value as f64).collect()).unwrap()
}

/// ```text
/// /A            words="hello"
/// /A/B
/// /A/B/C
/// /A/B/C/Simple Data   (25,)  number=42
/// /A/B/C/R Values      (25,)
/// /A/B/C/Image Data    (5, 5)
/// /ab/z                (3,)
/// ```
pub fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.create_group("/A").unwrap();
    store
        .write_attribute("/A", "words", AttrValue::Str("hello".into()))
        .unwrap();
    store.create_group("/A/B").unwrap();
    store.create_group("/A/B/C").unwrap();
    store.create_dataset("/A/B/C/Simple Data", array(&[25])).unwrap();
    store
        .write_attribute("/A/B/C/Simple Data", "number", AttrValue::Int(42))
        .unwrap();
    store.create_dataset("/A/B/C/R Values", array(&[25])).unwrap();
    store.create_dataset("/A/B/C/Image Data", array(&[5, 5])).unwrap();
    store.create_group("/ab").unwrap();
    store.create_dataset("/ab/z", array(&[3])).unwrap();
    store
}

pub fn sample_workspace() -> Workspace<MemoryStore> {
    Workspace::open(sample_store()).unwrap()
}

pub fn id<S: Store>(workspace: &Workspace<S>, path: &str) -> NodeId {
    workspace
        .tree()
        .find_by_path(path)
        .unwrap_or_else(|| panic!("no entry at {path}"))
}

pub fn paths<S: Store>(workspace: &Workspace<S>) -> Vec<String> {
    workspace
        .tree()
        .iter()
        .map(|(_, node)| node.path.clone())
        .collect()
}

pub fn record<S: Store>(workspace: &mut Workspace<S>) -> Rc<RefCell<Vec<ChangeEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    workspace.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}
