//! Searchable, editable model of hierarchical scientific data files.
//!
//! The [`Workspace`] owns a [`Store`], the [`EntityTree`] mirrored from it and
//! the [`MatchEngine`] that decides which rows are visible. Edits go through
//! the workspace so that all three stay consistent.

pub mod axis;
pub mod correlate;
pub mod error;
pub mod filter;
pub mod present;
pub mod store;
pub mod tree;
pub mod util;
pub mod workspace;

pub use axis::find_axis_candidates;
pub use correlate::{CorrelatedPoint, Correlation, PropertyIndex, correlate};
pub use error::{CorrelateError, EditError, LoadError, StoreError};
pub use filter::{MatchEngine, close_ancestors, match_terms};
pub use store::{ArrayData, AttrValue, JsonFileStore, MemoryStore, Store};
pub use tree::{EntityTree, Node, NodeId, NodeKind, PlotHandle};
pub use workspace::{ChangeEvent, PlotKind, ViewRequest, Workspace};
