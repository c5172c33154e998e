//! Graph storage: element ids, indexed sets, canonical topology, and the
//! subgraph-view hierarchy built on top of them.

pub mod element;
pub mod event;
pub mod hierarchy;
pub mod id_alloc;
pub mod id_set;
pub mod incidence;
pub mod storage;

pub use element::{EdgeId, GraphId, NodeId};
pub use event::GraphEvent;
pub use hierarchy::GraphHierarchy;
pub use id_alloc::{IdAllocator, IdAllocatorState};
pub use id_set::{DenseIdSet, IndexedSet, SparseIdSet};
pub use incidence::IncidenceRecord;
pub use storage::GraphStorage;
