pub mod adapter;
pub mod model;
pub mod raw;
pub mod sample;

pub use adapter::{NormalizeOptions, normalize};
pub use model::{EdgeType, GraphCategory, GraphEdge, GraphModel, GraphNode, NodeType};
pub use raw::Subject;
