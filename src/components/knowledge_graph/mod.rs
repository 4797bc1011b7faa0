//! Canvas explorer for knowledge graphs: layout, interaction and mutation panels.

mod component;
mod panels;
mod render;
pub mod scene;
mod state;
pub mod types;

pub use component::KnowledgeGraphExplorer;
pub use types::{FilterChange, Status};
