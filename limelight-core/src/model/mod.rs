mod document;
mod marker;
mod span;
mod tree;

pub use document::Document;
pub use marker::Marker;
pub use span::{AnnotationSpan, ManipulationClass, ManipulationType};
pub use tree::{DocTree, NodeData, NodeId};
