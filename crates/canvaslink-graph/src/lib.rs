pub mod editor;
pub mod model;

pub use editor::{GraphEditor, Selection};
pub use model::{Edge, GraphModel, GraphSnapshot, Node};
