pub mod tree_ops;
pub mod visible;

pub use tree_ops::EditError;
pub use visible::{VisibleRow, list_visible, neighbour, visible_rows};
