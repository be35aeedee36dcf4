pub mod editor;
pub mod io;
pub mod model;
pub mod ops;
pub mod timer;
pub mod tui;
pub mod util;
