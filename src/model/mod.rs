pub mod config;
pub mod forest;
pub mod node;
pub mod outline;

pub use config::*;
pub use forest::*;
pub use node::*;
pub use outline::*;
