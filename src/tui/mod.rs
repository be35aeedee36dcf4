pub mod app;
pub mod input;
pub mod render;
pub mod theme;

pub use app::run;

#[cfg(test)]
pub(crate) mod test_helpers;
