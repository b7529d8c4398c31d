pub mod screen;
pub mod wrap;
