pub mod markup;
pub mod wrappers;

pub use wrappers::*;
