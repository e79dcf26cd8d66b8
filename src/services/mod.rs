mod display;
mod operators;

pub use display::*;
pub use operators::*;
