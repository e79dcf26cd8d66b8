mod operator;

pub use operator::*;
