pub mod shape;
pub mod vector;

pub use shape::*;
pub use vector::*;
