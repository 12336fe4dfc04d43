pub mod agents;
pub mod arena;
pub mod collision;
pub mod geometry;
pub mod logger;
pub mod messaging;
pub mod placement;
pub mod ports;
pub mod spatial;
pub mod spin_lattice;

pub use logger::*;
pub use ports::*;
