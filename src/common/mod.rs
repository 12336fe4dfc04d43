pub mod error;
pub mod report;
pub mod rng;
pub mod snapshot;

pub use error::*;
pub use report::*;
pub use rng::*;
pub use snapshot::*;
