pub mod bus;
pub mod message;

pub use bus::*;
pub use message::*;
