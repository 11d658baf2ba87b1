pub mod aggregate;
pub mod events;
pub mod ports;

pub use aggregate::*;
pub use events::*;
pub use ports::*;
