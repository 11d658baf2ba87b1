pub mod aggregate;
pub mod error;
pub mod event;
pub mod tick;
pub mod vector;

pub use aggregate::*;
pub use error::*;
pub use event::*;
pub use tick::*;
pub use vector::*;
