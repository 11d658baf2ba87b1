pub mod payload;
pub mod pipeline;
pub mod ports;
pub mod response;
pub mod summary;

pub use payload::*;
pub use pipeline::*;
pub use ports::*;
pub use response::*;
pub use summary::*;
