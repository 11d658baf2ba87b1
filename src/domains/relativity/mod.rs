pub mod classifier;
pub mod observation;

pub use classifier::*;
pub use observation::*;
