pub mod snapshot;
pub mod snapshotter;

pub use snapshot::*;
pub use snapshotter::*;
