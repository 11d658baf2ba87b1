pub mod environment;
pub mod history;
pub mod logger;
pub mod narration;
pub mod relativity;
pub mod tracking;

pub use environment::*;
pub use history::*;
pub use logger::*;
pub use narration::*;
pub use relativity::*;
pub use tracking::*;
