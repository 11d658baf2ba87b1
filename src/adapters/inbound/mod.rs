pub mod file_event_journal;
pub mod in_memory_journal;
pub mod scene_world;

pub use file_event_journal::*;
pub use in_memory_journal::*;
pub use scene_world::*;
