pub mod buffered_logger;
pub mod completions;
pub mod file_logger;
pub mod multi_logger;
pub mod noop_logger;
pub mod openai_chat;
pub mod response_file;
pub mod tracing_logger;

pub use buffered_logger::*;
pub use completions::*;
pub use file_logger::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use openai_chat::*;
pub use response_file::*;
pub use tracing_logger::*;
