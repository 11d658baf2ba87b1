pub mod hud_service;
pub mod narration_service;

pub use hud_service::*;
pub use narration_service::*;
