//! Tracks props around the player, classifies their movement relative to the
//! player's view and narrates batches of observations through an LLM.

pub mod adapters;
pub mod application;
pub mod common;
pub mod config;
pub mod domains;

pub use application::{HudFeed, NarrationService};
pub use config::Config;

pub use common::*;
pub use domains::*;
