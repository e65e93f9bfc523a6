#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Engine for paced, branching chat narratives written in murmur script.
//!
//! A [`Story`] is loaded once and shared by every conversation. Each incoming
//! message becomes a turn run by the [`Narrator`]: it plays the story from the
//! conversation's saved position (or answers the choice it stopped on) and
//! streams the resulting lines back through a bounded channel.

pub const MURMUR_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod context;
pub mod data_paths;
pub mod error;
pub mod eval;
pub mod lock;
pub mod store;
pub mod story;
pub mod turn;

pub use config::{EngineConfig, load_config};
pub use context::{OutputSink, TurnContext};
pub use error::{StoryError, TurnError};
pub use lock::{SessionGuard, SessionLocks};
pub use store::{FileStore, MemoryStore, StateKey, StateStore, StoreError};
pub use story::{Story, StorySettings, load_story};
pub use turn::{Narrator, TurnHandle, TurnOutcome, TurnSettings};
