//! Engine configuration loaded from `murmur.toml`.
//!
//! Every field is optional. A file that cannot be read or parsed is reported
//! and replaced with the defaults, so a broken config never keeps the engine
//! from starting.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::story::StorySettings;
use crate::turn::TurnSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Story script to load. Relative paths are resolved against the config file.
    pub script: PathBuf,
    pub start_section: String,
    pub restart_keyword: String,
    pub text_pause_ms: u64,
    pub jump_pause_ms: u64,
    pub max_transitions: usize,
    pub output_capacity: usize,
    /// RON file for conversation state; in-memory when unset.
    pub store: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let story = StorySettings::default();
        let turn = TurnSettings::default();
        Self {
            script: PathBuf::from("demo.story"),
            start_section: story.start_section,
            restart_keyword: turn.restart_keyword,
            text_pause_ms: millis(story.text_pause),
            jump_pause_ms: millis(story.jump_pause),
            max_transitions: story.max_transitions,
            output_capacity: turn.output_capacity,
            store: None,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl EngineConfig {
    pub fn story_settings(&self) -> StorySettings {
        StorySettings {
            start_section: self.start_section.clone(),
            text_pause: Duration::from_millis(self.text_pause_ms),
            jump_pause: Duration::from_millis(self.jump_pause_ms),
            max_transitions: self.max_transitions,
        }
    }

    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            restart_keyword: self.restart_keyword.clone(),
            output_capacity: self.output_capacity.max(1),
        }
    }

    /// Resolve relative `script` and `store` paths against `base`.
    fn rebase(mut self, base: &Path) -> Self {
        if self.script.is_relative() {
            self.script = base.join(&self.script);
        }
        if let Some(store) = self.store.as_mut()
            && store.is_relative()
        {
            *store = base.join(&*store);
        }
        self
    }
}

/// Parse config text.
///
/// # Errors
/// Returns an error on malformed TOML, wrong value types or unknown keys.
pub fn parse_config(text: &str) -> Result<EngineConfig> {
    toml::from_str(text).context("parsing engine config")
}

/// Load the config at `path`, falling back to defaults on any error.
///
/// Relative paths inside the file are taken relative to the file's directory.
pub fn load_config(path: &Path) -> EngineConfig {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    match try_load_config(path) {
        Ok(config) => {
            info!("engine config loaded from '{}'", path.display());
            config.rebase(base)
        },
        Err(e) => {
            warn!(
                "Could not load engine config from '{}': {e:#}. Using defaults.",
                path.display()
            );
            EngineConfig::default().rebase(base)
        },
    }
}

fn try_load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    parse_config(&text)
}
