use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "murmur.toml";

/// Locate the engine config.
///
/// An explicit path always wins, even when it does not exist yet, so a typo
/// shows up as a load warning instead of silently picking another file.
/// Otherwise the first existing candidate is used: the working directory, the
/// bundled `murmur_engine/data`, directories next to the executable, then the
/// platform config directory.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    config_candidates().into_iter().find(|candidate| candidate.is_file())
}

fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(CONFIG_FILE),
        PathBuf::from("murmur_engine/data").join(CONFIG_FILE),
        PathBuf::from("data").join(CONFIG_FILE),
    ];

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join("data").join(CONFIG_FILE));
        if let Some(parent) = dir.parent() {
            candidates.push(parent.join("murmur_engine/data").join(CONFIG_FILE));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("murmur").join(CONFIG_FILE));
    }
    candidates
}
