#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Murmur **
//! Line-based chat front end for murmur stories.
//!
//! Each stdin line is one incoming message: `<conversation> [answer]`.
//! Turns run concurrently; their lines are printed as they arrive.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use murmur_engine::data_paths::find_config;
use murmur_engine::story::CHOICE_SEPARATOR;
use murmur_engine::{
    EngineConfig, FileStore, MURMUR_VERSION, MemoryStore, Narrator, StateStore, TurnHandle, TurnOutcome, load_config,
    load_story,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Play a murmur story as a chat, one stdin line per message.")]
struct Cli {
    /// Engine config file (defaults to the first `murmur.toml` found).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Story script, overriding the config.
    #[arg(long)]
    script: Option<PathBuf>,
    /// RON state file, overriding the config.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Log at debug level.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    info!("Start: murmur {MURMUR_VERSION}");

    let mut config = match find_config(cli.config.as_deref()) {
        Some(path) => load_config(&path),
        None => {
            warn!("no murmur.toml found, using defaults");
            EngineConfig::default()
        },
    };
    if let Some(script) = cli.script {
        config.script = script;
    }
    if let Some(store) = cli.store {
        config.store = Some(store);
    }

    let store: Arc<dyn StateStore> = match &config.store {
        Some(path) => Arc::new(FileStore::open(path).context("while opening the state store")?),
        None => {
            info!("conversation state is kept in memory");
            Arc::new(MemoryStore::new())
        },
    };

    // A story that fails to load disables playback but keeps the transport up.
    let narrator = match load_story(&config.script, config.story_settings()) {
        Ok(story) => {
            info!(
                "narrating '{}' ({} sections) from '{}'",
                config.script.display(),
                story.section_count(),
                story.start_section()
            );
            Some(Narrator::new(Arc::new(story), store, config.turn_settings()))
        },
        Err(e) => {
            error!("story unavailable: {e:#}");
            None
        },
    };

    println!(
        "{}",
        "murmur: type `<conversation> [answer]`, `<conversation> start` to restart"
            .bright_yellow()
            .bold()
    );

    let mut printers = JoinSet::new();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await.context("reading stdin")? {
        let mut words = line.split_whitespace();
        let Some(conversation) = words.next() else {
            continue;
        };
        let answer = words.next();

        let Some(narrator) = &narrator else {
            warn!("[{conversation}] ignored, no story loaded");
            continue;
        };
        let handle = narrator.spawn_turn(conversation, answer);
        printers.spawn(print_turn(conversation.to_string(), handle));
    }

    while let Some(joined) = printers.join_next().await {
        if let Err(e) = joined {
            error!("printer task failed: {e}");
        }
    }
    info!("stdin closed, exiting");
    Ok(())
}

/// Print a turn's lines as they arrive, then its outcome.
async fn print_turn(conversation: String, handle: TurnHandle) {
    let TurnHandle { mut lines, task } = handle;
    let prefix = format!("[{conversation}]").bright_blue().bold();
    let width = textwrap::termwidth().saturating_sub(conversation.len() + 3).max(20);

    while let Some(line) = lines.recv().await {
        if line == CHOICE_SEPARATOR {
            println!("{prefix} {}", line.dimmed());
        } else if is_option(&line) {
            println!("{prefix} {}", line.bright_yellow());
        } else {
            for wrapped in textwrap::wrap(&line, width) {
                println!("{prefix} {}", wrapped.italic());
            }
        }
    }

    match task.await {
        Ok(TurnOutcome::Completed { .. }) => {},
        Ok(TurnOutcome::Dropped) => println!("{prefix} {}", "(still talking, message dropped)".dimmed()),
        Ok(TurnOutcome::Failed(err)) => println!("{prefix} {}", format!("(turn failed: {err})").red()),
        Err(e) => error!("[{conversation}] turn task failed: {e}"),
    }
}

/// `N. label` lines emitted by a choice.
fn is_option(line: &str) -> bool {
    line.split_once(". ")
        .is_some_and(|(num, _)| !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()))
}
