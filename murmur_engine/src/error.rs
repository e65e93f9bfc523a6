//! Error types for loading and playing stories.

use murmur_script::ParseError;

use crate::eval::EvalError;
use crate::store::StoreError;

/// Failures that prevent a story from loading at all.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("story parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("parsed section count mismatch, got {indexed}, total: {markers}")]
    SectionCountMismatch { indexed: usize, markers: usize },
    #[error("start section '{0}' is not defined")]
    MissingStart(String),
}

/// Failures that abort a single turn.
///
/// The orchestrator does not advance the section pointer when a turn fails,
/// so the conversation resumes from its last good position next time.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("invalid section {0}")]
    InvalidSection(String),
    #[error("section {0} has no child")]
    EmptySection(String),
    #[error("invalid answer id={answer} in section {section}")]
    InvalidAnswer { answer: i64, section: String },
    #[error("gave up after {limit} section jumps in one turn (stopped at '{section}')")]
    RunawayJumps { limit: usize, section: String },
    #[error("set ${key} failed: {source}")]
    Set {
        key: String,
        #[source]
        source: EvalError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("output stream was closed by the consumer")]
    SinkClosed,
}
