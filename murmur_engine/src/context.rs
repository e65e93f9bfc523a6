//! Per-turn context threaded through story playback.

use tokio::sync::mpsc;

use crate::error::TurnError;
use crate::store::{StateKey, StateStore, StoreError};

/// Ordered stream of lines produced by a turn.
///
/// Backed by a bounded channel, so a slow consumer holds the turn back rather
/// than letting output pile up. Dropping the sink ends the stream.
#[derive(Debug)]
pub struct OutputSink {
    tx: mpsc::Sender<String>,
}

impl OutputSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Deliver one line, waiting for room in the channel.
    ///
    /// # Errors
    /// [`TurnError::SinkClosed`] once the receiving side has gone away.
    pub async fn send(&self, line: impl Into<String>) -> Result<(), TurnError> {
        self.tx.send(line.into()).await.map_err(|_| TurnError::SinkClosed)
    }
}

/// Everything playback needs for one conversation turn.
pub struct TurnContext<'a> {
    pub conversation: String,
    /// Section the story is currently positioned at.
    pub section: String,
    /// The user's reply, if this turn is answering a choice.
    pub answer: Option<String>,
    pub sink: &'a OutputSink,
    pub store: &'a dyn StateStore,
}

impl<'a> TurnContext<'a> {
    pub fn new(conversation: &str, section: &str, sink: &'a OutputSink, store: &'a dyn StateStore) -> Self {
        Self {
            conversation: conversation.to_string(),
            section: section.to_string(),
            answer: None,
            sink,
            store,
        }
    }

    /// Read a conversation variable; unset reads as the empty string.
    pub fn var(&self, name: &str) -> Result<String, StoreError> {
        let value = self.store.get(&StateKey::var(&self.conversation, name))?;
        Ok(value.unwrap_or_default())
    }

    pub fn set_var(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.store.set(&StateKey::var(&self.conversation, name), value)
    }

    pub async fn emit(&self, line: impl Into<String>) -> Result<(), TurnError> {
        self.sink.send(line).await
    }
}
