//! Turn orchestration: one incoming message in, one stream of lines out.
//!
//! For each turn the [`Narrator`] takes the conversation's session lock,
//! works out where the conversation stands, plays or replies, persists the
//! new section pointer and closes the output stream. A turn that finds its
//! conversation busy is dropped without output.

use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::context::{OutputSink, TurnContext};
use crate::error::TurnError;
use crate::lock::SessionLocks;
use crate::store::{StateKey, StateStore};
use crate::story::Story;

#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// An answer equal to this restarts the conversation from the start section.
    pub restart_keyword: String,
    /// Lines buffered between a turn and its consumer.
    pub output_capacity: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            restart_keyword: "start".to_string(),
            output_capacity: 16,
        }
    }
}

#[derive(Debug)]
pub enum TurnOutcome {
    /// The turn ran to a stop; `section` is where the conversation now rests.
    Completed { section: String },
    /// Another turn for the same conversation was still running.
    Dropped,
    /// The turn aborted. The section pointer was left as it was.
    Failed(TurnError),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }
}

/// A turn running on its own task.
#[derive(Debug)]
pub struct TurnHandle {
    /// Lines in play order. Yields `None` once the turn has finished.
    pub lines: mpsc::Receiver<String>,
    pub task: JoinHandle<TurnOutcome>,
}

impl TurnHandle {
    /// Drain every line, then wait for the outcome.
    ///
    /// # Errors
    /// Returns the join error if the turn's task panicked or was aborted.
    pub async fn collect(mut self) -> Result<(Vec<String>, TurnOutcome), JoinError> {
        let mut lines = Vec::new();
        while let Some(line) = self.lines.recv().await {
            lines.push(line);
        }
        let outcome = self.task.await?;
        Ok((lines, outcome))
    }
}

/// Runs turns against one loaded story.
///
/// Cheap to clone; clones share the story, the store and the session locks.
#[derive(Clone)]
pub struct Narrator {
    story: Arc<Story>,
    store: Arc<dyn StateStore>,
    locks: Arc<SessionLocks>,
    settings: TurnSettings,
}

impl Narrator {
    pub fn new(story: Arc<Story>, store: Arc<dyn StateStore>, settings: TurnSettings) -> Self {
        Self {
            story,
            store,
            locks: Arc::new(SessionLocks::new()),
            settings,
        }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Start a turn on a new tokio task and hand back its output stream.
    pub fn spawn_turn(&self, conversation: &str, answer: Option<&str>) -> TurnHandle {
        let (sink, lines) = OutputSink::channel(self.settings.output_capacity);
        let narrator = self.clone();
        let conversation = conversation.to_string();
        let answer = answer.map(str::to_string);
        let task = tokio::spawn(async move { narrator.run_turn(&conversation, answer.as_deref(), sink).await });
        TurnHandle { lines, task }
    }

    /// Run one turn to completion, writing its lines to `sink`.
    ///
    /// The sink is consumed and dropped after the session lock is released,
    /// so a consumer that sees the stream end can start the next turn right
    /// away.
    pub async fn run_turn(&self, conversation: &str, answer: Option<&str>, sink: OutputSink) -> TurnOutcome {
        let Some(guard) = self.locks.try_lock(conversation) else {
            info!("[{conversation}] turn dropped, another turn is still playing");
            return TurnOutcome::Dropped;
        };
        debug!("[{}] session locked for this turn", guard.id());

        let outcome = match self.play_turn(conversation, answer, &sink).await {
            Ok(section) => {
                debug!("[{conversation}] turn finished in '{section}'");
                TurnOutcome::Completed { section }
            },
            Err(err) => {
                error!("[{conversation}] turn failed: {err}");
                TurnOutcome::Failed(err)
            },
        };

        drop(guard);
        drop(sink);
        outcome
    }

    async fn play_turn(&self, conversation: &str, answer: Option<&str>, sink: &OutputSink) -> Result<String, TurnError> {
        let store = self.store.as_ref();
        let key = StateKey::section(conversation);
        let start = self.story.start_section();

        let mut answer = answer.map(str::trim).filter(|a| !a.is_empty());
        let section = if answer == Some(self.settings.restart_keyword.as_str()) {
            info!("[{conversation}] restarting from '{start}'");
            answer = None;
            store.set(&key, start)?;
            start.to_string()
        } else {
            match store.get(&key)? {
                Some(section) if !section.is_empty() => section,
                _ => {
                    info!("[{conversation}] new conversation, starting at '{start}'");
                    store.set(&key, start)?;
                    start.to_string()
                },
            }
        };

        let mut ctx = TurnContext::new(conversation, &section, sink, store);
        ctx.answer = answer.map(str::to_string);
        if ctx.answer.is_some() {
            self.story.reply(&mut ctx).await?;
        } else {
            self.story.play(&mut ctx).await?;
        }

        store.set(&key, &ctx.section)?;
        Ok(ctx.section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::story::StorySettings;
    use std::time::Duration;

    const SRC: &str = "\
:: Start
Hello.
<<choice>> [[Stay]] | [[Go]] >>
:: Stay
You stay.
:: Go
You go.
";

    fn narrator(settings: StorySettings) -> Narrator {
        let story = Story::load(SRC, settings).unwrap();
        Narrator::new(Arc::new(story), Arc::new(MemoryStore::new()), TurnSettings::default())
    }

    fn quick() -> StorySettings {
        StorySettings {
            text_pause: Duration::ZERO,
            jump_pause: Duration::ZERO,
            ..StorySettings::default()
        }
    }

    fn section_of(narrator: &Narrator, conversation: &str) -> Option<String> {
        narrator.store().get(&StateKey::section(conversation)).unwrap()
    }

    #[tokio::test]
    async fn first_turn_starts_at_start_and_persists() {
        let narrator = narrator(quick());
        let (lines, outcome) = narrator.spawn_turn("c1", None).collect().await.unwrap();

        assert_eq!(lines[0], "Hello.");
        assert!(matches!(outcome, TurnOutcome::Completed { section } if section == "Start"));
        assert_eq!(section_of(&narrator, "c1").as_deref(), Some("Start"));
        assert!(!narrator.locks().is_locked("c1"));
    }

    #[tokio::test]
    async fn answer_moves_conversation_forward() {
        let narrator = narrator(quick());
        narrator.spawn_turn("c1", None).collect().await.unwrap();
        let (lines, outcome) = narrator.spawn_turn("c1", Some(" 2 ")).collect().await.unwrap();

        assert_eq!(lines, ["You go."]);
        assert!(outcome.is_completed());
        assert_eq!(section_of(&narrator, "c1").as_deref(), Some("Go"));
    }

    #[tokio::test]
    async fn restart_keyword_resets_to_start() {
        let narrator = narrator(quick());
        narrator
            .store()
            .set(&StateKey::section("c1"), "Go")
            .unwrap();

        let (lines, _) = narrator.spawn_turn("c1", Some("start")).collect().await.unwrap();
        assert_eq!(lines[0], "Hello.");
        assert_eq!(section_of(&narrator, "c1").as_deref(), Some("Start"));
    }

    #[tokio::test]
    async fn failed_turn_keeps_previous_section() {
        let narrator = narrator(quick());
        narrator.spawn_turn("c1", None).collect().await.unwrap();

        let (lines, outcome) = narrator.spawn_turn("c1", Some("7")).collect().await.unwrap();
        assert!(lines.is_empty());
        assert!(matches!(outcome, TurnOutcome::Failed(TurnError::InvalidAnswer { answer: 7, .. })));
        assert_eq!(section_of(&narrator, "c1").as_deref(), Some("Start"));
        assert!(!narrator.locks().is_locked("c1"));
    }

    #[tokio::test]
    async fn stale_section_pointer_fails_the_turn() {
        let narrator = narrator(quick());
        narrator
            .store()
            .set(&StateKey::section("c1"), "Removed")
            .unwrap();

        let (_, outcome) = narrator.spawn_turn("c1", None).collect().await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Failed(TurnError::InvalidSection(_))));
        assert_eq!(section_of(&narrator, "c1").as_deref(), Some("Removed"));
    }

    #[tokio::test]
    async fn busy_conversation_drops_the_turn() {
        let narrator = narrator(quick());
        let _held = narrator.locks().try_lock("c1").unwrap();

        let (lines, outcome) = narrator.spawn_turn("c1", None).collect().await.unwrap();
        assert!(lines.is_empty());
        assert!(matches!(outcome, TurnOutcome::Dropped));
        assert_eq!(section_of(&narrator, "c1"), None);
    }

    #[tokio::test]
    async fn closed_consumer_fails_the_turn() {
        let narrator = narrator(quick());
        let (sink, rx) = OutputSink::channel(1);
        drop(rx);

        let outcome = narrator.run_turn("c1", None, sink).await;
        assert!(matches!(outcome, TurnOutcome::Failed(TurnError::SinkClosed)));
        assert!(!narrator.locks().is_locked("c1"));
    }
}
