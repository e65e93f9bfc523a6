//! Story loading and playback.
//!
//! A [`Story`] is parsed once and then shared read-only by every turn. Playback
//! has two halves:
//!
//! * [`Story::resolve`] decides which node applies given an answer and the
//!   conversation's variables. It never writes state or produces output.
//! * `play_*` performs effects: emitting lines, pausing, moving the section
//!   pointer and writing variables.
//!
//! [`Story::reply`] needs the split: the choice left dangling at the end of the
//! previous turn is resolved with the new answer before anything plays.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::slice;
use std::time::Duration;

use anyhow::Context;
use log::{debug, info, warn};
use murmur_script::{Branch, Choice, IfChain, Jump, Node, Script, Section, SetVar};
use murmur_script::{count_section_markers, parse_script, validate_script};
use tokio::time::sleep;

use crate::context::TurnContext;
use crate::error::{StoryError, TurnError};
use crate::eval::{calculate, check_guard};

/// Line emitted before the numbered options of a choice.
pub const CHOICE_SEPARATOR: &str = "--------------";

#[derive(Debug, Clone)]
pub struct StorySettings {
    /// Section new conversations begin in.
    pub start_section: String,
    /// Pause after every text line.
    pub text_pause: Duration,
    /// Pause before a delayed jump. Applied as-is whatever delay the jump names.
    pub jump_pause: Duration,
    /// Section changes allowed in one turn before it is abandoned.
    pub max_transitions: usize,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            start_section: "Start".to_string(),
            text_pause: Duration::from_secs(3),
            jump_pause: Duration::from_secs(10),
            max_transitions: 100,
        }
    }
}

/// What a node resolves to for the current answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'n> {
    /// Play this node as written.
    Node(&'n Node),
    /// The choice option picked by the answer.
    Answer(&'n Jump),
    /// A matching branch with an empty body.
    Nothing,
}

#[derive(Debug)]
pub struct Story {
    script: Script,
    /// section name -> index into `script.nodes`
    sections: HashMap<String, usize>,
    settings: StorySettings,
}

impl Story {
    /// Parse and index a story.
    ///
    /// # Errors
    /// Fails on any parse error, when a section marker did not produce its
    /// own indexed section, or when the start section is missing.
    pub fn load(text: &str, settings: StorySettings) -> Result<Self, StoryError> {
        let script = parse_script(text)?;

        let mut sections = HashMap::new();
        for (idx, node) in script.nodes.iter().enumerate() {
            if let Node::Section(section) = node {
                sections.insert(section.name.clone(), idx);
            }
        }

        let markers = count_section_markers(text);
        if sections.len() != markers {
            return Err(StoryError::SectionCountMismatch {
                indexed: sections.len(),
                markers,
            });
        }
        if !sections.contains_key(&settings.start_section) {
            return Err(StoryError::MissingStart(settings.start_section.clone()));
        }

        for issue in validate_script(&script) {
            warn!("story: {issue}");
        }
        info!("story loaded: {} sections, start at '{}'", sections.len(), settings.start_section);

        Ok(Self {
            script,
            sections,
            settings,
        })
    }

    pub fn start_section(&self) -> &str {
        &self.settings.start_section
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        match self.script.nodes.get(*self.sections.get(name)?) {
            Some(Node::Section(section)) => Some(section),
            _ => None,
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Play from the context's section until the story stops moving.
    ///
    /// Each section plays in full; if that moved the section pointer, the new
    /// section plays next. The turn ends once a section finishes without
    /// jumping.
    ///
    /// # Errors
    /// Unknown sections, failed `set` commands, store and sink failures, and
    /// more than `max_transitions` jumps in one call.
    pub async fn play(&self, ctx: &mut TurnContext<'_>) -> Result<(), TurnError> {
        let mut transitions = 0;
        loop {
            let section = self
                .section(&ctx.section)
                .ok_or_else(|| TurnError::InvalidSection(ctx.section.clone()))?;
            debug!("[{}] playing section '{}'", ctx.conversation, section.name);

            self.play_nodes(&section.body, ctx).await?;
            if ctx.section == section.name {
                return Ok(());
            }

            transitions += 1;
            if transitions > self.settings.max_transitions {
                return Err(TurnError::RunawayJumps {
                    limit: self.settings.max_transitions,
                    section: ctx.section.clone(),
                });
            }
        }
    }

    /// Answer the choice the current section stopped on, then keep playing.
    ///
    /// A non-numeric answer is ignored and the turn ends quietly.
    ///
    /// # Errors
    /// As [`Story::play`], plus an empty section or an answer that matches
    /// nothing. Those two fail before any state is touched.
    pub async fn reply(&self, ctx: &mut TurnContext<'_>) -> Result<(), TurnError> {
        let section = self
            .section(&ctx.section)
            .ok_or_else(|| TurnError::InvalidSection(ctx.section.clone()))?;

        let Some(answer) = ctx.answer.as_deref().and_then(|a| a.parse::<i64>().ok()) else {
            debug!("[{}] ignoring non-numeric answer {:?}", ctx.conversation, ctx.answer);
            return Ok(());
        };

        let last = section
            .body
            .last()
            .ok_or_else(|| TurnError::EmptySection(section.name.clone()))?;
        let resolved = self
            .resolve(last, Some(answer), ctx)
            .ok_or_else(|| TurnError::InvalidAnswer {
                answer,
                section: section.name.clone(),
            })?;

        ctx.answer = None;
        match resolved {
            Resolved::Node(node) => self.play_nodes(slice::from_ref(node), ctx).await?,
            Resolved::Answer(jump) => self.play_jump(jump, ctx).await,
            Resolved::Nothing => {},
        }

        if ctx.section == section.name {
            Ok(())
        } else {
            self.play(ctx).await
        }
    }

    /// Decide which node applies to `answer` without side effects.
    ///
    /// Choices pick their numbered option; if-chains pick the first branch
    /// whose guard holds and resolve that branch's last node. Everything else
    /// resolves to itself. `None` means nothing matches.
    pub fn resolve<'n>(&self, node: &'n Node, answer: Option<i64>, ctx: &TurnContext<'_>) -> Option<Resolved<'n>> {
        match node {
            Node::Choice(choice) => match answer {
                Some(answer) => choice.option(answer).map(Resolved::Answer),
                None => Some(Resolved::Node(node)),
            },
            Node::If(chain) => {
                let branch = self.select_branch(chain, ctx)?;
                match branch.body.last() {
                    Some(last) => self.resolve(last, answer, ctx),
                    None => Some(Resolved::Nothing),
                }
            },
            _ => Some(Resolved::Node(node)),
        }
    }

    /// First branch whose guard holds. Guards that fail to evaluate are
    /// logged and skipped.
    fn select_branch<'n>(&self, chain: &'n IfChain, ctx: &TurnContext<'_>) -> Option<&'n Branch> {
        chain.branches.iter().find(|branch| {
            let Some(guard) = &branch.guard else {
                return true;
            };
            match check_guard(guard, |name| ctx.var(name)) {
                Ok(matched) => matched,
                Err(err) => {
                    warn!("[{}] condition '{guard}' failed: {err}", ctx.conversation);
                    false
                },
            }
        })
    }

    /// Play a run of sibling nodes in document order.
    ///
    /// Containers are expanded in place on an explicit stack, so a section or
    /// a selected if-branch plays its body before the next sibling.
    async fn play_nodes(&self, nodes: &[Node], ctx: &mut TurnContext<'_>) -> Result<(), TurnError> {
        let mut stack: Vec<slice::Iter<'_, Node>> = vec![nodes.iter()];
        while let Some(iter) = stack.last_mut() {
            let Some(node) = iter.next() else {
                stack.pop();
                continue;
            };
            match node {
                Node::Section(section) => stack.push(section.body.iter()),
                Node::If(chain) => {
                    if let Some(branch) = self.select_branch(chain, ctx) {
                        stack.push(branch.body.iter());
                    }
                },
                Node::Text(line) => self.play_text(line, ctx).await?,
                Node::Comment(_) => {},
                Node::Jump(jump) => self.play_jump(jump, ctx).await,
                Node::Set(set) => Self::play_set(set, ctx)?,
                Node::Choice(choice) => Self::play_choice(choice, ctx).await?,
                Node::Unhandled(cmd) => {
                    warn!("[{}] unhandled command in '{}': {cmd}", ctx.conversation, ctx.section);
                },
            }
        }
        Ok(())
    }

    async fn play_text(&self, line: &str, ctx: &TurnContext<'_>) -> Result<(), TurnError> {
        ctx.emit(line).await?;
        pause(self.settings.text_pause).await;
        Ok(())
    }

    async fn play_jump(&self, jump: &Jump, ctx: &mut TurnContext<'_>) {
        if let Some(delay) = jump.delay {
            debug!(
                "[{}] delayed jump to '{}' (written as {:?})",
                ctx.conversation, jump.target, delay
            );
            pause(self.settings.jump_pause).await;
        }
        ctx.section.clone_from(&jump.target);
    }

    fn play_set(set: &SetVar, ctx: &TurnContext<'_>) -> Result<(), TurnError> {
        let value = calculate(&set.value, |name| ctx.var(name)).map_err(|source| TurnError::Set {
            key: set.key.clone(),
            source,
        })?;
        debug!("[{}] set ${} = {value:?}", ctx.conversation, set.key);
        ctx.set_var(&set.key, &value)?;
        Ok(())
    }

    async fn play_choice(choice: &Choice, ctx: &TurnContext<'_>) -> Result<(), TurnError> {
        ctx.emit(CHOICE_SEPARATOR).await?;
        for (idx, option) in choice.options.iter().enumerate() {
            ctx.emit(format!("{}. {}", idx + 1, option.display_label())).await?;
        }
        Ok(())
    }
}

/// Read and load the story script at `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or the story fails to load.
pub fn load_story(path: &Path, settings: StorySettings) -> anyhow::Result<Story> {
    let text = fs::read_to_string(path).with_context(|| format!("reading story script '{}'", path.display()))?;
    let story = Story::load(&text, settings).with_context(|| format!("loading story '{}'", path.display()))?;
    info!("story script '{}' ready", path.display());
    Ok(story)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
