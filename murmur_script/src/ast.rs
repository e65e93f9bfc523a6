//! Syntax tree for murmur scripts.
//!
//! A script is a flat run of `::` sections, each owning the nodes that make up
//! its body. The tree is produced once by [`crate::parse_script`] and is only
//! ever read afterwards, so every type here is plain owned data.

use std::fmt;
use std::time::Duration;

/// Root of a parsed script.
///
/// Holds the top-level sequence of nodes: normally only [`Node::Section`]s,
/// plus any stray content that appears before the first section marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub nodes: Vec<Node>,
}

impl Script {
    /// Iterate over the top-level sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Section(section) => Some(section),
            _ => None,
        })
    }
}

/// A single element of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Section(Section),
    /// A narrative line shown to the reader.
    Text(String),
    /// An authoring comment; never played.
    Comment(String),
    Jump(Jump),
    Set(SetVar),
    Choice(Choice),
    If(IfChain),
    /// Any `<<...>>` command the engine does not know. Kept for diagnostics.
    Unhandled(String),
}

impl Node {
    /// Short name of the node kind, used in log lines and lint output.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Section(_) => "section",
            Node::Text(_) => "text",
            Node::Comment(_) => "comment",
            Node::Jump(_) => "jump",
            Node::Set(_) => "set",
            Node::Choice(_) => "choice",
            Node::If(_) => "if",
            Node::Unhandled(_) => "unhandled command",
        }
    }
}

/// A named, addressable block of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub body: Vec<Node>,
}

/// Transfer to another section, optionally after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jump {
    pub target: String,
    /// Display text from the `[[label|target]]` form.
    pub label: Option<String>,
    pub delay: Option<Duration>,
}

impl Jump {
    /// Immediate jump with no label.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: None,
            delay: None,
        }
    }

    /// Text shown for this jump when it is offered as a choice option.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.target)
    }
}

/// `<<set $key = a op b ...>>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetVar {
    /// Variable name without the `$` sigil.
    pub key: String,
    /// Alternating operand / operator tokens; always odd in length.
    pub value: Vec<String>,
}

/// A menu of jumps; the 1-based position of an option is its answer number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choice {
    pub options: Vec<Jump>,
}

impl Choice {
    /// Look up an option by its 1-based answer number.
    pub fn option(&self, answer: i64) -> Option<&Jump> {
        let idx = usize::try_from(answer.checked_sub(1)?).ok()?;
        self.options.get(idx)
    }
}

/// An `<<if>> / <<elseif>>* / <<else>>? / <<endif>>` chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfChain {
    pub branches: Vec<Branch>,
}

/// One guarded arm of an [`IfChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// `None` for an `<<else>>` arm, which always matches.
    pub guard: Option<Guard>,
    pub body: Vec<Node>,
}

/// `<left> <op> <right...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub left: String,
    pub op: CompareOp,
    pub right: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Is,
    Eq,
    Gte,
}

impl CompareOp {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "is" => Some(Self::Is),
            "eq" => Some(Self::Eq),
            "gte" => Some(Self::Gte),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Is => "is",
            Self::Eq => "eq",
            Self::Gte => "gte",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right.join(" "))
    }
}
